use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::{LeadStatus, QueueItem};

/// When the next touch on a lead should happen, relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextTouch {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "tomorrow")]
    Tomorrow,
    #[serde(rename = "3_days")]
    ThreeDays,
    #[serde(rename = "next_week")]
    NextWeek,
}

impl NextTouch {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "none" | "" => Some(Self::None),
            "tomorrow" => Some(Self::Tomorrow),
            "3_days" | "3days" | "three_days" => Some(Self::ThreeDays),
            "next_week" | "nextweek" => Some(Self::NextWeek),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tomorrow => "tomorrow",
            Self::ThreeDays => "3_days",
            Self::NextWeek => "next_week",
        }
    }
}

impl fmt::Display for NextTouch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical result the operator picks after contacting a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    MeetingSet,
    Converted,
    NoAnswer,
    NotInterested,
    Touched,
}

impl Outcome {
    /// Exact codes only; anything unrecognised is a plain touch.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "meeting_set" => Self::MeetingSet,
            "converted" => Self::Converted,
            "no_answer" => Self::NoAnswer,
            "not_interested" => Self::NotInterested,
            _ => Self::Touched,
        }
    }
}

/// The status change and follow-up directive sent to the server on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub new_status: LeadStatus,
    pub next_touch: NextTouch,
}

/// How the operator resolved an item: pick an outcome, or dictate the plan directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Outcome(Outcome),
    Explicit(Plan),
}

impl Resolution {
    pub fn plan_for(&self, item: &QueueItem) -> Plan {
        match self {
            Resolution::Outcome(outcome) => OutcomePlanner::plan(item, *outcome),
            Resolution::Explicit(plan) => *plan,
        }
    }
}

/// Closed outcome → plan table. There is no general status graph: a plain
/// touch warms early-stage leads and never moves a lead backwards.
pub struct OutcomePlanner;

impl OutcomePlanner {
    pub fn plan(item: &QueueItem, outcome: Outcome) -> Plan {
        let (new_status, next_touch) = match outcome {
            Outcome::MeetingSet => (LeadStatus::Hot, NextTouch::NextWeek),
            Outcome::Converted => (LeadStatus::Converted, NextTouch::None),
            Outcome::NoAnswer => (LeadStatus::FollowUp, NextTouch::Tomorrow),
            Outcome::NotInterested => (LeadStatus::NoFit, NextTouch::None),
            Outcome::Touched => (Self::warm_up(item.status), NextTouch::ThreeDays),
        };
        Plan {
            new_status,
            next_touch,
        }
    }

    fn warm_up(current: LeadStatus) -> LeadStatus {
        match current {
            LeadStatus::Unspecified | LeadStatus::Cold | LeadStatus::Research => LeadStatus::Warm,
            other => other,
        }
    }
}
