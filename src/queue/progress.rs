//! Completion counts and daily goal metrics.
//!
//! Everything here is recomputed from the store on demand; nothing is
//! maintained incrementally.

use serde::{Deserialize, Serialize};

use super::item::{ActivityType, QueueItem};

/// Whether an item counts as finished for progress purposes.
///
/// An explicit done flag wins; otherwise completed or skipped items count;
/// otherwise a terminal status does.
pub fn is_done(item: &QueueItem) -> bool {
    if let Some(done) = item.is_done {
        return done;
    }
    if item.is_completed || item.is_skipped {
        return true;
    }
    item.status.is_terminal() || item.legacy_terminal
}

/// Batch (or block) completion summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub total: usize,
    pub done: usize,
    pub remaining: usize,
    pub percent: u32,
}

impl Progress {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a QueueItem>) -> Self {
        let (total, done) = items.into_iter().fold((0usize, 0usize), |(total, done), item| {
            (total + 1, done + usize::from(is_done(item)))
        });
        Self {
            total,
            done,
            remaining: total.saturating_sub(done),
            percent: percent_of(done, total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Every item is done and there was at least one.
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.remaining == 0
    }
}

fn percent_of(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

/// Fixed daily targets per activity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGoals {
    #[serde(default = "default_call_goal")]
    pub call: u32,
    #[serde(default = "default_email_goal")]
    pub email: u32,
    #[serde(default = "default_social_goal")]
    pub social: u32,
}

fn default_call_goal() -> u32 {
    40
}

fn default_email_goal() -> u32 {
    25
}

fn default_social_goal() -> u32 {
    15
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            call: default_call_goal(),
            email: default_email_goal(),
            social: default_social_goal(),
        }
    }
}

impl DailyGoals {
    pub fn target(&self, activity: ActivityType) -> u32 {
        match activity {
            ActivityType::Call => self.call,
            ActivityType::Email => self.email,
            ActivityType::Social => self.social,
        }
    }
}

/// Progress toward one activity type's daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalMetric {
    pub activity: ActivityType,
    pub count: u32,
    pub target: u32,
    /// Clamped to 0..=100.
    pub percent: u32,
}

/// Counts completed, non-skipped items per activity type. Skips never count.
pub fn goal_metrics(items: &[QueueItem], goals: &DailyGoals) -> Vec<GoalMetric> {
    ActivityType::ALL
        .iter()
        .map(|&activity| {
            let count = items
                .iter()
                .filter(|i| i.is_completed && !i.is_skipped && i.activity_type == Some(activity))
                .count() as u32;
            let target = goals.target(activity);
            GoalMetric {
                activity,
                count,
                target,
                percent: percent_of(count as usize, target as usize).min(100),
            }
        })
        .collect()
}
