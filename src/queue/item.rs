//! Queue items and the canonical ingestion step.
//!
//! Servers have shipped several shapes of the same record over time
//! (`company` vs `company_name`, numeric vs string ids, ...). [`RawQueueItem`]
//! keeps the record as received and [`QueueItem::from_raw`] turns it into the
//! single typed shape the rest of the crate works with.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a queue item, unique within a loaded batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pipeline stage of a lead. Closed set; every label is normalised into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
    #[serde(rename = "cold")]
    Cold,
    #[serde(rename = "warm")]
    Warm,
    #[serde(rename = "hot")]
    Hot,
    #[serde(rename = "research")]
    Research,
    #[serde(rename = "follow-up")]
    FollowUp,
    #[serde(rename = "converted")]
    Converted,
    #[serde(rename = "no_fit")]
    NoFit,
}

/// Labels that older batches use to mark an item as finished without a matching status.
const LEGACY_TERMINAL_LABELS: &[&str] = &["retired", "done", "completed"];

impl LeadStatus {
    /// Normalises a free-form label: trim, lowercase, `followup` → `follow-up`,
    /// `no fit` → `no_fit`, empty → `unspecified`. Returns `None` for labels
    /// outside the closed set.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        let status = match normalized.as_str() {
            "" | "unspecified" => Self::Unspecified,
            "cold" => Self::Cold,
            "warm" => Self::Warm,
            "hot" => Self::Hot,
            "research" => Self::Research,
            "follow-up" | "followup" => Self::FollowUp,
            "converted" => Self::Converted,
            "no_fit" | "no fit" => Self::NoFit,
            _ => return None,
        };
        Some(status)
    }

    /// Like [`parse`](Self::parse) but folds unknown labels into `Unspecified`.
    pub fn normalize(label: &str) -> Self {
        Self::parse(label).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Cold => "cold",
            Self::Warm => "warm",
            Self::Hot => "hot",
            Self::Research => "research",
            Self::FollowUp => "follow-up",
            Self::Converted => "converted",
            Self::NoFit => "no_fit",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converted | Self::NoFit)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel used to contact a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Social,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [Self::Call, Self::Email, Self::Social];

    /// Blank or unknown input yields `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "call" => Some(Self::Call),
            "email" => Some(Self::Email),
            "social" => Some(Self::Social),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Social => "social",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lead-contact record as the rest of the crate sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub item_id: ItemId,
    pub lead_id: Option<String>,
    pub company: String,
    pub name: String,
    /// Empty means unassigned.
    pub role: String,
    pub status: LeadStatus,
    pub is_completed: bool,
    pub is_skipped: bool,
    /// Explicit done flag when the server sends one; wins over everything else.
    pub is_done: Option<bool>,
    /// The raw status label was one of the legacy terminal labels.
    pub legacy_terminal: bool,
    pub activity_type: Option<ActivityType>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub forecast_month: Option<String>,
    pub arr: Option<f64>,
    pub ap_spend: Option<f64>,
    pub next_touch_at: Option<String>,
    pub last_touch_at: Option<String>,
}

impl QueueItem {
    /// Builds an item with only the fields the queue logic cares about.
    pub fn new(item_id: impl Into<String>, role: &str, status: LeadStatus) -> Self {
        Self {
            item_id: ItemId::new(item_id),
            lead_id: None,
            company: String::new(),
            name: String::new(),
            role: role.trim().to_string(),
            status,
            is_completed: false,
            is_skipped: false,
            is_done: None,
            legacy_terminal: false,
            activity_type: None,
            location: None,
            industry: None,
            forecast_month: None,
            arr: None,
            ap_spend: None,
            next_touch_at: None,
            last_touch_at: None,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.role.trim().is_empty()
    }

    /// Canonical ingestion. Returns `None` when the record carries no usable id.
    pub fn from_raw(raw: RawQueueItem) -> Option<Self> {
        let fields = &raw.0;
        let item_id = pick_clean(fields, keys::ITEM_ID)?;
        let status_label = pick_text(fields, keys::STATUS).unwrap_or_default();
        let legacy_terminal =
            LEGACY_TERMINAL_LABELS.contains(&status_label.trim().to_lowercase().as_str());

        Some(Self {
            item_id: ItemId::new(item_id),
            lead_id: pick_clean(fields, keys::LEAD_ID),
            company: pick_clean(fields, keys::COMPANY).unwrap_or_default(),
            name: pick_clean(fields, keys::NAME).unwrap_or_default(),
            role: pick_clean(fields, keys::ROLE).unwrap_or_default(),
            status: LeadStatus::normalize(&status_label),
            is_completed: pick_flag(fields, keys::COMPLETED).unwrap_or(false),
            is_skipped: pick_flag(fields, keys::SKIPPED).unwrap_or(false),
            is_done: pick_flag(fields, keys::DONE),
            legacy_terminal,
            activity_type: pick_text(fields, keys::ACTIVITY)
                .as_deref()
                .and_then(ActivityType::parse),
            location: pick_clean(fields, keys::LOCATION),
            industry: pick_clean(fields, keys::INDUSTRY),
            forecast_month: pick_clean(fields, keys::FORECAST_MONTH),
            arr: pick_number(fields, keys::ARR),
            ap_spend: pick_number(fields, keys::AP_SPEND),
            next_touch_at: pick_clean(fields, keys::NEXT_TOUCH),
            last_touch_at: pick_clean(fields, keys::LAST_TOUCH),
        })
    }

    /// Human label: "Name @ Company", falling back to whichever is present.
    pub fn display_label(&self) -> String {
        match (self.name.is_empty(), self.company.is_empty()) {
            (false, false) => format!("{} @ {}", self.name, self.company),
            (false, true) => self.name.clone(),
            (true, false) => self.company.clone(),
            (true, true) => format!("item {}", self.item_id),
        }
    }
}

/// Accepted spellings per field, preferred first.
pub(crate) mod keys {
    pub const ITEM_ID: &[&str] = &["item_id", "id", "queue_item_id"];
    pub const LEAD_ID: &[&str] = &["lead_id", "leadId"];
    pub const COMPANY: &[&str] = &["company", "company_name", "account"];
    pub const NAME: &[&str] = &["name", "contact_name", "full_name"];
    pub const ROLE: &[&str] = &["role", "target_role", "contact_role"];
    pub const STATUS: &[&str] = &["status", "lead_status"];
    pub const COMPLETED: &[&str] = &["is_completed", "completed"];
    pub const SKIPPED: &[&str] = &["is_skipped", "skipped"];
    pub const DONE: &[&str] = &["is_done", "done"];
    pub const ACTIVITY: &[&str] = &["activity_type", "action_type"];
    pub const LOCATION: &[&str] = &["location", "city"];
    pub const INDUSTRY: &[&str] = &["industry"];
    pub const FORECAST_MONTH: &[&str] = &["forecast_month"];
    pub const ARR: &[&str] = &["arr"];
    pub const AP_SPEND: &[&str] = &["ap_spend"];
    pub const NEXT_TOUCH: &[&str] = &["next_touch_at", "next_touch", "next_touch_date"];
    pub const LAST_TOUCH: &[&str] = &["last_touch_at", "last_touch"];
}

/// Wire shape of a queue item: the JSON object exactly as received.
///
/// Joined rows often carry two spellings of the same column, so key variants
/// are resolved field by field in [`QueueItem::from_raw`] rather than by serde.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawQueueItem(pub Map<String, Value>);

/// First non-null value among `keys`, in order.
pub(crate) fn pick<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

/// Strings as sent; numbers in decimal form, since ids arrive as either.
pub(crate) fn pick_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match pick(fields, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Money columns arrive as numbers or as formatted strings ("1,200,000").
pub(crate) fn pick_number(fields: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match pick(fields, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace([',', '$'], "").parse().ok(),
        _ => None,
    }
}

fn pick_flag(fields: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    match pick(fields, keys)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// Trimmed text, with blanks treated as absent.
fn pick_clean(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    pick_text(fields, keys)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
