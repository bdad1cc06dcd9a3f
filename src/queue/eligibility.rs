use std::fmt;

use super::item::QueueItem;

/// Which roles a work block is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleScope {
    #[default]
    Any,
    Unassigned,
    Role(String),
}

impl RoleScope {
    /// `""` and `any` mean every role, `unassigned` means blank roles only,
    /// anything else is taken as a literal role value.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "any" => Self::Any,
            "unassigned" => Self::Unassigned,
            _ => Self::Role(trimmed.to_string()),
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleScope::Any => write!(f, "any"),
            RoleScope::Unassigned => write!(f, "unassigned"),
            RoleScope::Role(role) => write!(f, "{role}"),
        }
    }
}

/// How a consuming surface treats items the operator skipped.
///
/// The block start offers skipped items again; the live cursor and the
/// pending list pass over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    Include,
    Exclude,
}

impl SkipPolicy {
    /// Whether an item is still open work under this policy.
    pub fn is_open(self, item: &QueueItem) -> bool {
        !item.is_completed && (self == SkipPolicy::Include || !item.is_skipped)
    }
}

/// Role-based membership predicate for a work block.
///
/// Unassigned items are offered into every role-filtered block so they get
/// worked and assigned.
pub fn is_eligible(item: &QueueItem, scope: &RoleScope) -> bool {
    is_eligible_with(item, scope, SkipPolicy::Include)
}

pub fn is_eligible_with(item: &QueueItem, scope: &RoleScope, skips: SkipPolicy) -> bool {
    if !skips.is_open(item) {
        return false;
    }
    match scope {
        RoleScope::Any => true,
        RoleScope::Unassigned => item.is_unassigned(),
        RoleScope::Role(role) => item.is_unassigned() || item.role == *role,
    }
}
