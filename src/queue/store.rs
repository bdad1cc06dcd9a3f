use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::warn;

use super::eligibility::{RoleScope, SkipPolicy, is_eligible_with};
use super::item::{ActivityType, ItemId, LeadStatus, QueueItem};
use crate::api::types::LeadUpdate;

/// The loaded batch. Sole owner of item mutation.
///
/// Items are flagged, never removed; the collection only shrinks when the
/// whole batch is replaced.
#[derive(Debug, Default)]
pub struct QueueStore {
    items: Vec<QueueItem>,
}

impl QueueStore {
    #[cfg(test)]
    pub fn new(items: Vec<QueueItem>) -> Self {
        let mut store = Self::default();
        store.extend(items);
        store
    }

    /// Replaces the whole batch.
    pub fn replace(&mut self, items: Vec<QueueItem>) {
        self.items.clear();
        self.extend(items);
    }

    /// Appends items whose ids are not loaded yet. Returns how many were added.
    pub fn extend(&mut self, items: Vec<QueueItem>) -> usize {
        let mut seen: HashSet<ItemId> = self.items.iter().map(|i| i.item_id.clone()).collect();
        let before = self.items.len();
        for item in items {
            if seen.insert(item.item_id.clone()) {
                self.items.push(item);
            } else {
                warn!(item_id = %item.item_id, "duplicate item id in batch, keeping first");
            }
        }
        self.items.len() - before
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&QueueItem> {
        self.items.iter().find(|i| &i.item_id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: &ItemId) -> Option<&mut QueueItem> {
        self.items.iter_mut().find(|i| &i.item_id == id)
    }

    /// Open items for a scope, in collection order.
    pub fn pending(&self, scope: &RoleScope, skips: SkipPolicy) -> Vec<&QueueItem> {
        self.items
            .iter()
            .filter(|i| is_eligible_with(i, scope, skips))
            .collect()
    }

    /// Records an acknowledged completion. Returns `false` if the id is unknown.
    pub fn mark_completed(
        &mut self,
        id: &ItemId,
        new_status: Option<LeadStatus>,
        activity: ActivityType,
        next_touch_at: Option<NaiveDate>,
    ) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.is_completed = true;
        item.is_skipped = false;
        item.is_done = Some(true);
        if let Some(status) = new_status {
            item.status = status;
        }
        item.activity_type = Some(activity);
        if let Some(date) = next_touch_at {
            item.next_touch_at = Some(date.to_string());
        }
        true
    }

    pub fn set_next_touch(&mut self, id: &ItemId, next_touch_at: String) {
        if let Some(item) = self.get_mut(id) {
            item.next_touch_at = Some(next_touch_at);
        }
    }

    /// Records an acknowledged skip. Returns `false` if the id is unknown.
    pub fn mark_skipped(&mut self, id: &ItemId) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.is_skipped = true;
        item.is_completed = false;
        item.is_done = Some(true);
        true
    }

    /// Applies acknowledged lead fields to every item of that lead.
    pub fn apply_lead_update(&mut self, lead_id: &str, update: &LeadUpdate) -> usize {
        let mut touched = 0;
        for item in self.items.iter_mut().filter(|i| i.lead_id.as_deref() == Some(lead_id)) {
            update.apply_to(item);
            touched += 1;
        }
        touched
    }
}
