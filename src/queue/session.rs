use tracing::debug;

use super::eligibility::{RoleScope, SkipPolicy, is_eligible};
use super::item::ItemId;
use super::progress::Progress;
use super::store::QueueStore;

/// The live cursor passes over skipped items; [`SessionController::start`]
/// offers them again through [`is_eligible`].
const CURSOR_SKIPS: SkipPolicy = SkipPolicy::Exclude;

/// Lifecycle of a work block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active {
        scope: RoleScope,
        /// Ids captured at start, in collection order. Never grows.
        snapshot: Vec<ItemId>,
    },
}

/// Owns the block snapshot and the current selection. Reads items through
/// the store by id; never mutates them.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: SessionState,
    selected: Option<ItemId>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            selected: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    pub fn scope(&self) -> Option<&RoleScope> {
        match &self.state {
            SessionState::Active { scope, .. } => Some(scope),
            SessionState::Idle => None,
        }
    }

    pub fn snapshot(&self) -> &[ItemId] {
        match &self.state {
            SessionState::Active { snapshot, .. } => snapshot,
            SessionState::Idle => &[],
        }
    }

    pub fn selected(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    /// Snapshots the eligible items and auto-selects the first open one.
    pub fn start(&mut self, scope: RoleScope, store: &QueueStore) -> Option<&ItemId> {
        let snapshot: Vec<ItemId> = store
            .items()
            .iter()
            .filter(|item| is_eligible(item, &scope))
            .map(|item| item.item_id.clone())
            .collect();
        debug!(%scope, size = snapshot.len(), "block started");
        self.state = SessionState::Active { scope, snapshot };
        self.selected = None;
        self.advance(store)
    }

    pub fn end(&mut self) {
        if self.is_active() {
            debug!("block ended");
        }
        self.state = SessionState::Idle;
        self.selected = None;
    }

    /// First snapshot id whose item is still open, or `None` when the block is
    /// exhausted or idle. Skipped items are passed over until the next start.
    pub fn find_next(&self, store: &QueueStore) -> Option<ItemId> {
        self.snapshot()
            .iter()
            .find(|id| store.get(id).is_some_and(|item| CURSOR_SKIPS.is_open(item)))
            .cloned()
    }

    /// Moves the selection to [`find_next`](Self::find_next). Call only after
    /// the store mutation that prompted it has been applied.
    pub fn advance(&mut self, store: &QueueStore) -> Option<&ItemId> {
        self.selected = self.find_next(store);
        self.selected.as_ref()
    }

    /// Operator override. Allowed in any state; leaves the snapshot alone.
    pub fn select(&mut self, id: ItemId) {
        self.selected = Some(id);
    }

    /// Done/remaining over the snapshot rather than the whole batch.
    pub fn progress(&self, store: &QueueStore) -> Progress {
        let items = self.snapshot().iter().filter_map(|id| store.get(id));
        Progress::from_items(items)
    }
}
