//! Lifecycle orchestration for one operator's work session.
//!
//! [`Workbench`] owns the loaded batch ([`QueueStore`]), the block
//! ([`SessionController`]) and the server client. Done, skip and lead edits
//! are applied to the store only after the server acknowledges them; a
//! failed call leaves every piece of state exactly as it was.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::types::BatchInfo;
use crate::api::{DoneRequest, GenerateRequest, LeadUpdate, QueueApi, SkipRequest};
use crate::error::QueueError;
use crate::queue::{
    ActivityType, DailyGoals, GoalMetric, ItemId, LeadStatus, Plan, Progress, QueueItem,
    QueueStore, RawQueueItem, Resolution, RoleScope, SessionController, SkipPolicy, goal_metrics,
};

/// What the operator submits when finishing an item.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Required. `None` is rejected before any request is made.
    pub activity: Option<ActivityType>,
    pub resolution: Resolution,
    pub notes: String,
    pub next_touch_at: Option<NaiveDate>,
}

pub struct Workbench<A> {
    api: A,
    store: QueueStore,
    session: SessionController,
    goals: DailyGoals,
}

impl<A: QueueApi> Workbench<A> {
    pub fn new(api: A, goals: DailyGoals) -> Self {
        Self {
            api,
            store: QueueStore::default(),
            session: SessionController::new(),
            goals,
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Loads the server's current batch, replacing whatever was loaded and
    /// ending any block. Returns `false` when the server has no active batch.
    pub async fn load_current(&mut self) -> Result<bool, QueueError> {
        let Some(queue) = self.api.current_queue().await? else {
            info!("no active batch on server");
            self.install(Vec::new());
            return Ok(false);
        };
        let count = self.install(ingest(queue.items));
        info!(items = count, "batch loaded");
        Ok(true)
    }

    /// Re-fetches the current batch and appends items not loaded yet. Loaded
    /// items and the block snapshot stay as they are.
    pub async fn refresh(&mut self) -> Result<usize, QueueError> {
        let queue = self
            .api
            .current_queue()
            .await?
            .ok_or(QueueError::NoActiveBatch)?;
        let added = self.store.extend(ingest(queue.items));
        debug!(added, "queue refreshed");
        Ok(added)
    }

    /// Asks the server for a fresh batch and replaces the loaded one.
    pub async fn generate(
        &mut self,
        batch_size: u32,
        industries: Vec<String>,
    ) -> Result<BatchInfo, QueueError> {
        if batch_size == 0 {
            return Err(QueueError::Validation("Batch size must be at least 1".into()));
        }
        let req = GenerateRequest {
            batch_size,
            industries,
        };
        let response = self.api.generate_batch(&req).await?;
        let count = self.install(ingest(response.items));
        info!(items = count, batch = ?response.batch.id, "batch generated");
        Ok(response.batch)
    }

    fn install(&mut self, items: Vec<QueueItem>) -> usize {
        self.session.end();
        self.store.replace(items);
        self.store.len()
    }

    /// Starts a block over the eligible items and returns the auto-selected one.
    pub fn start(&mut self, scope: RoleScope) -> Option<ItemId> {
        self.session.start(scope, &self.store).cloned()
    }

    pub fn end(&mut self) {
        self.session.end();
    }

    /// Operator override of the current selection.
    pub fn select(&mut self, id: ItemId) -> Result<(), QueueError> {
        if !self.store.contains(&id) {
            return Err(QueueError::UnknownItem(id));
        }
        self.session.select(id);
        Ok(())
    }

    /// Re-runs auto-selection.
    pub fn select_next(&mut self) -> Option<ItemId> {
        self.session.advance(&self.store).cloned()
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.session.selected().and_then(|id| self.store.get(id))
    }

    pub fn item(&self, id: &ItemId) -> Result<&QueueItem, QueueError> {
        self.store
            .get(id)
            .ok_or_else(|| QueueError::UnknownItem(id.clone()))
    }

    /// The plan a resolution would send for an item, without sending it.
    pub fn preview(&self, id: &ItemId, resolution: &Resolution) -> Result<Plan, QueueError> {
        Ok(resolution.plan_for(self.item(id)?))
    }

    /// Completes an item. Validates locally, sends one request, and only on
    /// acknowledgment flags the item and advances the selection.
    pub async fn mark_done(
        &mut self,
        id: &ItemId,
        completion: Completion,
    ) -> Result<Plan, QueueError> {
        let Some(activity) = completion.activity else {
            return Err(QueueError::Validation(
                "Choose an activity type (call, email or social) before marking done".into(),
            ));
        };
        let plan = self.preview(id, &completion.resolution)?;
        let req = DoneRequest::new(plan, activity, completion.next_touch_at, completion.notes);

        debug!(item_id = %id, status = %plan.new_status, next_touch = %plan.next_touch, "completing item");
        let ack = self.api.complete_item(id, &req).await.inspect_err(|e| {
            warn!(item_id = %id, error = %e, "completion failed, queue unchanged");
        })?;

        self.store
            .mark_completed(id, Some(plan.new_status), activity, completion.next_touch_at);
        if completion.next_touch_at.is_none()
            && let Some(next_touch) = ack.next_touch_at
        {
            self.store.set_next_touch(id, next_touch);
        }
        if let Some(label) = ack.status.as_deref()
            && let Some(status) = LeadStatus::parse(label)
            && status != plan.new_status
        {
            warn!(item_id = %id, planned = %plan.new_status, server = %status, "server stored a different status");
        }
        self.session.advance(&self.store);
        info!(item_id = %id, status = %plan.new_status, "item completed");
        Ok(plan)
    }

    /// Skips an item. Same post-acknowledgment contract as [`mark_done`](Self::mark_done).
    pub async fn mark_skip(&mut self, id: &ItemId, reason: &str) -> Result<(), QueueError> {
        self.item(id)?;
        let req = SkipRequest {
            reason: reason.trim().to_string(),
        };
        self.api.skip_item(id, &req).await.inspect_err(|e| {
            warn!(item_id = %id, error = %e, "skip failed, queue unchanged");
        })?;

        self.store.mark_skipped(id);
        self.session.advance(&self.store);
        info!(item_id = %id, "item skipped");
        Ok(())
    }

    /// Sends a partial lead update and applies the echoed fields to every
    /// loaded item of that lead. Returns how many items changed.
    pub async fn edit_lead(&mut self, lead_id: &str, update: LeadUpdate) -> Result<usize, QueueError> {
        if update.is_empty() {
            return Err(QueueError::Validation("Nothing to update".into()));
        }
        if let Some(status) = update.status.as_deref()
            && LeadStatus::parse(status).is_none()
        {
            return Err(QueueError::Validation(format!("Unknown status '{status}'")));
        }
        let echoed = self.api.update_lead(lead_id, &update).await?;
        // Servers that ack without echoing get the fields that were sent.
        let applied = if echoed.is_empty() { update } else { echoed };
        let touched = self.store.apply_lead_update(lead_id, &applied);
        info!(lead_id, items = touched, "lead updated");
        Ok(touched)
    }

    /// Whole-batch progress, recomputed from the store.
    pub fn progress(&self) -> Progress {
        Progress::from_items(self.store.items())
    }

    pub fn session_progress(&self) -> Progress {
        self.session.progress(&self.store)
    }

    pub fn goal_metrics(&self) -> Vec<GoalMetric> {
        goal_metrics(self.store.items(), &self.goals)
    }

    /// Open items for the pending list, passing over skipped ones.
    pub fn pending(&self, scope: &RoleScope) -> Vec<&QueueItem> {
        self.store.pending(scope, SkipPolicy::Exclude)
    }

    /// Done and skip are offered only while there is unfinished work.
    pub fn controls_enabled(&self) -> bool {
        let progress = self.progress();
        !progress.is_empty() && !progress.is_finished()
    }
}

fn ingest(raw: Vec<RawQueueItem>) -> Vec<QueueItem> {
    let total = raw.len();
    let items: Vec<QueueItem> = raw.into_iter().filter_map(QueueItem::from_raw).collect();
    if items.len() < total {
        warn!(dropped = total - items.len(), "items without an id were dropped");
    }
    items
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::api::ApiError;
    use crate::api::types::{CurrentQueueResponse, DoneAck, GenerateResponse};
    use crate::error::FailureKind;
    use crate::queue::{NextTouch, Outcome};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fail {
        Never,
        Reject,
        Transport,
    }

    /// In-memory server that records every call.
    struct MockApi {
        items: Vec<RawQueueItem>,
        fail: Fail,
        calls: Mutex<Vec<String>>,
        done_bodies: Mutex<Vec<DoneRequest>>,
    }

    impl MockApi {
        fn with_items(items: Vec<RawQueueItem>) -> Self {
            Self {
                items,
                fail: Fail::Never,
                calls: Mutex::new(Vec::new()),
                done_bodies: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self) -> Self {
            self.fail = Fail::Reject;
            self
        }

        fn unreachable(mut self) -> Self {
            self.fail = Fail::Transport;
            self
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            match self.fail {
                Fail::Never => Ok(()),
                Fail::Reject => Err(ApiError::Rejected {
                    status: 422,
                    message: "rejected by mock".into(),
                }),
                // A URL that cannot be parsed is the cheapest real reqwest::Error.
                Fail::Transport => Err(ApiError::Transport(
                    reqwest::Client::new().get("not a url").build().unwrap_err(),
                )),
            }
        }
    }

    impl QueueApi for MockApi {
        async fn current_queue(&self) -> Result<Option<CurrentQueueResponse>, ApiError> {
            self.calls.lock().unwrap().push("current".into());
            Ok(Some(CurrentQueueResponse {
                items: self.items.clone(),
            }))
        }

        async fn generate_batch(&self, req: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
            self.record(format!("generate {}", req.batch_size))?;
            Ok(GenerateResponse {
                batch: BatchInfo::default(),
                items: (0..req.batch_size).map(|i| raw(&format!("g{i}"), "")).collect(),
            })
        }

        async fn complete_item(&self, id: &ItemId, req: &DoneRequest) -> Result<DoneAck, ApiError> {
            self.record(format!("done {id}"))?;
            self.done_bodies.lock().unwrap().push(req.clone());
            Ok(DoneAck::default())
        }

        async fn skip_item(&self, id: &ItemId, _req: &SkipRequest) -> Result<(), ApiError> {
            self.record(format!("skip {id}"))
        }

        async fn update_lead(&self, lead_id: &str, _fields: &LeadUpdate) -> Result<LeadUpdate, ApiError> {
            self.record(format!("lead {lead_id}"))?;
            Ok(LeadUpdate::default())
        }
    }

    fn raw(id: &str, role: &str) -> RawQueueItem {
        serde_json::from_value(serde_json::json!({
            "item_id": id,
            "role": role,
            "status": "cold"
        }))
        .unwrap()
    }

    async fn loaded(api: MockApi) -> Workbench<MockApi> {
        let mut bench = Workbench::new(api, DailyGoals::default());
        assert!(bench.load_current().await.unwrap());
        bench
    }

    fn outcome(code: &str, activity: Option<ActivityType>) -> Completion {
        Completion {
            activity,
            resolution: Resolution::Outcome(Outcome::from_code(code)),
            notes: String::new(),
            next_touch_at: None,
        }
    }

    fn calls(bench: &Workbench<MockApi>) -> Vec<String> {
        bench.api.calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn role_block_completion_advances_to_unassigned_item() {
        let api = MockApi::with_items(vec![raw("0", ""), raw("1", "CFO"), raw("2", "Treasury")]);
        let mut bench = loaded(api).await;

        let first = bench.start(RoleScope::parse("CFO"));
        let snapshot: Vec<_> = bench.session().snapshot().iter().map(ItemId::as_str).collect();
        assert_eq!(snapshot, vec!["0", "1"]);
        assert_eq!(first, Some(ItemId::new("0")));

        bench.select(ItemId::new("1")).unwrap();
        let plan = bench
            .mark_done(&ItemId::new("1"), outcome("meeting_set", Some(ActivityType::Call)))
            .await
            .unwrap();
        assert_eq!(plan.new_status, LeadStatus::Hot);
        assert_eq!(plan.next_touch, NextTouch::NextWeek);

        let done = bench.store().get(&ItemId::new("1")).unwrap();
        assert!(done.is_completed);
        assert_eq!(done.status, LeadStatus::Hot);
        assert_eq!(done.activity_type, Some(ActivityType::Call));
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("0"));

        let sent = bench.api.done_bodies.lock().unwrap()[0].clone();
        assert_eq!(sent.next_touch_choice, NextTouch::NextWeek);
        assert_eq!(sent.action_type, ActivityType::Call);
    }

    #[tokio::test]
    async fn missing_activity_makes_no_call_and_no_mutation() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", "")])).await;
        bench.start(RoleScope::Any);
        let before = bench.store().items().to_vec();

        let err = bench
            .mark_done(&ItemId::new("0"), outcome("converted", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(calls(&bench), vec!["current"]);
        assert_eq!(bench.store().items(), before.as_slice());
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("0"));
    }

    #[tokio::test]
    async fn server_rejection_leaves_store_untouched() {
        let api = MockApi::with_items(vec![raw("0", ""), raw("1", "")]).failing();
        let mut bench = loaded(api).await;
        bench.start(RoleScope::Any);
        let before = bench.store().items().to_vec();

        let err = bench
            .mark_done(&ItemId::new("0"), outcome("no_answer", Some(ActivityType::Email)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ServerRejection);
        assert!(err.to_string().contains("rejected by mock"));
        assert_eq!(bench.store().items(), before.as_slice());
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("0"));

        let err = bench.mark_skip(&ItemId::new("0"), "busy").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ServerRejection);
        assert!(!bench.store().get(&ItemId::new("0")).unwrap().is_skipped);
    }

    #[tokio::test]
    async fn transport_failure_leaves_store_and_selection_untouched() {
        let api = MockApi::with_items(vec![raw("0", ""), raw("1", "")]).unreachable();
        let mut bench = loaded(api).await;
        bench.start(RoleScope::Any);
        let before = bench.store().items().to_vec();

        let err = bench
            .mark_done(&ItemId::new("0"), outcome("meeting_set", Some(ActivityType::Call)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(bench.store().items(), before.as_slice());
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("0"));

        let err = bench.mark_skip(&ItemId::new("0"), "busy").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(bench.store().items(), before.as_slice());
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("0"));
        assert_eq!(calls(&bench), vec!["current", "done 0", "skip 0"]);
    }

    #[tokio::test]
    async fn ingested_done_flag_does_not_freeze_progress() {
        let items: Vec<RawQueueItem> = ["0", "1"]
            .map(|id| {
                serde_json::from_value(serde_json::json!({"id": id, "is_done": false})).unwrap()
            })
            .to_vec();
        let mut bench = loaded(MockApi::with_items(items)).await;
        bench.start(RoleScope::Any);
        bench
            .mark_done(&ItemId::new("0"), outcome("touched", Some(ActivityType::Call)))
            .await
            .unwrap();
        bench.mark_skip(&ItemId::new("1"), "").await.unwrap();
        assert!(bench.progress().is_finished());
        assert!(!bench.controls_enabled());
    }

    #[tokio::test]
    async fn unknown_item_is_rejected_locally() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", "")])).await;
        let err = bench
            .mark_done(&ItemId::new("nope"), outcome("touched", Some(ActivityType::Social)))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::UnknownItem(_)));
        assert!(bench.select(ItemId::new("nope")).is_err());
        assert_eq!(calls(&bench), vec!["current"]);
    }

    #[tokio::test]
    async fn explicit_plan_follows_same_path() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", "")])).await;
        let date = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let completion = Completion {
            activity: Some(ActivityType::Email),
            resolution: Resolution::Explicit(Plan {
                new_status: LeadStatus::Research,
                next_touch: NextTouch::Tomorrow,
            }),
            notes: "sent deck".into(),
            next_touch_at: Some(date),
        };
        bench.mark_done(&ItemId::new("0"), completion).await.unwrap();

        let item = bench.store().get(&ItemId::new("0")).unwrap();
        assert_eq!(item.status, LeadStatus::Research);
        assert_eq!(item.next_touch_at.as_deref(), Some("2026-11-02"));
        let sent = bench.api.done_bodies.lock().unwrap()[0].clone();
        assert_eq!(sent.next_touch_at, Some(date));
        assert_eq!(sent.notes, "sent deck");
    }

    #[tokio::test]
    async fn done_and_skip_progress_and_goals() {
        let api = MockApi::with_items(vec![raw("0", ""), raw("1", ""), raw("2", ""), raw("3", "")]);
        let mut bench = loaded(api).await;
        bench.start(RoleScope::Any);

        bench
            .mark_done(&ItemId::new("0"), outcome("touched", Some(ActivityType::Call)))
            .await
            .unwrap();
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("1"));
        bench.mark_skip(&ItemId::new("1"), "wrong number").await.unwrap();
        assert_eq!(bench.current().unwrap().item_id, ItemId::new("2"));

        let progress = bench.progress();
        assert_eq!(progress.done, 2);
        assert_eq!(progress.percent, 50);
        assert_eq!(progress.remaining, 2);

        let metrics = bench.goal_metrics();
        let total: u32 = metrics.iter().map(|m| m.count).sum();
        assert_eq!(total, 1);
        assert_eq!(metrics[0].count, 1);
        assert!(bench.controls_enabled());
    }

    #[tokio::test]
    async fn finishing_the_batch_disables_controls() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", "")])).await;
        bench.start(RoleScope::Any);
        bench
            .mark_done(&ItemId::new("0"), outcome("converted", Some(ActivityType::Call)))
            .await
            .unwrap();
        assert!(bench.progress().is_finished());
        assert!(!bench.controls_enabled());
        assert!(bench.current().is_none());
    }

    #[tokio::test]
    async fn empty_batch_disables_controls() {
        let bench = loaded(MockApi::with_items(vec![])).await;
        assert!(bench.progress().is_empty());
        assert!(!bench.controls_enabled());
    }

    #[tokio::test]
    async fn refresh_appends_without_touching_snapshot() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", "")])).await;
        bench.start(RoleScope::Any);
        bench.api.calls.lock().unwrap().clear();

        let mut more = bench.api.items.clone();
        more.push(raw("1", ""));
        bench.api.items = more;
        assert_eq!(bench.refresh().await.unwrap(), 1);
        assert_eq!(bench.store().len(), 2);
        assert_eq!(bench.session().snapshot().len(), 1);
        assert!(bench.session().is_active());
    }

    #[tokio::test]
    async fn generate_replaces_batch_and_ends_block() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", "")])).await;
        bench.start(RoleScope::Any);
        bench.generate(3, vec!["fintech".into()]).await.unwrap();
        assert_eq!(bench.store().len(), 3);
        assert!(!bench.session().is_active());
        assert!(bench.current().is_none());
        assert!(!bench.store().contains(&ItemId::new("0")));

        let err = bench.generate(0, vec![]).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    #[tokio::test]
    async fn edit_lead_applies_sent_fields_when_not_echoed() {
        let mut item = raw("0", "");
        item.0.insert("lead_id".into(), "L1".into());
        let mut bench = loaded(MockApi::with_items(vec![item, raw("1", "")])).await;

        let update = LeadUpdate {
            role: Some("CFO".into()),
            ..Default::default()
        };
        assert_eq!(bench.edit_lead("L1", update).await.unwrap(), 1);
        assert_eq!(bench.store().get(&ItemId::new("0")).unwrap().role, "CFO");
        assert_eq!(bench.store().get(&ItemId::new("1")).unwrap().role, "");

        let err = bench.edit_lead("L1", LeadUpdate::default()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        let bad = LeadUpdate {
            status: Some("lukewarm".into()),
            ..Default::default()
        };
        assert!(bench.edit_lead("L1", bad).await.is_err());
        assert_eq!(calls(&bench).iter().filter(|c| c.starts_with("lead")).count(), 1);
    }

    #[tokio::test]
    async fn pending_list_passes_over_skipped() {
        let mut bench = loaded(MockApi::with_items(vec![raw("0", ""), raw("1", "CFO")])).await;
        bench.mark_skip(&ItemId::new("0"), "").await.unwrap();
        let pending: Vec<_> = bench
            .pending(&RoleScope::Any)
            .iter()
            .map(|i| i.item_id.as_str().to_string())
            .collect();
        assert_eq!(pending, vec!["1"]);
    }
}
