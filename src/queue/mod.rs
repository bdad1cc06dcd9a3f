pub mod eligibility;
pub mod item;
pub mod planner;
pub mod progress;
pub mod session;
pub mod store;

pub use eligibility::{RoleScope, SkipPolicy};
pub use item::{ActivityType, ItemId, LeadStatus, QueueItem, RawQueueItem};
pub use planner::{NextTouch, Outcome, Plan, Resolution};
pub use progress::{DailyGoals, GoalMetric, Progress, goal_metrics};
pub use session::SessionController;
pub use store::QueueStore;
