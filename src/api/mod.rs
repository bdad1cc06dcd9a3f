pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpQueueClient, QueueApi};
pub use error::ApiError;
pub use types::{DoneRequest, GenerateRequest, LeadUpdate, SkipRequest};
