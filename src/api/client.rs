use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::ApiError;
use super::types::{
    CurrentQueueResponse, DoneAck, DoneRequest, ErrorBody, GenerateRequest, GenerateResponse,
    LeadUpdate, SkipRequest,
};
use crate::queue::item::ItemId;

/// The server endpoints the work session talks to.
///
/// Every call is a single request/response; nothing is retried.
#[allow(async_fn_in_trait)]
pub trait QueueApi {
    /// `Ok(None)` means the server has no active batch.
    async fn current_queue(&self) -> Result<Option<CurrentQueueResponse>, ApiError>;

    async fn generate_batch(&self, req: &GenerateRequest) -> Result<GenerateResponse, ApiError>;

    async fn complete_item(&self, id: &ItemId, req: &DoneRequest) -> Result<DoneAck, ApiError>;

    async fn skip_item(&self, id: &ItemId, req: &SkipRequest) -> Result<(), ApiError>;

    async fn update_lead(&self, lead_id: &str, fields: &LeadUpdate) -> Result<LeadUpdate, ApiError>;
}

pub struct HttpQueueClient {
    client: Client,
    base_url: String,
}

impl HttpQueueClient {
    pub fn new(base_url: &str, connect_timeout: Duration, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client with default timeouts pointing at `base_url`.
    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Self::new(base_url, Duration::from_secs(10), Duration::from_secs(30))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl QueueApi for HttpQueueClient {
    async fn current_queue(&self) -> Result<Option<CurrentQueueResponse>, ApiError> {
        let response = self.client.get(self.url("queue/current")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = decode(response).await?;
        Ok(Some(body))
    }

    async fn generate_batch(&self, req: &GenerateRequest) -> Result<GenerateResponse, ApiError> {
        let response = self
            .client
            .post(self.url("queue/generate"))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    async fn complete_item(&self, id: &ItemId, req: &DoneRequest) -> Result<DoneAck, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("queue/item/{id}/done")))
            .json(req)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let text = response.text().await?;
        // The completion is already recorded; an unreadable ack body is not a failure.
        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            if !text.trim().is_empty() {
                warn!(item_id = %id, error = %e, "unreadable done acknowledgment ignored");
            }
            DoneAck::default()
        }))
    }

    async fn skip_item(&self, id: &ItemId, req: &SkipRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("queue/item/{id}/skip")))
            .json(req)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_lead(&self, lead_id: &str, fields: &LeadUpdate) -> Result<LeadUpdate, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("lead/{lead_id}")))
            .json(fields)
            .send()
            .await?;
        decode_or_default(response).await
    }
}

/// Turns a non-2xx response into [`ApiError::Rejected`] with the server's message.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message: rejection_message(&text, status),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

// Acknowledgments may come back with an empty body.
async fn decode_or_default<T: DeserializeOwned + Default>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn rejection_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.error.or(parsed.message)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::item::{ActivityType, LeadStatus};
    use crate::queue::planner::{NextTouch, Plan};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HttpQueueClient {
        HttpQueueClient::with_base_url(&format!("{}/api", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn current_queue_returns_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/queue/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{"id": 1, "company": "Acme"}, {"id": 2}]
            })))
            .mount(&server)
            .await;

        let queue = client_for(&server).await.current_queue().await.unwrap().unwrap();
        assert_eq!(queue.items.len(), 2);
        assert_eq!(queue.items[0].0["company"], "Acme");
    }

    #[tokio::test]
    async fn current_queue_not_found_means_no_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/queue/current"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let queue = client_for(&server).await.current_queue().await.unwrap();
        assert!(queue.is_none());
    }

    #[tokio::test]
    async fn complete_item_posts_plan() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queue/item/17/done"))
            .and(body_json(serde_json::json!({
                "new_status": "hot",
                "next_touch_choice": "next_week",
                "action_type": "call",
                "notes": "booked demo"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 17,
                "status": "hot",
                "next_touch_at": "2026-10-23"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let plan = Plan {
            new_status: LeadStatus::Hot,
            next_touch: NextTouch::NextWeek,
        };
        let req = DoneRequest::new(plan, ActivityType::Call, None, "booked demo");
        let ack = client_for(&server)
            .await
            .complete_item(&ItemId::new("17"), &req)
            .await
            .unwrap();
        assert_eq!(ack.next_touch_at.as_deref(), Some("2026-10-23"));
    }

    #[tokio::test]
    async fn complete_item_accepts_empty_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queue/item/3/done"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let plan = Plan {
            new_status: LeadStatus::Warm,
            next_touch: NextTouch::ThreeDays,
        };
        let req = DoneRequest::new(plan, ActivityType::Email, None, "");
        let ack = client_for(&server)
            .await
            .complete_item(&ItemId::new("3"), &req)
            .await
            .unwrap();
        assert!(ack.next_touch_at.is_none());
    }

    #[tokio::test]
    async fn complete_item_ack_with_doubled_keys_or_plain_text_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queue/item/4/done"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "hot",
                "lead_status": "hot",
                "next_touch_at": "2026-10-23",
                "next_touch": "2026-10-23"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/queue/item/6/done"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let plan = Plan {
            new_status: LeadStatus::Hot,
            next_touch: NextTouch::NextWeek,
        };
        let req = DoneRequest::new(plan, ActivityType::Call, None, "");
        let client = client_for(&server).await;
        let ack = client.complete_item(&ItemId::new("4"), &req).await.unwrap();
        assert_eq!(ack.status.as_deref(), Some("hot"));
        assert_eq!(ack.next_touch_at.as_deref(), Some("2026-10-23"));

        let ack = client.complete_item(&ItemId::new("6"), &req).await.unwrap();
        assert!(ack.status.is_none());
    }

    #[tokio::test]
    async fn rejection_passes_server_message_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queue/item/5/skip"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(serde_json::json!({"error": "item already completed"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .skip_item(&ItemId::new("5"), &SkipRequest { reason: "dup".into() })
            .await
            .unwrap_err();
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "item already completed");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_falls_back_to_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queue/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .generate_batch(&GenerateRequest {
                batch_size: 10,
                industries: vec![],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database unavailable"));
    }

    #[tokio::test]
    async fn update_lead_puts_changed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/lead/88"))
            .and(body_json(serde_json::json!({"role": "CFO"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"role": "CFO"})))
            .mount(&server)
            .await;

        let update = LeadUpdate {
            role: Some("CFO".into()),
            ..Default::default()
        };
        let echoed = client_for(&server).await.update_lead("88", &update).await.unwrap();
        assert_eq!(echoed.role.as_deref(), Some("CFO"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = HttpQueueClient::with_base_url("http://127.0.0.1:9").unwrap();
        let err = client.current_queue().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn rejection_message_prefers_json_fields() {
        assert_eq!(
            rejection_message(r#"{"message": "bad status"}"#, StatusCode::BAD_REQUEST),
            "bad status"
        );
        assert_eq!(rejection_message("", StatusCode::BAD_REQUEST), "Bad Request");
    }
}
