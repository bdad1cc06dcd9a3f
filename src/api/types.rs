//! Tipos de dados para requisições e respostas do servidor da fila.
//!
//! Os corpos de requisição derivam `Serialize`; as respostas derivam
//! `Deserialize` e toleram campos ausentes, já que o servidor ecoa apenas
//! o que mudou.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::queue::item::{
    ActivityType, LeadStatus, QueueItem, RawQueueItem, keys, pick, pick_number, pick_text,
};
use crate::queue::planner::{NextTouch, Plan};

/// Resposta de `GET queue/current`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentQueueResponse {
    #[serde(default)]
    pub items: Vec<RawQueueItem>,
}

/// Corpo de `POST queue/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub batch_size: u32,
    pub industries: Vec<String>,
}

/// Metadados do lote gerado.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub struct BatchInfo {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub size: Option<u32>,
}

impl From<Value> for BatchInfo {
    fn from(value: Value) -> Self {
        let fields = object(&value);
        Self {
            id: pick_text(fields, &["id", "batch_id"]),
            created_at: pick_text(fields, &["created_at"]),
            size: pick(fields, &["size", "batch_size"])
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
        }
    }
}

/// Resposta de `POST queue/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub batch: BatchInfo,
    #[serde(default)]
    pub items: Vec<RawQueueItem>,
}

/// Corpo de `POST queue/item/{id}/done`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoneRequest {
    pub new_status: LeadStatus,
    pub next_touch_choice: NextTouch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_touch_at: Option<NaiveDate>,
    pub action_type: ActivityType,
    pub notes: String,
}

impl DoneRequest {
    pub fn new(
        plan: Plan,
        activity: ActivityType,
        next_touch_at: Option<NaiveDate>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            new_status: plan.new_status,
            next_touch_choice: plan.next_touch,
            next_touch_at,
            action_type: activity,
            notes: notes.into(),
        }
    }
}

/// Resposta de conclusão. O servidor devolve o item atualizado; só o que
/// o cliente usa é lido. Qualquer corpo 2xx é aceito: a conclusão já foi
/// registrada no servidor, então um formato inesperado não pode virar erro.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub struct DoneAck {
    pub status: Option<String>,
    pub next_touch_at: Option<String>,
}

impl From<Value> for DoneAck {
    fn from(value: Value) -> Self {
        let fields = object(&value);
        Self {
            status: pick_text(fields, keys::STATUS),
            next_touch_at: pick_text(fields, keys::NEXT_TOUCH),
        }
    }
}

/// Corpo de `POST queue/item/{id}/skip`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipRequest {
    pub reason: String,
}

/// Atualização parcial de um lead (`PUT lead/{id}`). Campos `None` não são enviados;
/// a resposta usa o mesmo formato contendo só as chaves alteradas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ap_spend: Option<f64>,
}

/// O eco aceita as mesmas grafias da ingestão; a primeira chave presente vence.
impl From<Value> for LeadUpdate {
    fn from(value: Value) -> Self {
        let fields = object(&value);
        Self {
            company: pick_text(fields, keys::COMPANY),
            name: pick_text(fields, keys::NAME),
            role: pick_text(fields, keys::ROLE),
            status: pick_text(fields, keys::STATUS),
            location: pick_text(fields, keys::LOCATION),
            industry: pick_text(fields, keys::INDUSTRY),
            forecast_month: pick_text(fields, keys::FORECAST_MONTH),
            arr: pick_number(fields, keys::ARR),
            ap_spend: pick_number(fields, keys::AP_SPEND),
        }
    }
}

// Corpos que não são objetos contam como vazios.
fn object(value: &Value) -> &Map<String, Value> {
    static EMPTY: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);
    value.as_object().unwrap_or(&EMPTY)
}

impl LeadUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copia os campos presentes para o item. Status passa pela mesma normalização da ingestão.
    pub fn apply_to(&self, item: &mut QueueItem) {
        if let Some(company) = &self.company {
            item.company = company.trim().to_string();
        }
        if let Some(name) = &self.name {
            item.name = name.trim().to_string();
        }
        if let Some(role) = &self.role {
            item.role = role.trim().to_string();
        }
        if let Some(status) = &self.status {
            item.status = LeadStatus::normalize(status);
        }
        if let Some(location) = &self.location {
            item.location = Some(location.clone());
        }
        if let Some(industry) = &self.industry {
            item.industry = Some(industry.clone());
        }
        if let Some(month) = &self.forecast_month {
            item.forecast_month = Some(month.clone());
        }
        if self.arr.is_some() {
            item.arr = self.arr;
        }
        if self.ap_spend.is_some() {
            item.ap_spend = self.ap_spend;
        }
    }
}

/// Corpo de erro comum do servidor: `{"error": "..."}` ou `{"message": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
