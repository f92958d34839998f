use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::a002_batch_event::aggregate::BatchEvent;
use crate::domain::common::{Identifier, ValidationError};

// ============================================================================
// Aggregate
// ============================================================================

/// Harvested product lot, root of a trace timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: Identifier,
    pub product_name: String,
    pub origin: String,
    pub harvest_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// Ordered by event `timestamp`, oldest first
    #[serde(default)]
    pub events: Vec<BatchEvent>,
}

impl Batch {
    /// Build a freshly created batch. The timeline starts empty.
    pub fn from_new(id: Identifier, new: NewBatch, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            product_name: new.product_name,
            origin: new.origin,
            harvest_date: new.harvest_date,
            created_at,
            events: Vec::new(),
        }
    }
}

// ============================================================================
// Create request
// ============================================================================

/// Body of `POST /batch`.
///
/// Fields are kept as raw JSON values, absent or not, so that a missing or
/// mistyped one is reported by [`BatchDto::validate`] together with the other
/// problems instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchDto {
    pub product_name: Option<Value>,
    pub origin: Option<Value>,
    /// ISO calendar date, `YYYY-MM-DD`
    pub harvest_date: Option<Value>,
}

/// Checked create input
#[derive(Debug, Clone, PartialEq)]
pub struct NewBatch {
    pub product_name: String,
    pub origin: String,
    pub harvest_date: NaiveDate,
}

impl BatchDto {
    pub fn validate(&self) -> Result<NewBatch, ValidationError> {
        let mut errors = ValidationError::new();
        let product_name = errors.required_text("product_name", self.product_name.as_ref());
        let origin = errors.required_text("origin", self.origin.as_ref());
        let harvest_date = errors.required_date("harvest_date", self.harvest_date.as_ref());

        match (product_name, origin, harvest_date) {
            (Some(product_name), Some(origin), Some(harvest_date)) => Ok(NewBatch {
                product_name,
                origin,
                harvest_date,
            }),
            _ => Err(errors),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Reply to `POST /batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreationResponse {
    pub batch_id: Identifier,
    /// Consumer-facing page showing this batch's timeline
    pub trace_url: String,
    pub product_name: String,
    pub origin: String,
    pub harvest_date: NaiveDate,
}

impl BatchCreationResponse {
    pub fn new(batch: &Batch, frontend_base_url: &str) -> Self {
        Self {
            batch_id: batch.id,
            trace_url: trace_url(frontend_base_url, &batch.id),
            product_name: batch.product_name.clone(),
            origin: batch.origin.clone(),
            harvest_date: batch.harvest_date,
        }
    }
}

/// `{base}/trace/{id}`, tolerant of a trailing slash on `base`.
pub fn trace_url(frontend_base_url: &str, id: &Identifier) -> String {
    format!("{}/trace/{}", frontend_base_url.trim_end_matches('/'), id)
}
