use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::common::{Identifier, InvalidFormat, ValidationError};

// ============================================================================
// Aggregate
// ============================================================================

/// Dated occurrence in a batch's life (processing, packaging, shipping...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvent {
    pub id: Identifier,
    /// Owning batch, fixed at creation
    pub batch_id: Identifier,
    pub event_type: String,
    pub description: String,
    /// Real-world date of the event, not the record creation time
    pub timestamp: NaiveDate,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl BatchEvent {
    pub fn from_new(
        id: Identifier,
        batch_id: Identifier,
        new: NewBatchEvent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            batch_id,
            event_type: new.event_type,
            description: new.description,
            timestamp: new.timestamp,
            location: new.location,
            created_at,
        }
    }
}

/// Put a timeline in presentation order: event date ascending, then
/// creation order, then id so the result never depends on storage order.
pub fn sort_timeline(events: &mut [BatchEvent]) {
    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

// ============================================================================
// Create request
// ============================================================================

/// Body of `POST /event`.
///
/// Fields are raw JSON values like in [`BatchDto`](crate::domain::a001_batch::aggregate::BatchDto).
/// `batch_id` is resolved separately by [`BatchEventDto::batch_id`], so a
/// malformed id is reported as a format error, not as a validation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchEventDto {
    pub event_type: Option<Value>,
    pub description: Option<Value>,
    /// ISO calendar date, `YYYY-MM-DD`
    pub timestamp: Option<Value>,
    pub location: Option<Value>,
    pub batch_id: Option<Value>,
}

/// Why `batch_id` of a [`BatchEventDto`] could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchIdError {
    Missing(ValidationError),
    Malformed(InvalidFormat),
}

/// Checked create input, without the owning batch
#[derive(Debug, Clone, PartialEq)]
pub struct NewBatchEvent {
    pub event_type: String,
    pub description: String,
    pub timestamp: NaiveDate,
    pub location: String,
}

impl BatchEventDto {
    /// Owning batch. Anything other than a string counts as malformed.
    pub fn batch_id(&self) -> Result<Identifier, BatchIdError> {
        match &self.batch_id {
            None | Some(Value::Null) => Err(BatchIdError::Missing(ValidationError::single(
                "batch_id",
                "is required",
            ))),
            Some(Value::String(raw)) => Identifier::parse(raw).map_err(BatchIdError::Malformed),
            Some(other) => Err(BatchIdError::Malformed(InvalidFormat {
                input: other.to_string(),
            })),
        }
    }

    /// Checks everything except `batch_id`.
    pub fn validate(&self) -> Result<NewBatchEvent, ValidationError> {
        let mut errors = ValidationError::new();
        let event_type = errors.required_text("event_type", self.event_type.as_ref());
        let description = errors.required_text("description", self.description.as_ref());
        let timestamp = errors.required_date("timestamp", self.timestamp.as_ref());
        let location = errors.required_text("location", self.location.as_ref());

        match (event_type, description, timestamp, location) {
            (Some(event_type), Some(description), Some(timestamp), Some(location)) => {
                Ok(NewBatchEvent {
                    event_type,
                    description,
                    timestamp,
                    location,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(date: &str, created_at: DateTime<Utc>) -> BatchEvent {
        BatchEvent {
            id: Identifier::new(),
            batch_id: Identifier::new(),
            event_type: "Processing".into(),
            description: "Washed and sorted".into(),
            timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            location: "Plant A".into(),
            created_at,
        }
    }

    #[test]
    fn test_sort_timeline_by_date_then_creation() {
        let t0 = Utc::now();
        let mut events = vec![
            event("2024-01-23", t0),
            event("2024-01-21", t0 + Duration::seconds(2)),
            event("2024-01-22", t0 + Duration::seconds(3)),
            event("2024-01-21", t0 + Duration::seconds(1)),
        ];
        let tie_first = events[3].id;

        sort_timeline(&mut events);

        let dates: Vec<String> = events.iter().map(|e| e.timestamp.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2024-01-21", "2024-01-21", "2024-01-22", "2024-01-23"]
        );
        assert_eq!(events[0].id, tie_first);
    }

    #[test]
    fn test_validate_ignores_batch_id() {
        let dto = BatchEventDto {
            event_type: Some("Processing".into()),
            description: Some("Washed and sorted".into()),
            timestamp: Some("2024-01-21".into()),
            location: Some("Plant A".into()),
            batch_id: None,
        };
        let new = dto.validate().unwrap();
        assert_eq!(new.event_type, "Processing");
        assert_eq!(new.timestamp, NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());
    }

    #[test]
    fn test_batch_id_resolution() {
        let id = Identifier::new();
        let dto: BatchEventDto =
            serde_json::from_value(serde_json::json!({ "batch_id": id.to_string() })).unwrap();
        assert_eq!(dto.batch_id(), Ok(id));

        assert!(matches!(
            BatchEventDto::default().batch_id(),
            Err(BatchIdError::Missing(e)) if e.has_field("batch_id")
        ));

        let dto: BatchEventDto = serde_json::from_str(r#"{"batch_id": 123}"#).unwrap();
        assert_eq!(
            dto.batch_id(),
            Err(BatchIdError::Malformed(InvalidFormat { input: "123".into() }))
        );

        let dto: BatchEventDto = serde_json::from_str(r#"{"batch_id": "batch-1"}"#).unwrap();
        assert!(matches!(dto.batch_id(), Err(BatchIdError::Malformed(_))));
    }

    #[test]
    fn test_validate_reports_every_field() {
        let dto = BatchEventDto {
            event_type: Some(" ".into()),
            timestamp: Some("2024-13-01".into()),
            ..Default::default()
        };
        let err = dto.validate().unwrap_err();
        for field in ["event_type", "description", "timestamp", "location"] {
            assert!(err.has_field(field), "missing {field}");
        }
        assert!(!err.has_field("batch_id"));
    }
}
