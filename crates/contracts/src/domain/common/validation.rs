//! Presence and type checks for incoming create requests

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Wire format of calendar dates (`harvest_date`, event `timestamp`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One offending field of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// A create request was rejected; lists every offending field, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, e) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} {}", sep, e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error, used by the boundary for fields it checks itself.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|e| e.field == field)
    }

    /// Ok when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Required free-text field, taken from the raw JSON value.
    /// Whitespace-only counts as empty. The value is stored as given, only
    /// presence is checked on the trimmed form.
    pub fn required_text(&mut self, field: &str, value: Option<&Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => {
                self.push(field, "is required");
                None
            }
            Some(Value::String(v)) if v.trim().is_empty() => {
                self.push(field, "must not be empty");
                None
            }
            Some(Value::String(v)) => Some(v.clone()),
            Some(other) => {
                self.push(field, format!("must be a string, got {}", json_kind(other)));
                None
            }
        }
    }

    /// Required ISO calendar date (`YYYY-MM-DD`).
    pub fn required_date(&mut self, field: &str, value: Option<&Value>) -> Option<NaiveDate> {
        let raw = self.required_text(field, value)?;
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                self.push(field, format!("'{}' is not a calendar date (YYYY-MM-DD)", raw));
                None
            }
        }
    }
}

/// Name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
