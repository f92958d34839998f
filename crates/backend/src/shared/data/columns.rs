//! Text encodings of typed values in SQLite columns.
//!
//! Both encodings are fixed-width so that `ORDER BY` on the raw text gives
//! chronological order.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use contracts::domain::common::validation::DATE_FORMAT;
use contracts::domain::common::Identifier;

pub fn date_to_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn text_to_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| format!("bad date '{text}': {e}"))
}

/// RFC 3339 in UTC with all nine fractional digits.
pub fn instant_to_text(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn text_to_instant(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{text}': {e}"))
}

pub fn text_to_identifier(text: &str) -> Result<Identifier, String> {
    Identifier::parse(text).map_err(|e| e.to_string())
}
