use chrono::{DateTime, Datelike, NaiveDateTime, ParseError, Utc};

/// Text layout of every timestamp column.
///
/// Matches `strftime('%Y-%m-%dT%H:%M:%SZ', 'now')` on the SQL side so that
/// stored values written by either side compare correctly as plain text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Whether `ts` formats as a four-digit year.
///
/// Outside years 0 to 9999 chrono adds a sign to the year and the text no
/// longer sorts in time order.
pub fn is_storable(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Empty string stands for "unset".
pub fn format_optional_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(format_timestamp).unwrap_or_default()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

pub fn parse_optional_timestamp(value: &str) -> Result<Option<DateTime<Utc>>, ParseError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_timestamp(value).map(Some)
}
