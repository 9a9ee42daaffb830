use chrono::{
    DateTime, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

use crate::model::Record;

/// Timestamp layouts without an offset, read as local wall-clock time
const LOCAL_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// Fixture convention: any key ending in "date" (any case) holds a timestamp.
pub fn is_date_key(key: &str) -> bool {
    key.get(key.len().saturating_sub(4)..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case("date"))
}

/// Parse a fixture timestamp.
///
/// Accepts ISO-8601 (with or without offset), SQL-style `YYYY-MM-DD HH:mm:ss`,
/// plain `YYYY-MM-DD` and the short forms `YYYY-MM`, `YYYYMMDD` and
/// `YYYY-MM-DDTHH`. Values without an offset are local time. Returns `None`
/// for anything that is not a real calendar date/time.
pub fn parse_seed_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    let normalized: Cow<'_, str> = if raw.contains('T') {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(raw.replacen(' ', "T", 1))
    };

    let completed = complete_short_form(&normalized);
    let s = completed.as_deref().unwrap_or(&*normalized);

    parse_with_offset(s)
        .or_else(|| parse_local_timestamp(s))
        .or_else(|| parse_date_only(s))
}

/// Spell out the short ISO forms: `2024-01` is the first of the month,
/// `20240105` the basic date form, `2024-01-05T10` on the hour.
fn complete_short_form(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

    match bytes.len() {
        7 if bytes[4] == b'-' && digits(0..4) && digits(5..7) => Some(format!("{}-01", s)),
        8 if digits(0..8) => Some(format!("{}-{}-{}", &s[0..4], &s[4..6], &s[6..8])),
        13 if bytes[10] == b'T' && digits(11..13) => Some(format!("{}:00", s)),
        _ => None,
    }
}

fn parse_with_offset(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_local_timestamp(s: &str) -> Option<DateTime<Utc>> {
    LOCAL_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .and_then(from_local)
}

fn parse_date_only(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, DATE_ONLY_FORMAT)
        .ok()
        .and_then(|date| from_local(date.and_time(NaiveTime::MIN)))
}

fn from_local(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn shift_naive(naive: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    if days >= 0 {
        naive.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        naive.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Add whole calendar days, keeping the local wall-clock time.
pub fn add_days(instant: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    let local = instant.with_timezone(&Local).naive_local();
    let shifted = shift_naive(local, days)?;
    from_local(shifted).or_else(|| {
        // Landed in a DST gap; fall back to exact 24h steps.
        shift_naive(instant.naive_utc(), days).map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Shift a calendar date by whole days.
pub fn add_days_to_date(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Local midnight of the given calendar date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    from_local(midnight).unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Calendar date of an instant in local time.
pub fn local_date(instant: &DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Today's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`
pub fn format_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A date that parsed but cannot be moved that far
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot shift {raw:?} by {delta_days} days: outside the supported calendar range")]
pub struct ShiftOutOfRange {
    pub raw: String,
    pub delta_days: i64,
}

/// Shifts every date-keyed string in an untyped JSON tree by a fixed number
/// of days. Input is never mutated; the result is a structural copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateShifter {
    delta_days: i64,
}

impl DateShifter {
    pub fn new(delta_days: i64) -> Self {
        Self { delta_days }
    }

    pub fn shift_value(&self, value: &Value) -> Result<Value, ShiftOutOfRange> {
        Ok(match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| self.shift_value(v))
                    .collect::<Result<Vec<_>, ShiftOutOfRange>>()?,
            ),
            Value::Object(map) => Value::Object(self.shift_record(map)?),
            scalar => scalar.clone(),
        })
    }

    pub fn shift_record(&self, record: &Record) -> Result<Record, ShiftOutOfRange> {
        record
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.shift_entry(key, value)?)))
            .collect()
    }

    pub fn shift_records(&self, records: &[Record]) -> Result<Vec<Record>, ShiftOutOfRange> {
        records.iter().map(|record| self.shift_record(record)).collect()
    }

    /// Shifted ISO string. Input that is not a parseable date comes back as is.
    pub fn shift_str(&self, raw: &str) -> Result<String, ShiftOutOfRange> {
        let Some(parsed) = parse_seed_date(raw) else {
            return Ok(raw.to_string());
        };
        add_days(parsed, self.delta_days)
            .map(|shifted| format_iso(&shifted))
            .ok_or_else(|| ShiftOutOfRange {
                raw: raw.to_string(),
                delta_days: self.delta_days,
            })
    }

    fn shift_entry(&self, key: &str, value: &Value) -> Result<Value, ShiftOutOfRange> {
        match value {
            Value::String(raw) if is_date_key(key) => Ok(Value::String(self.shift_str(raw)?)),
            // Non-string values under a date key are walked like any other
            other => self.shift_value(other),
        }
    }
}

pub fn shift_dates_deep(value: &Value, delta_days: i64) -> Result<Value, ShiftOutOfRange> {
    DateShifter::new(delta_days).shift_value(value)
}
