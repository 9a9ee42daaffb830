use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::model::Record;
use crate::seed::dates::{add_days_to_date, is_date_key, local_date, parse_seed_date};
use crate::seed::error::SeedError;

/// How far back the earliest fixture date lands when no shift is given
pub const DEFAULT_ANCHOR_DAYS_AGO: i64 = 90;

/// Earliest parseable date across every date-keyed string in `records`.
pub fn earliest_seed_date<'a, I>(records: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut earliest: Option<DateTime<Utc>> = None;
    for record in records {
        visit_record(record, &mut earliest);
    }
    earliest
}

fn visit_record(record: &Record, earliest: &mut Option<DateTime<Utc>>) {
    for (key, value) in record {
        match value {
            Value::String(raw) if is_date_key(key) => {
                if let Some(date) = parse_seed_date(raw) {
                    if earliest.map_or(true, |current| date < current) {
                        *earliest = Some(date);
                    }
                }
            }
            other => visit_value(other, earliest),
        }
    }
}

fn visit_value(value: &Value, earliest: &mut Option<DateTime<Utc>>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| visit_value(item, earliest)),
        Value::Object(map) => visit_record(map, earliest),
        _ => {}
    }
}

/// Decide how many days to shift fixture dates by.
///
/// An explicit value always wins, zero included. Otherwise the earliest
/// fixture date is moved to `today - anchor_days_ago`; with no dates at all
/// nothing moves. An anchor that falls off the calendar is an error.
pub fn resolve_delta_days<'a, I>(
    explicit: Option<i64>,
    anchor_days_ago: Option<i64>,
    today: NaiveDate,
    records: I,
) -> Result<i64, SeedError>
where
    I: IntoIterator<Item = &'a Record>,
{
    if let Some(delta_days) = explicit {
        return Ok(delta_days);
    }

    let Some(earliest) = earliest_seed_date(records) else {
        return Ok(0);
    };

    let anchor_days_ago = anchor_days_ago.unwrap_or(DEFAULT_ANCHOR_DAYS_AGO);
    let anchor = anchor_days_ago
        .checked_neg()
        .and_then(|days| add_days_to_date(today, days))
        .ok_or(SeedError::AnchorOutOfRange(anchor_days_ago))?;

    Ok(anchor
        .signed_duration_since(local_date(&earliest))
        .num_days())
}
