use serde_json::{Map, Value};

/// A fixture row: field name to JSON value, shape unknown to the seeder.
pub type Record = Map<String, Value>;

/// Read an integer column, accepting numbers and numeric strings.
pub fn record_i64(record: &Record, column: &str) -> Option<i64> {
    match record.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a string column.
pub fn record_str<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record.get(column).and_then(Value::as_str)
}
