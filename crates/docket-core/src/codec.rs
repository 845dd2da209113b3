//! Encoding between [`Value`] and backend-storable primitives.
//!
//! Scalars map to native SQL types. Temporal values are stored as canonical
//! ISO text. Lists are stored as canonical JSON arrays whose elements are the
//! scalar encodings, so encoded-text equality coincides with list equality
//! and every legal value round-trips exactly.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::SemanticType;
use crate::value::Value;

/// Text format for stored dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Text format for stored times (microseconds always written).
pub const TIME_FORMAT: &str = "%H:%M:%S%.6f";
/// Text format for stored datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const TIME_PARSE_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A value in the shape the relational backend can store directly.
///
/// This keeps the codec free of any database crate; the storage layer maps
/// these onto its own parameter types.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Error raised when a stored primitive cannot be decoded as the column's
/// declared type.
#[derive(Debug, thiserror::Error)]
#[error("stored value is not a valid {expected}: {detail}")]
pub struct DecodeError {
    pub expected: SemanticType,
    pub detail: String,
}

impl DecodeError {
    fn new(expected: SemanticType, detail: impl Into<String>) -> Self {
        Self {
            expected,
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes a value into its storable primitive form.
pub fn encode(value: &Value) -> StoredValue {
    match value {
        Value::Null => StoredValue::Null,
        Value::Boolean(b) => StoredValue::Integer(i64::from(*b)),
        Value::Integer(i) => StoredValue::Integer(*i),
        Value::Float(f) => StoredValue::Real(*f),
        Value::String(s) => StoredValue::Text(s.clone()),
        Value::Date(d) => StoredValue::Text(format_date(d)),
        Value::Time(t) => StoredValue::Text(format_time(t)),
        Value::DateTime(dt) => StoredValue::Text(format_datetime(dt)),
        Value::ListBoolean(items) => {
            json_array(items.iter().map(|b| serde_json::Value::Bool(*b)))
        }
        Value::ListInteger(items) => {
            json_array(items.iter().map(|i| serde_json::Value::from(*i)))
        }
        Value::ListFloat(items) => json_array(items.iter().map(|f| {
            serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null)
        })),
        Value::ListString(items) => {
            json_array(items.iter().map(|s| serde_json::Value::String(s.clone())))
        }
        Value::ListDate(items) => {
            json_array(items.iter().map(|d| serde_json::Value::String(format_date(d))))
        }
        Value::ListTime(items) => {
            json_array(items.iter().map(|t| serde_json::Value::String(format_time(t))))
        }
        Value::ListDateTime(items) => json_array(
            items
                .iter()
                .map(|dt| serde_json::Value::String(format_datetime(dt))),
        ),
    }
}

fn json_array(items: impl Iterator<Item = serde_json::Value>) -> StoredValue {
    StoredValue::Text(serde_json::Value::Array(items.collect()).to_string())
}

pub(crate) fn format_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_time(t: &NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes a stored primitive back into the canonical in-memory value.
///
/// Decoding a null yields [`Value::Null`] regardless of the column type.
pub fn decode(stored: &StoredValue, ty: SemanticType) -> Result<Value, DecodeError> {
    let malformed = |detail: String| DecodeError::new(ty, detail);

    match (stored, ty) {
        (StoredValue::Null, _) => Ok(Value::Null),
        (StoredValue::Integer(i), SemanticType::Boolean) => Ok(Value::Boolean(*i != 0)),
        (StoredValue::Integer(i), SemanticType::Integer) => Ok(Value::Integer(*i)),
        (StoredValue::Real(f), SemanticType::Float) => Ok(Value::Float(*f)),
        (StoredValue::Integer(i), SemanticType::Float) => Ok(Value::Float(*i as f64)),
        (StoredValue::Text(s), SemanticType::String) => Ok(Value::String(s.clone())),
        (StoredValue::Text(s), SemanticType::Date) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| malformed(e.to_string())),
        (StoredValue::Text(s), SemanticType::Time) => {
            NaiveTime::parse_from_str(s, TIME_PARSE_FORMAT)
                .map(Value::Time)
                .map_err(|e| malformed(e.to_string()))
        }
        (StoredValue::Text(s), SemanticType::DateTime) => {
            NaiveDateTime::parse_from_str(s, DATETIME_PARSE_FORMAT)
                .map(Value::DateTime)
                .map_err(|e| malformed(e.to_string()))
        }
        (StoredValue::Text(s), SemanticType::ListBoolean) => {
            serde_json::from_str::<Vec<bool>>(s)
                .map(Value::ListBoolean)
                .map_err(|e| malformed(e.to_string()))
        }
        (StoredValue::Text(s), SemanticType::ListInteger) => {
            serde_json::from_str::<Vec<i64>>(s)
                .map(Value::ListInteger)
                .map_err(|e| malformed(e.to_string()))
        }
        (StoredValue::Text(s), SemanticType::ListFloat) => serde_json::from_str::<Vec<f64>>(s)
            .map(Value::ListFloat)
            .map_err(|e| malformed(e.to_string())),
        (StoredValue::Text(s), SemanticType::ListString) => {
            serde_json::from_str::<Vec<String>>(s)
                .map(Value::ListString)
                .map_err(|e| malformed(e.to_string()))
        }
        (StoredValue::Text(s), SemanticType::ListDate) => {
            decode_text_list(s, ty, |item| NaiveDate::parse_from_str(item, DATE_FORMAT))
                .map(Value::ListDate)
        }
        (StoredValue::Text(s), SemanticType::ListTime) => {
            decode_text_list(s, ty, |item| {
                NaiveTime::parse_from_str(item, TIME_PARSE_FORMAT)
            })
            .map(Value::ListTime)
        }
        (StoredValue::Text(s), SemanticType::ListDateTime) => {
            decode_text_list(s, ty, |item| {
                NaiveDateTime::parse_from_str(item, DATETIME_PARSE_FORMAT)
            })
            .map(Value::ListDateTime)
        }
        (other, _) => Err(malformed(format!("unexpected primitive {other:?}"))),
    }
}

fn decode_text_list<T>(
    s: &str,
    ty: SemanticType,
    parse: impl Fn(&str) -> chrono::ParseResult<T>,
) -> Result<Vec<T>, DecodeError> {
    let items: Vec<String> =
        serde_json::from_str(s).map_err(|e| DecodeError::new(ty, e.to_string()))?;
    items
        .iter()
        .map(|item| parse(item).map_err(|e| DecodeError::new(ty, e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(value: Value, ty: SemanticType) {
        let stored = encode(&value);
        let back = decode(&stored, ty).unwrap();
        assert_eq!(back, value, "round trip through {stored:?}");
    }

    #[test]
    fn scalars_round_trip() {
        round_trip(Value::Boolean(true), SemanticType::Boolean);
        round_trip(Value::Integer(-45), SemanticType::Integer);
        round_trip(Value::Float(0.234375), SemanticType::Float);
        round_trip(Value::from("Guerbet"), SemanticType::String);
        round_trip(Value::Null, SemanticType::Integer);
    }

    #[test]
    fn temporals_round_trip_at_all_resolutions() {
        round_trip(
            Value::Date(NaiveDate::from_ymd_opt(1899, 12, 31).unwrap()),
            SemanticType::Date,
        );
        round_trip(
            Value::Time(NaiveTime::from_hms_micro_opt(12, 41, 33, 540).unwrap()),
            SemanticType::Time,
        );
        round_trip(
            Value::Time(NaiveTime::from_hms_opt(1, 2, 3).unwrap()),
            SemanticType::Time,
        );
        round_trip(
            Value::DateTime(
                NaiveDate::from_ymd_opt(2018, 5, 23)
                    .unwrap()
                    .and_hms_micro_opt(12, 41, 33, 540)
                    .unwrap(),
            ),
            SemanticType::DateTime,
        );
    }

    #[test]
    fn lists_round_trip() {
        round_trip(
            Value::ListInteger(vec![3, 28, 28, 3]),
            SemanticType::ListInteger,
        );
        round_trip(
            Value::ListFloat(vec![0.234375, 0.234375, 0.4]),
            SemanticType::ListFloat,
        );
        round_trip(
            Value::ListBoolean(vec![true, false]),
            SemanticType::ListBoolean,
        );
        round_trip(Value::ListString(vec![]), SemanticType::ListString);
        round_trip(
            Value::ListDate(vec![
                NaiveDate::from_ymd_opt(2018, 5, 23).unwrap(),
                NaiveDate::from_ymd_opt(1899, 12, 31).unwrap(),
            ]),
            SemanticType::ListDate,
        );
    }

    #[test]
    fn hostile_strings_round_trip() {
        // Empty strings, embedded separators and quotes must survive the
        // list encoding unchanged.
        round_trip(
            Value::from(vec!["", ",", "\"quoted\"", "a\nb", "[1,2]"]),
            SemanticType::ListString,
        );
    }

    #[test]
    fn canonical_encoding_makes_equality_textual() {
        let a = encode(&Value::ListString(vec!["b".into(), "c".into(), "d".into()]));
        let b = encode(&Value::from(vec!["b", "c", "d"]));
        assert_eq!(a, b);
    }

    #[test]
    fn time_encoding_pads_microseconds() {
        let stored = encode(&Value::Time(
            NaiveTime::from_hms_micro_opt(12, 41, 33, 540).unwrap(),
        ));
        assert_eq!(stored, StoredValue::Text("12:41:33.000540".into()));
    }

    #[test]
    fn garbage_text_fails_to_decode() {
        let err = decode(
            &StoredValue::Text("not json".into()),
            SemanticType::ListInteger,
        )
        .unwrap_err();
        assert_eq!(err.expected, SemanticType::ListInteger);
    }
}
