//! Tagged field values and the fixed coercion table.
//!
//! Every value that crosses a generic seam (filter maps, identity tuples,
//! patch bags, query strings) is carried as a [`FieldValue`], a closed sum
//! type over the kinds the toolkit understands. Coercion between kinds is
//! deliberately a fixed table: integers widen and parse, decimal parses,
//! date/time kinds parse from text, and everything else falls back to
//! plain value equality.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::SchemaError;

/// Declared kind of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    I16,
    I32,
    I64,
    Decimal,
    Text,
    Uuid,
    Date,
    Time,
    DateTime,
    Duration,
}

/// A tagged value for one entity field.
///
/// `Null` stands in for absent optionals; it compares equal only to itself.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    Decimal(Decimal),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Duration(Duration),
}

impl FieldValue {
    /// Kind of this value, or `None` for `Null`.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldKind::Bool),
            FieldValue::I16(_) => Some(FieldKind::I16),
            FieldValue::I32(_) => Some(FieldKind::I32),
            FieldValue::I64(_) => Some(FieldKind::I64),
            FieldValue::Decimal(_) => Some(FieldKind::Decimal),
            FieldValue::Text(_) => Some(FieldKind::Text),
            FieldValue::Uuid(_) => Some(FieldKind::Uuid),
            FieldValue::Date(_) => Some(FieldKind::Date),
            FieldValue::Time(_) => Some(FieldKind::Time),
            FieldValue::DateTime(_) => Some(FieldKind::DateTime),
            FieldValue::Duration(_) => Some(FieldKind::Duration),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Build a value from an untyped JSON value (patch bags, wire input).
    ///
    /// Integral JSON numbers become `I64`, fractional ones `Decimal`.
    /// Arrays and objects are carried as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> FieldValue {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Decimal(Decimal::from(u))
                } else if let Some(f) = n.as_f64() {
                    Decimal::from_f64(f)
                        .map(FieldValue::Decimal)
                        .unwrap_or(FieldValue::Null)
                } else {
                    FieldValue::Null
                }
            }
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Coerce this value to the given kind through the fixed type table.
    ///
    /// `Null` passes through unchanged. A value already of the target kind
    /// is returned as-is. Anything the table does not cover is an error.
    pub fn coerce(self, kind: FieldKind) -> Result<FieldValue, SchemaError> {
        if self.is_null() || self.kind() == Some(kind) {
            return Ok(self);
        }
        let rejected = |value: &FieldValue| SchemaError::Coerce {
            kind,
            value: value.to_string(),
        };
        match kind {
            FieldKind::I16 => match &self {
                FieldValue::I32(v) => i16::try_from(*v).map(FieldValue::I16).map_err(|_| rejected(&self)),
                FieldValue::I64(v) => i16::try_from(*v).map(FieldValue::I16).map_err(|_| rejected(&self)),
                FieldValue::Text(s) => s.trim().parse::<i16>().map(FieldValue::I16).map_err(|_| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::I32 => match &self {
                FieldValue::I16(v) => Ok(FieldValue::I32(i32::from(*v))),
                FieldValue::I64(v) => i32::try_from(*v).map(FieldValue::I32).map_err(|_| rejected(&self)),
                FieldValue::Text(s) => s.trim().parse::<i32>().map(FieldValue::I32).map_err(|_| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::I64 => match &self {
                FieldValue::I16(v) => Ok(FieldValue::I64(i64::from(*v))),
                FieldValue::I32(v) => Ok(FieldValue::I64(i64::from(*v))),
                FieldValue::Text(s) => s.trim().parse::<i64>().map(FieldValue::I64).map_err(|_| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::Decimal => match &self {
                FieldValue::I16(v) => Ok(FieldValue::Decimal(Decimal::from(*v))),
                FieldValue::I32(v) => Ok(FieldValue::Decimal(Decimal::from(*v))),
                FieldValue::I64(v) => Ok(FieldValue::Decimal(Decimal::from(*v))),
                FieldValue::Text(s) => s.trim().parse::<Decimal>().map(FieldValue::Decimal).map_err(|_| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::Date => match &self {
                FieldValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(FieldValue::Date)
                    .map_err(|_| rejected(&self)),
                FieldValue::DateTime(dt) => Ok(FieldValue::Date(dt.date_naive())),
                _ => Err(rejected(&self)),
            },
            FieldKind::Time => match &self {
                FieldValue::Text(s) => parse_time(s.trim()).map(FieldValue::Time).ok_or_else(|| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::DateTime => match &self {
                FieldValue::Text(s) => parse_datetime(s.trim()).map(FieldValue::DateTime).ok_or_else(|| rejected(&self)),
                FieldValue::Date(d) => Ok(FieldValue::DateTime(
                    d.and_time(NaiveTime::MIN).and_utc(),
                )),
                _ => Err(rejected(&self)),
            },
            FieldKind::Duration => match &self {
                FieldValue::Text(s) => parse_duration(s.trim()).map(FieldValue::Duration).ok_or_else(|| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::Uuid => match &self {
                FieldValue::Text(s) => Uuid::parse_str(s.trim()).map(FieldValue::Uuid).map_err(|_| rejected(&self)),
                _ => Err(rejected(&self)),
            },
            FieldKind::Text => Ok(FieldValue::Text(self.to_string())),
            FieldKind::Bool => match &self {
                FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(FieldValue::Bool(true)),
                    "false" | "0" => Ok(FieldValue::Bool(false)),
                    _ => Err(rejected(&self)),
                },
                _ => Err(rejected(&self)),
            },
        }
    }

    /// Total-enough ordering for multi-key sorts.
    ///
    /// `Null` sorts before everything; numeric kinds compare across widths;
    /// unrelated kinds compare equal so later sort keys can break the tie.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Uuid(a), Uuid(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Time(a), Time(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (Duration(a), Duration(b)) => a.cmp(b),
            (a, b) => match (a.as_decimal(), b.as_decimal()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::I16(v) => Some(Decimal::from(*v)),
            FieldValue::I32(v) => Some(Decimal::from(*v)),
            FieldValue::I64(v) => Some(Decimal::from(*v)),
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::I32(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v}"),
            FieldValue::Uuid(v) => write!(f, "{v}"),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            FieldValue::Time(v) => write!(f, "{}", v.format("%H:%M:%S")),
            FieldValue::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            FieldValue::Duration(v) => write!(f, "{}ms", v.num_milliseconds()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self {
        FieldValue::I16(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::I32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::I64(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Uuid(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(v: NaiveTime) -> Self {
        FieldValue::Time(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::DateTime(v)
    }
}

impl From<Duration> for FieldValue {
    fn from(v: Duration) -> Self {
        FieldValue::Duration(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse `[-]HH:MM[:SS[.fff]]` or a bare integer of seconds.
fn parse_duration(s: &str) -> Option<Duration> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let total = if body.contains(':') {
        let mut parts = body.split(':');
        let hours: i64 = parts.next()?.parse().ok()?;
        let minutes: i64 = parts.next()?.parse().ok()?;
        let (seconds, millis) = match parts.next() {
            Some(sec) => {
                let mut halves = sec.splitn(2, '.');
                let whole: i64 = halves.next()?.parse().ok()?;
                let frac = match halves.next() {
                    Some(frac) => {
                        let padded = format!("{frac:0<3}");
                        padded.get(..3)?.parse::<i64>().ok()?
                    }
                    None => 0,
                };
                (whole, frac)
            }
            None => (0, 0),
        };
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }
        Duration::try_hours(hours)?
            + Duration::try_minutes(minutes)?
            + Duration::try_seconds(seconds)?
            + Duration::try_milliseconds(millis)?
    } else {
        Duration::try_seconds(body.parse().ok()?)?
    };
    Some(if negative { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn coerce_is_identity_for_matching_kind() {
        let v = FieldValue::I32(7);
        assert_eq!(v.clone().coerce(FieldKind::I32).unwrap(), v);
    }

    #[test]
    fn null_passes_through_any_kind() {
        for kind in [FieldKind::I64, FieldKind::Date, FieldKind::Uuid] {
            assert_eq!(FieldValue::Null.coerce(kind).unwrap(), FieldValue::Null);
        }
    }

    #[test]
    fn integers_widen_and_narrow_checked() {
        assert_eq!(
            FieldValue::I16(42).coerce(FieldKind::I64).unwrap(),
            FieldValue::I64(42)
        );
        assert_eq!(
            FieldValue::I64(42).coerce(FieldKind::I16).unwrap(),
            FieldValue::I16(42)
        );
        assert!(FieldValue::I64(1 << 40).coerce(FieldKind::I16).is_err());
    }

    #[test]
    fn text_parses_into_value_kinds() {
        assert_eq!(
            FieldValue::Text("123".into()).coerce(FieldKind::I32).unwrap(),
            FieldValue::I32(123)
        );
        assert_eq!(
            FieldValue::Text("12.50".into()).coerce(FieldKind::Decimal).unwrap(),
            FieldValue::Decimal("12.50".parse().unwrap())
        );
        assert_eq!(
            FieldValue::Text("2024-03-01".into()).coerce(FieldKind::Date).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            FieldValue::Text("01:30:00".into()).coerce(FieldKind::Duration).unwrap(),
            FieldValue::Duration(Duration::try_minutes(90).unwrap())
        );
        assert!(FieldValue::Text("not a number".into())
            .coerce(FieldKind::I64)
            .is_err());
    }

    #[test]
    fn datetime_parses_rfc3339_and_naive() {
        let v = FieldValue::Text("2024-03-01T10:00:00Z".into())
            .coerce(FieldKind::DateTime)
            .unwrap();
        let FieldValue::DateTime(dt) = v else {
            panic!("expected datetime");
        };
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        assert!(FieldValue::Text("2024-03-01 10:00:00".into())
            .coerce(FieldKind::DateTime)
            .is_ok());
    }

    #[test]
    fn uuid_parses_from_text() {
        let id = Uuid::now_v7();
        assert_eq!(
            FieldValue::Text(id.to_string()).coerce(FieldKind::Uuid).unwrap(),
            FieldValue::Uuid(id)
        );
    }

    #[test]
    fn cross_width_numeric_compare() {
        assert_eq!(
            FieldValue::I16(2).compare(&FieldValue::I64(10)),
            Ordering::Less
        );
        assert_eq!(
            FieldValue::Decimal(Decimal::from(10)).compare(&FieldValue::I32(10)),
            Ordering::Equal
        );
    }

    #[test]
    fn null_sorts_first() {
        assert_eq!(
            FieldValue::Null.compare(&FieldValue::I64(i64::MIN)),
            Ordering::Less
        );
    }

    #[test]
    fn from_json_maps_numbers() {
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(5)),
            FieldValue::I64(5)
        );
        assert_eq!(
            FieldValue::from_json(&serde_json::json!("alice")),
            FieldValue::Text("alice".into())
        );
        assert!(matches!(
            FieldValue::from_json(&serde_json::json!(1.25)),
            FieldValue::Decimal(_)
        ));
    }

    proptest! {
        #[test]
        fn i64_text_roundtrip(v in any::<i64>()) {
            let coerced = FieldValue::Text(v.to_string()).coerce(FieldKind::I64).unwrap();
            prop_assert_eq!(coerced, FieldValue::I64(v));
        }

        #[test]
        fn i16_narrowing_never_wraps(v in any::<i64>()) {
            match FieldValue::I64(v).coerce(FieldKind::I16) {
                Ok(FieldValue::I16(n)) => prop_assert_eq!(i64::from(n), v),
                Ok(other) => prop_assert!(false, "unexpected value {:?}", other),
                Err(_) => prop_assert!(v < i64::from(i16::MIN) || v > i64::from(i16::MAX)),
            }
        }
    }
}
