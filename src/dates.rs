//! Date normalization.
//!
//! The backend serializes timestamps either as ISO-8601 strings or as
//! component arrays `[year, month, day, hour?, minute?, second?, nanos?]`
//! with a 1-indexed month. Everything in memory is a `PrimitiveDateTime`
//! (date-only values sit at midnight). Unrecognized input normalizes to
//! `None` so callers can render a placeholder.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Normalize a JSON date value in either wire form.
pub fn normalize(value: &Value) -> Option<PrimitiveDateTime> {
    match value {
        Value::String(s) => parse_iso(s),
        Value::Array(parts) => from_components(parts),
        _ => None,
    }
}

/// Parse an ISO-8601 string: RFC 3339 with offset (converted to UTC), a
/// local date-time with optional seconds/fraction, or a bare date.
pub fn parse_iso(input: &str) -> Option<PrimitiveDateTime> {
    let s = input.trim();

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        let utc = dt.to_offset(UtcOffset::UTC);
        return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
    }

    let with_fraction =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let with_minutes = format_description!("[year]-[month]-[day]T[hour]:[minute]");

    for description in [with_fraction, with_seconds, with_minutes] {
        if let Ok(dt) = PrimitiveDateTime::parse(s, description) {
            return Some(dt);
        }
    }

    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight())
}

fn component(parts: &[Value], index: usize) -> Option<i64> {
    match parts.get(index) {
        Some(value) => value.as_i64(),
        None => Some(0),
    }
}

fn from_components(parts: &[Value]) -> Option<PrimitiveDateTime> {
    if parts.len() < 3 || parts.len() > 7 {
        return None;
    }

    let year = i32::try_from(parts[0].as_i64()?).ok()?;
    // Month arrives 1-indexed
    let month = Month::try_from(u8::try_from(parts[1].as_i64()?).ok()?).ok()?;
    let day = u8::try_from(parts[2].as_i64()?).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;

    let hour = u8::try_from(component(parts, 3)?).ok()?;
    let minute = u8::try_from(component(parts, 4)?).ok()?;
    let second = u8::try_from(component(parts, 5)?).ok()?;
    let nanos = u32::try_from(component(parts, 6)?).ok()?;
    let time = Time::from_hms_nano(hour, minute, second, nanos).ok()?;

    Some(PrimitiveDateTime::new(date, time))
}

/// Canonical ISO string for a normalized value. Fractional seconds appear
/// only when non-zero, trimmed of trailing zeros.
pub fn format_iso(dt: PrimitiveDateTime) -> String {
    let formatted = if dt.nanosecond() == 0 {
        dt.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
    } else {
        dt.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
        ))
    };

    formatted.unwrap_or_else(|e| {
        tracing::warn!("Failed to format {}: {}", dt, e);
        dt.to_string()
    })
}

/// Calendar date as `YYYY-MM-DD`
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to format {}: {}", date, e);
            date.to_string()
        })
}

/// Wire value for a normalized date; `normalize(&to_wire(dt)) == Some(dt)`.
pub fn to_wire(dt: PrimitiveDateTime) -> Value {
    Value::String(format_iso(dt))
}

/// Month as a 0-based index (January = 0).
pub fn zero_based_month(dt: PrimitiveDateTime) -> u8 {
    u8::from(dt.month()) - 1
}

/// Serde adapter for optional date fields on wire entities.
///
/// Reads either wire form, mapping malformed values to `None`; writes ISO
/// strings.
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use time::PrimitiveDateTime;

    pub fn serialize<S>(value: &Option<PrimitiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&super::format_iso(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PrimitiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(super::normalize))
    }
}

/// How the backend encodes dates on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `[2024, 3, 15, 10, 30]`
    #[default]
    Array,
    /// `"2024-03-15T10:30:00"`
    Iso,
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "array" => Ok(Self::Array),
            "iso" => Ok(Self::Iso),
            other => Err(format!("unknown date format: {}", other)),
        }
    }
}

/// A date as emitted by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WireDate {
    Array(Vec<i64>),
    Iso(String),
}

impl DateFormat {
    /// Encode a timestamp. Trailing zero seconds/nanos are dropped from the
    /// array form, matching what Jackson emits for `LocalDateTime`.
    pub fn datetime(&self, dt: PrimitiveDateTime) -> WireDate {
        match self {
            DateFormat::Iso => WireDate::Iso(format_iso(dt)),
            DateFormat::Array => {
                let mut parts = vec![
                    i64::from(dt.year()),
                    i64::from(u8::from(dt.month())),
                    i64::from(dt.day()),
                    i64::from(dt.hour()),
                    i64::from(dt.minute()),
                ];
                if dt.second() != 0 || dt.nanosecond() != 0 {
                    parts.push(i64::from(dt.second()));
                }
                if dt.nanosecond() != 0 {
                    parts.push(i64::from(dt.nanosecond()));
                }
                WireDate::Array(parts)
            }
        }
    }

    /// Encode a calendar date
    pub fn date(&self, date: Date) -> WireDate {
        match self {
            DateFormat::Iso => WireDate::Iso(format_date(date)),
            DateFormat::Array => WireDate::Array(vec![
                i64::from(date.year()),
                i64::from(u8::from(date.month())),
                i64::from(date.day()),
            ]),
        }
    }
}
