//! Date-time text handling shared by the synthesized and the static decode paths.
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};

pub type DateTimeValue = DateTime<FixedOffset>;

/// Accepts RFC 3339, an offset-less `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC)
/// or a bare `YYYY-MM-DD`.
pub fn parse(text: &str) -> Result<DateTimeValue, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|day| day.and_time(NaiveTime::default()).and_utc().fixed_offset())
        })
}

pub fn format(value: &DateTimeValue) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// `#[serde(with = "crate::date::text")]` for statically declared fields.
pub mod text {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::DateTimeValue;

    pub fn serialize<S: Serializer>(value: &DateTimeValue, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTimeValue, D::Error> {
        let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        super::parse(&raw).map_err(|err| de::Error::custom(format_args!("invalid date-time {raw:?}: {err}")))
    }
}
