//! `xs:dateTime` values used by the file and content headers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const PARSE_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);

const WRITE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("'{value}' is not a valid xs:dateTime")]
pub struct InvalidTimestamp {
    pub value: String,
}

/// A date and time with an optional zone. A zero offset is written as `Z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub datetime: PrimitiveDateTime,
    pub offset: Option<UtcOffset>,
}

impl Timestamp {
    pub fn new(datetime: PrimitiveDateTime, offset: Option<UtcOffset>) -> Self {
        Self { datetime, offset }
    }

    /// The current time in UTC, to whole seconds.
    pub fn now_utc() -> Self {
        let now = OffsetDateTime::now_utc();
        let now = now.replace_nanosecond(0).unwrap_or(now);
        Self {
            datetime: PrimitiveDateTime::new(now.date(), now.time()),
            offset: Some(UtcOffset::UTC),
        }
    }
}

fn split_offset(value: &str) -> Result<(&str, Option<UtcOffset>), InvalidTimestamp> {
    let invalid = || InvalidTimestamp {
        value: value.to_string(),
    };

    if let Some(rest) = value.strip_suffix('Z') {
        return Ok((rest, Some(UtcOffset::UTC)));
    }

    let split = match value.len().checked_sub(6) {
        Some(split) => split,
        None => return Ok((value, None)),
    };
    let (rest, zone) = match (value.get(..split), value.get(split..)) {
        (Some(rest), Some(zone)) => (rest, zone),
        _ => return Ok((value, None)),
    };

    let sign: i8 = match zone.as_bytes() {
        [b'+', _, _, b':', _, _] => 1,
        [b'-', _, _, b':', _, _] => -1,
        _ => return Ok((value, None)),
    };
    let hours: i8 = zone.get(1..3).and_then(|h| h.parse().ok()).ok_or_else(invalid)?;
    let minutes: i8 = zone.get(4..6).and_then(|m| m.parse().ok()).ok_or_else(invalid)?;
    let offset = UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())?;

    Ok((rest, Some(offset)))
}

impl FromStr for Timestamp {
    type Err = InvalidTimestamp;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (datetime, offset) = split_offset(value)?;
        let datetime =
            PrimitiveDateTime::parse(datetime, PARSE_FORMAT).map_err(|_| InvalidTimestamp {
                value: value.to_string(),
            })?;
        Ok(Self { datetime, offset })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.datetime.format(WRITE_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&base)?;

        let nanos = self.datetime.nanosecond();
        if nanos != 0 {
            let fraction = format!("{:09}", nanos);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }

        match self.offset {
            None => Ok(()),
            Some(offset) if offset.is_utc() => f.write_str("Z"),
            Some(offset) => {
                let (hours, minutes, _) = offset.as_hms();
                let sign = if offset.is_negative() { '-' } else { '+' };
                write!(f, "{}{:02}:{:02}", sign, hours.abs(), minutes.abs())
            }
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{datetime, offset};

    use super::*;

    #[test]
    fn parse_when_utc_then_zulu_offset() {
        let ts: Timestamp = "2024-03-01T08:30:00Z".parse().unwrap();
        assert_eq!(ts.datetime, datetime!(2024-03-01 08:30:00));
        assert_eq!(ts.offset, Some(UtcOffset::UTC));
        assert_eq!(ts.to_string(), "2024-03-01T08:30:00Z");
    }

    #[test]
    fn parse_when_no_zone_then_no_offset() {
        let ts: Timestamp = "2019-11-05T14:02:11".parse().unwrap();
        assert_eq!(ts.offset, None);
        assert_eq!(ts.to_string(), "2019-11-05T14:02:11");
    }

    #[test]
    fn parse_when_fraction_and_negative_offset_then_round_trips() {
        let ts: Timestamp = "2020-01-02T03:04:05.25-05:30".parse().unwrap();
        assert_eq!(ts.datetime, datetime!(2020-01-02 03:04:05.25));
        assert_eq!(ts.offset, Some(offset!(-05:30)));
        assert_eq!(ts.to_string(), "2020-01-02T03:04:05.25-05:30");
    }

    #[test]
    fn parse_when_not_a_date_then_error() {
        let err = "yesterday".parse::<Timestamp>().unwrap_err();
        assert_eq!(err.value, "yesterday");
    }

    #[test]
    fn now_utc_when_called_then_whole_seconds() {
        let ts = Timestamp::now_utc();
        assert_eq!(ts.datetime.nanosecond(), 0);
        assert_eq!(ts.offset, Some(UtcOffset::UTC));
    }
}
