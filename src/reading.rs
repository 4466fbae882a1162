// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


// Reading data model: sensor identifiers, readings and timestamp policy

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Wire and storage timestamp format (`YYYY-MM-DDTHH:MM:SS`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TIMESTAMP_LEN: usize = 19;

// Byte offsets of the separators in `YYYY-MM-DDTHH:MM:SS`
const TIMESTAMP_SEPARATORS: [(usize, u8); 5] =
    [(4, b'-'), (7, b'-'), (10, b'T'), (13, b':'), (16, b':')];

/// Exact `YYYY-MM-DDTHH:MM:SS` shape: digits everywhere but the separators
fn has_timestamp_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == TIMESTAMP_LEN
        && bytes.iter().enumerate().all(|(i, &b)| {
            match TIMESTAMP_SEPARATORS.iter().find(|(pos, _)| *pos == i) {
                Some(&(_, sep)) => b == sep,
                None => b.is_ascii_digit(),
            }
        })
}

/// Reasons a client-supplied sensor identifier is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorIdError {
    #[error("sensor id is empty")]
    Empty,

    #[error("sensor id is {0} bytes, maximum is {max}", max = SensorId::MAX_LEN)]
    TooLong(usize),

    #[error("sensor id contains invalid byte 0x{0:02x}")]
    InvalidByte(u8),

    #[error("sensor id '{0}' is reserved")]
    Reserved(String),
}

/// Validated sensor identifier
///
/// Identifiers are 1 to 31 bytes of printable ASCII. Path separators and the
/// field delimiter are refused, as are `.` and `..`, since the identifier names
/// the sensor's log file. Over-length identifiers are rejected, never
/// truncated, so two distinct identifiers can never share a log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(String);

impl SensorId {
    /// Longest identifier accepted; the on-disk slot keeps one trailing NUL
    pub const MAX_LEN: usize = 31;

    pub fn new(id: impl Into<String>) -> Result<Self, SensorIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(SensorIdError::Empty);
        }
        if id.len() > Self::MAX_LEN {
            return Err(SensorIdError::TooLong(id.len()));
        }
        if let Some(&b) = id
            .as_bytes()
            .iter()
            .find(|&&b| !b.is_ascii_graphic() || matches!(b, b'/' | b'\\' | b'|'))
        {
            return Err(SensorIdError::InvalidByte(b));
        }
        if id == "." || id == ".." {
            return Err(SensorIdError::Reserved(id));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub sensor_id: SensorId,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    pub value: f64,
}

impl Reading {
    pub fn new(sensor_id: SensorId, timestamp: i64, value: f64) -> Self {
        Self {
            sensor_id,
            timestamp,
            value,
        }
    }
}

/// Time zone used to interpret wire timestamps and render stored ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    #[default]
    Utc,
    /// Host-local time; stored data is then only portable between hosts in the same zone
    Local,
}

impl TimestampZone {
    /// Parse a `YYYY-MM-DDTHH:MM:SS` timestamp into epoch seconds
    ///
    /// Returns `None` for malformed text and, in local mode, for wall-clock
    /// times skipped by a DST transition. Ambiguous local times resolve to
    /// the earliest instant.
    pub fn parse(self, text: &str) -> Option<i64> {
        // chrono's numeric fields tolerate signs, padding and leap seconds
        if !has_timestamp_shape(text) || &text[17..] == "60" {
            return None;
        }
        let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()?;

        match self {
            TimestampZone::Utc => Some(naive.and_utc().timestamp()),
            TimestampZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp()),
        }
    }

    /// Render epoch seconds as `YYYY-MM-DDTHH:MM:SS`
    pub fn format(self, timestamp: i64) -> Option<String> {
        match self {
            TimestampZone::Utc => DateTime::from_timestamp(timestamp, 0)
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()),
            TimestampZone::Local => Local
                .timestamp_opt(timestamp, 0)
                .earliest()
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_id_accepts_max_len() {
        let id = "a".repeat(SensorId::MAX_LEN);
        assert_eq!(SensorId::new(id.clone()).unwrap().as_str(), id);
    }

    #[test]
    fn test_sensor_id_rejects_over_length() {
        let id = "a".repeat(SensorId::MAX_LEN + 1);
        assert_eq!(SensorId::new(id), Err(SensorIdError::TooLong(32)));
    }

    #[test]
    fn test_sensor_id_rejects_path_characters() {
        assert_eq!(
            SensorId::new("../etc"),
            Err(SensorIdError::InvalidByte(b'/'))
        );
        assert_eq!(
            SensorId::new("a\\b"),
            Err(SensorIdError::InvalidByte(b'\\'))
        );
        assert!(matches!(SensorId::new(".."), Err(SensorIdError::Reserved(_))));
        assert!(matches!(SensorId::new("temp 1"), Err(SensorIdError::InvalidByte(b' '))));
        assert_eq!(SensorId::new(""), Err(SensorIdError::Empty));
    }

    #[test]
    fn test_utc_timestamp_parse_and_format() {
        let zone = TimestampZone::Utc;
        assert_eq!(zone.parse("1970-01-01T00:00:00"), Some(0));
        assert_eq!(zone.parse("2024-01-01T00:00:00"), Some(1_704_067_200));
        assert_eq!(
            zone.format(1_704_067_500).as_deref(),
            Some("2024-01-01T00:05:00")
        );
    }

    #[test]
    fn test_timestamp_rejects_other_shapes() {
        let zone = TimestampZone::Utc;
        assert_eq!(zone.parse("2024-01-01 00:00:00"), None);
        assert_eq!(zone.parse("2024-1-1T00:00:00"), None);
        assert_eq!(zone.parse("2024-13-01T00:00:00"), None);
        assert_eq!(zone.parse("2024-01-01T00:00:00Z"), None);
        assert_eq!(zone.parse(""), None);
    }

    #[test]
    fn test_timestamp_rejects_padding_signs_and_leap_seconds() {
        let zone = TimestampZone::Utc;
        assert_eq!(zone.parse(" 2024-1-01T00:00:00"), None);
        assert_eq!(zone.parse("2024-01-01T 0:00:00"), None);
        assert_eq!(zone.parse("+024-01-01T00:00:00"), None);
        assert_eq!(zone.parse("2024-01-01T00:00:60"), None);
        assert_eq!(zone.parse("2024-01-01T00:00:59"), Some(1_704_067_259));
    }

    #[test]
    fn test_local_round_trip() {
        let zone = TimestampZone::Local;
        let ts = zone.parse("2024-06-15T12:30:45").unwrap();
        assert_eq!(zone.format(ts).as_deref(), Some("2024-06-15T12:30:45"));
    }
}
