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


// Line-oriented text protocol
//
//   LOG|<sensor_id>|<YYYY-MM-DDTHH:MM:SS>|<reading>\r\n   -> no reply
//   GET|<sensor_id>|<count>\r\n                         -> reading lines or ERROR|<KIND>\r\n
//
// Frame splitting lives in `frame`; this module only sees frame payloads.

use crate::reading::{Reading, SensorId, SensorIdError, TimestampZone};
use std::fmt::Write as _;
use thiserror::Error;

pub const FIELD_DELIMITER: char = '|';
pub const LOG_TAG: &str = "LOG";
pub const GET_TAG: &str = "GET";

const LOG_FIELDS: usize = 4;
const GET_FIELDS: usize = 3;

/// Error kinds reported to clients as `ERROR|<KIND>\r\n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSensorId,
    MalformedMessage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidSensorId => "INVALID_SENSOR_ID",
            ErrorKind::MalformedMessage => "MALFORMED_MESSAGE",
        }
    }
}

/// Decode failures for a single frame
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("frame is not valid UTF-8")]
    NotUtf8,

    #[error("unknown command tag '{0}'")]
    UnknownCommand(String),

    #[error("{command} expects {expected} fields, got {actual}")]
    FieldCount {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid sensor id: {0}")]
    SensorId(#[from] SensorIdError),

    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("invalid reading '{0}'")]
    Value(String),

    #[error("invalid record count '{0}'")]
    Count(String),
}

impl ProtocolError {
    /// Error kind sent back to the client for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::SensorId(_) => ErrorKind::InvalidSensorId,
            _ => ErrorKind::MalformedMessage,
        }
    }
}

/// `GET` request: first `count` readings of `sensor_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub sensor_id: SensorId,
    pub count: u64,
}

/// Decoded client request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Log(Reading),
    Get(GetRequest),
}

impl Request {
    pub fn command(&self) -> &'static str {
        match self {
            Request::Log(_) => LOG_TAG,
            Request::Get(_) => GET_TAG,
        }
    }
}

fn split_fields<'a>(
    line: &'a str,
    command: &'static str,
    expected: usize,
) -> Result<Vec<&'a str>, ProtocolError> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != expected {
        return Err(ProtocolError::FieldCount {
            command,
            expected,
            actual: fields.len(),
        });
    }
    if fields[0] != command {
        return Err(ProtocolError::UnknownCommand(fields[0].to_string()));
    }
    Ok(fields)
}

/// Decode a `LOG|<id>|<timestamp>|<reading>` payload
pub fn decode_log(line: &str, zone: TimestampZone) -> Result<Reading, ProtocolError> {
    let fields = split_fields(line, LOG_TAG, LOG_FIELDS)?;

    let sensor_id = SensorId::new(fields[1])?;
    let timestamp = zone
        .parse(fields[2])
        .ok_or_else(|| ProtocolError::Timestamp(fields[2].to_string()))?;
    let value = fields[3]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProtocolError::Value(fields[3].to_string()))?;

    Ok(Reading::new(sensor_id, timestamp, value))
}

/// Decode a `GET|<id>|<count>` payload
pub fn decode_get(line: &str) -> Result<GetRequest, ProtocolError> {
    let fields = split_fields(line, GET_TAG, GET_FIELDS)?;

    let sensor_id = SensorId::new(fields[1])?;
    // u64::from_str accepts a leading '+', the wire format does not
    let count = Some(fields[2])
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ProtocolError::Count(fields[2].to_string()))?;

    Ok(GetRequest { sensor_id, count })
}

/// Decode any frame payload by its command tag
pub fn decode_request(payload: &[u8], zone: TimestampZone) -> Result<Request, ProtocolError> {
    let line = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
    let tag = line.split(FIELD_DELIMITER).next().unwrap_or_default();

    match tag {
        LOG_TAG => decode_log(line, zone).map(Request::Log),
        GET_TAG => decode_get(line).map(Request::Get),
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

/// Render one reading as `Sensor: <id>, Tempo: <timestamp>, Valor: <reading>\n`
pub fn encode_reading_line(reading: &Reading, zone: TimestampZone) -> String {
    let mut line = String::new();
    write_reading_line(&mut line, reading, zone);
    line
}

/// Concatenate reading lines into one response body
pub fn encode_readings(readings: &[Reading], zone: TimestampZone) -> String {
    let mut body = String::new();
    for reading in readings {
        write_reading_line(&mut body, reading, zone);
    }
    body
}

fn write_reading_line(out: &mut String, reading: &Reading, zone: TimestampZone) {
    // Records written by other tools may carry timestamps chrono cannot render
    let tempo = zone
        .format(reading.timestamp)
        .unwrap_or_else(|| reading.timestamp.to_string());
    let _ = writeln!(
        out,
        "Sensor: {}, Tempo: {}, Valor: {:.6}",
        reading.sensor_id, tempo, reading.value
    );
}

/// Render `ERROR|<KIND>\r\n`
pub fn encode_error(kind: ErrorKind) -> String {
    format!("ERROR|{}\r\n", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTC: TimestampZone = TimestampZone::Utc;

    #[test]
    fn test_decode_log() {
        let reading = decode_log("LOG|temp1|2024-01-01T00:00:00|21.5", UTC).unwrap();
        assert_eq!(reading.sensor_id.as_str(), "temp1");
        assert_eq!(reading.timestamp, 1_704_067_200);
        assert_eq!(reading.value, 21.5);
    }

    #[test]
    fn test_decode_log_field_count() {
        let err = decode_log("LOG|temp1|2024-01-01T00:00:00", UTC).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FieldCount {
                command: "LOG",
                expected: 4,
                actual: 3
            }
        );
        assert!(decode_log("LOG|temp1|2024-01-01T00:00:00|1|2", UTC).is_err());
    }

    #[test]
    fn test_decode_log_rejects_non_finite() {
        for value in ["NaN", "inf", "-inf", "abc", ""] {
            let line = format!("LOG|t|2024-01-01T00:00:00|{}", value);
            assert!(matches!(
                decode_log(&line, UTC),
                Err(ProtocolError::Value(_))
            ));
        }
    }

    #[test]
    fn test_decode_get_count() {
        let req = decode_get("GET|temp1|0").unwrap();
        assert_eq!(req.count, 0);
        assert!(matches!(decode_get("GET|temp1|-1"), Err(ProtocolError::Count(_))));
        assert!(matches!(decode_get("GET|temp1|+1"), Err(ProtocolError::Count(_))));
        assert!(matches!(decode_get("GET|temp1|1.5"), Err(ProtocolError::Count(_))));
    }

    #[test]
    fn test_decode_request_tag_must_match_exactly() {
        assert!(matches!(
            decode_request(b"LOGX|a|2024-01-01T00:00:00|1", UTC),
            Err(ProtocolError::UnknownCommand(tag)) if tag == "LOGX"
        ));
        assert!(matches!(
            decode_request(b"LO", UTC),
            Err(ProtocolError::UnknownCommand(_))
        ));
        assert!(matches!(
            decode_request(b"", UTC),
            Err(ProtocolError::UnknownCommand(_))
        ));
        assert_eq!(
            decode_request(&[0xff, 0xfe], UTC),
            Err(ProtocolError::NotUtf8)
        );
    }

    #[test]
    fn test_error_kind_mapping() {
        let too_long = format!("GET|{}|1", "a".repeat(40));
        assert_eq!(decode_get(&too_long).unwrap_err().kind(), ErrorKind::InvalidSensorId);
        assert_eq!(
            decode_get("GET|a").unwrap_err().kind(),
            ErrorKind::MalformedMessage
        );
    }

    #[test]
    fn test_encode_reading_line() {
        let reading = Reading::new(SensorId::new("temp1").unwrap(), 1_704_067_200, 21.5);
        assert_eq!(
            encode_reading_line(&reading, UTC),
            "Sensor: temp1, Tempo: 2024-01-01T00:00:00, Valor: 21.500000\n"
        );
    }

    #[test]
    fn test_encode_error() {
        assert_eq!(
            encode_error(ErrorKind::InvalidSensorId),
            "ERROR|INVALID_SENSOR_ID\r\n"
        );
        assert_eq!(
            encode_error(ErrorKind::MalformedMessage),
            "ERROR|MALFORMED_MESSAGE\r\n"
        );
    }
}
