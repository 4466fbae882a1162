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


// Fixed-size binary record layout for per-sensor log files
//
// Version 1 layout, little-endian, no padding between fields:
//
//   offset  width  field
//   0       32     sensor id, ASCII, NUL padded
//   32      8      timestamp, i64 seconds since the Unix epoch
//   40      8      reading, IEEE-754 f64
//
// Files hold a plain concatenation of records with no header.

use crate::reading::{Reading, SensorId, SensorIdError};
use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// Record layout constants
pub struct RecordLayout;

impl RecordLayout {
    pub const ID_OFFSET: usize = 0;
    pub const ID_WIDTH: usize = 32;
    pub const TIMESTAMP_OFFSET: usize = Self::ID_OFFSET + Self::ID_WIDTH;
    pub const VALUE_OFFSET: usize = Self::TIMESTAMP_OFFSET + 8;
    pub const SIZE: usize = Self::VALUE_OFFSET + 8;
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record is {0} bytes, expected {size}", size = RecordLayout::SIZE)]
    WrongSize(usize),

    #[error("invalid sensor id in record: {0}")]
    SensorId(#[from] SensorIdError),

    #[error("sensor id slot is not valid ASCII")]
    NotAscii,
}

/// Serialize a reading into one fixed-size record
pub fn encode_record(reading: &Reading, out: &mut BytesMut) {
    out.reserve(RecordLayout::SIZE);

    let id = reading.sensor_id.as_str().as_bytes();
    out.put_slice(id);
    out.put_bytes(0, RecordLayout::ID_WIDTH - id.len());
    out.put_i64_le(reading.timestamp);
    out.put_f64_le(reading.value);
}

/// Deserialize one fixed-size record
pub fn decode_record(mut record: &[u8]) -> Result<Reading, RecordError> {
    if record.len() != RecordLayout::SIZE {
        return Err(RecordError::WrongSize(record.len()));
    }

    let slot = &record[..RecordLayout::ID_WIDTH];
    let id_len = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    let id = std::str::from_utf8(&slot[..id_len]).map_err(|_| RecordError::NotAscii)?;
    let sensor_id = SensorId::new(id)?;

    record.advance(RecordLayout::ID_WIDTH);
    let timestamp = record.get_i64_le();
    let value = record.get_f64_le();

    Ok(Reading::new(sensor_id, timestamp, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(id: &str, timestamp: i64, value: f64) -> Reading {
        Reading::new(SensorId::new(id).unwrap(), timestamp, value)
    }

    #[test]
    fn test_layout_offsets() {
        assert_eq!(RecordLayout::TIMESTAMP_OFFSET, 32);
        assert_eq!(RecordLayout::VALUE_OFFSET, 40);
        assert_eq!(RecordLayout::SIZE, 48);
    }

    #[test]
    fn test_encode_places_fields_at_fixed_offsets() {
        let mut buf = BytesMut::new();
        encode_record(&reading("temp1", 1_704_067_200, 21.5), &mut buf);

        assert_eq!(buf.len(), RecordLayout::SIZE);
        assert_eq!(&buf[..5], b"temp1");
        assert!(buf[5..32].iter().all(|&b| b == 0));
        assert_eq!(
            &buf[32..40],
            &1_704_067_200i64.to_le_bytes()
        );
        assert_eq!(&buf[40..48], &21.5f64.to_le_bytes());
    }

    #[test]
    fn test_max_len_id_keeps_trailing_nul() {
        let id = "x".repeat(SensorId::MAX_LEN);
        let mut buf = BytesMut::new();
        encode_record(&reading(&id, -5, -0.25), &mut buf);

        assert_eq!(buf[31], 0);
        let decoded = decode_record(&buf).unwrap();
        assert_eq!(decoded.sensor_id.as_str(), id);
        assert_eq!(decoded.timestamp, -5);
        assert_eq!(decoded.value, -0.25);
    }

    #[test]
    fn test_decode_rejects_short_record() {
        assert!(matches!(
            decode_record(&[0u8; 47]),
            Err(RecordError::WrongSize(47))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_id_slot() {
        assert!(matches!(
            decode_record(&[0u8; RecordLayout::SIZE]),
            Err(RecordError::SensorId(SensorIdError::Empty))
        ));
    }
}
