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


use sensor_recorder::protocol::*;
use sensor_recorder::{Reading, SensorId, TimestampZone};

const UTC: TimestampZone = TimestampZone::Utc;

#[test]
fn test_decode_request_log() {
    let request = decode_request(b"LOG|temp1|2024-01-01T00:05:00|22.0", UTC).unwrap();
    assert_eq!(request.command(), "LOG");

    match request {
        Request::Log(reading) => {
            assert_eq!(reading.sensor_id.as_str(), "temp1");
            assert_eq!(reading.timestamp, 1_704_067_500);
            assert_eq!(reading.value, 22.0);
        }
        other => panic!("expected LOG, got {:?}", other),
    }
}

#[test]
fn test_decode_request_get() {
    let request = decode_request(b"GET|temp1|2", UTC).unwrap();
    assert_eq!(
        request,
        Request::Get(GetRequest {
            sensor_id: SensorId::new("temp1").unwrap(),
            count: 2,
        })
    );
}

#[test]
fn test_decode_log_accepts_decimal_forms() {
    for (text, value) in [("21", 21.0), ("-3.25", -3.25), ("1e3", 1000.0), (".5", 0.5)] {
        let line = format!("LOG|t|2024-01-01T00:00:00|{}", text);
        assert_eq!(decode_log(&line, UTC).unwrap().value, value, "{}", text);
    }
}

#[test]
fn test_decode_log_rejects_bad_timestamp() {
    for ts in ["2024-01-01", "2024-02-30T00:00:00", "2024-01-01T25:00:00", "x"] {
        let line = format!("LOG|t|{}|1.0", ts);
        assert!(
            matches!(decode_log(&line, UTC), Err(ProtocolError::Timestamp(_))),
            "{}",
            ts
        );
    }
}

#[test]
fn test_decode_get_large_count() {
    let request = decode_get("GET|t|18446744073709551615").unwrap();
    assert_eq!(request.count, u64::MAX);
    assert!(decode_get("GET|t|18446744073709551616").is_err());
}

#[test]
fn test_wrong_tag_for_decoder() {
    assert!(matches!(
        decode_get("LOG|t|1"),
        Err(ProtocolError::UnknownCommand(_))
    ));
}

#[test]
fn test_encode_readings_concatenates_in_order() {
    let id = SensorId::new("temp1").unwrap();
    let readings = vec![
        Reading::new(id.clone(), 1_704_067_200, 21.5),
        Reading::new(id, 1_704_067_500, 22.0),
    ];

    assert_eq!(
        encode_readings(&readings, UTC),
        "Sensor: temp1, Tempo: 2024-01-01T00:00:00, Valor: 21.500000\n\
         Sensor: temp1, Tempo: 2024-01-01T00:05:00, Valor: 22.000000\n"
    );
    assert_eq!(encode_readings(&[], UTC), "");
}

#[test]
fn test_decoded_values_round_trip_through_rendering() {
    let reading = decode_log("LOG|probe-7|2023-12-31T23:59:59|-0.125", UTC).unwrap();
    assert_eq!(
        encode_reading_line(&reading, UTC),
        "Sensor: probe-7, Tempo: 2023-12-31T23:59:59, Valor: -0.125000\n"
    );
}

#[test]
fn test_error_frames() {
    assert_eq!(
        encode_error(ErrorKind::InvalidSensorId),
        "ERROR|INVALID_SENSOR_ID\r\n"
    );
    assert_eq!(ErrorKind::MalformedMessage.as_str(), "MALFORMED_MESSAGE");
}
