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


// Sensor telemetry recorder
//
// Sensors push timestamped readings over a line-oriented TCP protocol:
// - LOG frames append a reading to the sensor's append-only log
// - GET frames return the earliest readings of a known sensor
// - Logs are fixed-size binary records, one file per sensor
// - Sessions run concurrently; per-sensor access is serialized

pub mod config;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod reading;
pub mod record;
pub mod registry;
pub mod server;
pub mod session;
pub mod storage;

// Re-export main types
pub use config::{load_config, load_config_with_env, RecorderConfig, RegistrationPolicy};
pub use error::StoreError;
pub use frame::{FrameCodec, FrameError};
pub use protocol::{
    decode_get, decode_log, decode_request, encode_error, encode_reading_line, encode_readings,
    ErrorKind, GetRequest, ProtocolError, Request,
};
pub use reading::{Reading, SensorId, SensorIdError, TimestampZone};
pub use record::{decode_record, encode_record, RecordError, RecordLayout};
pub use registry::SensorRegistry;
pub use server::TelemetryServer;
pub use session::{Dispatcher, Session, SessionState};
pub use storage::{FileLogStore, MemoryStore, ReadingStore, StoreFactory};
