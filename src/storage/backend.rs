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


// Storage backend trait for per-sensor reading logs

use crate::error::StoreError;
use crate::reading::{Reading, SensorId};
use anyhow::Result;
use async_trait::async_trait;

/// Append-only per-sensor reading log
///
/// Implementations must give each call exclusive access to the sensor's log
/// for its duration: an append never interleaves with another append or read
/// of the same sensor. Calls for different sensors may run in parallel.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Prepare the backend (create directories etc.)
    async fn initialize(&self) -> Result<()>;

    /// Durably append one reading to its sensor's log
    ///
    /// Returns only after the record is written. On error nothing may be
    /// reported as stored.
    async fn append(&self, reading: &Reading) -> Result<(), StoreError>;

    /// First `n` readings of `sensor_id` in arrival order
    ///
    /// A sensor without a log yields an empty vector, as does `n == 0`.
    async fn read_first_n(&self, sensor_id: &SensorId, n: u64)
        -> Result<Vec<Reading>, StoreError>;

    /// Health check
    async fn health_check(&self) -> Result<bool>;

    /// Get backend type identifier
    fn backend_type(&self) -> &str;
}
