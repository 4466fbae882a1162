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


use crate::reading::SensorId;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Process-wide set of sensors that have submitted a reading
///
/// Membership lives in memory only and starts empty on every restart,
/// whatever log files already exist on disk. Every operation takes the lock
/// for its whole duration, so concurrent `register` and `contains` calls for
/// the same id are linearizable.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: RwLock<HashSet<SensorId>>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, id: &SensorId) -> bool {
        self.sensors.read().await.contains(id)
    }

    /// Add `id`; returns `true` if it was not already known
    pub async fn register(&self, id: SensorId) -> bool {
        self.sensors.write().await.insert(id)
    }

    pub async fn len(&self) -> usize {
        self.sensors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sensors.read().await.is_empty()
    }
}
