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


// In-process backend for ephemeral runs and tests

use super::backend::ReadingStore;
use crate::error::StoreError;
use crate::reading::{Reading, SensorId};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// Non-durable store keeping every sensor's log in memory
///
/// Each sensor's log sits behind its own map shard lock, which is never held
/// across an await.
#[derive(Default)]
pub struct MemoryStore {
    logs: DashMap<SensorId, Vec<Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        self.logs
            .entry(reading.sensor_id.clone())
            .or_default()
            .push(reading.clone());
        Ok(())
    }

    async fn read_first_n(
        &self,
        sensor_id: &SensorId,
        n: u64,
    ) -> Result<Vec<Reading>, StoreError> {
        let take = usize::try_from(n).unwrap_or(usize::MAX);
        Ok(self
            .logs
            .get(sensor_id)
            .map(|log| log.iter().take(take).cloned().collect())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_semantics() {
        let store = MemoryStore::new();
        let id = SensorId::new("m1").unwrap();
        assert!(store.read_first_n(&id, 3).await.unwrap().is_empty());

        for i in 0..5 {
            store
                .append(&Reading::new(id.clone(), 100 - i, i as f64))
                .await
                .unwrap();
        }

        let first = store.read_first_n(&id, 3).await.unwrap();
        assert_eq!(
            first.iter().map(|r| r.value).collect::<Vec<_>>(),
            vec![0.0, 1.0, 2.0]
        );
        assert!(store.read_first_n(&id, 0).await.unwrap().is_empty());
        assert_eq!(store.read_first_n(&id, u64::MAX).await.unwrap().len(), 5);
    }
}
