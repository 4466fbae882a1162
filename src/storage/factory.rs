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


// Backend factory for creating log stores from configuration

use super::backend::ReadingStore;
use super::filesystem::FileLogStore;
use super::memory::MemoryStore;
use crate::config::StorageConfig;
use anyhow::{bail, Result};
use std::sync::Arc;

pub struct StoreFactory;

impl StoreFactory {
    /// Create the configured log store
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn ReadingStore>> {
        match config.backend.as_str() {
            "filesystem" => {
                let store = FileLogStore::new(config.filesystem.clone())?;
                Ok(Arc::new(store))
            }

            "memory" => Ok(Arc::new(MemoryStore::new())),

            unknown => bail!(
                "Unknown storage backend: '{}'. Supported: filesystem, memory",
                unknown
            ),
        }
    }
}
