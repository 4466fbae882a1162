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


// Filesystem backend: one append-only record file per sensor

use super::backend::ReadingStore;
use crate::config::FilesystemConfig;
use crate::error::StoreError;
use crate::reading::{Reading, SensorId};
use crate::record::{decode_record, encode_record, RecordLayout};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Filesystem backend writing `<base_path>/<sensor_id>.<ext>` record files
///
/// Files are opened and closed on every call. A per-sensor async mutex
/// serializes access to each file within this process.
pub struct FileLogStore {
    base_path: PathBuf,
    file_extension: String,
    sync_writes: bool,
    locks: DashMap<SensorId, Arc<Mutex<()>>>,
}

impl FileLogStore {
    pub fn new(config: FilesystemConfig) -> Result<Self> {
        let base_path = PathBuf::from(&config.base_path);

        info!(
            "Initializing filesystem log store at: {}",
            base_path.display()
        );

        Ok(Self {
            base_path,
            file_extension: config.file_extension,
            sync_writes: config.sync_writes,
            locks: DashMap::new(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of a sensor's log file
    pub fn log_path(&self, sensor_id: &SensorId) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", sensor_id, self.file_extension))
    }

    fn sensor_lock(&self, sensor_id: &SensorId) -> Arc<Mutex<()>> {
        // Clone out of the map so no shard guard is held across an await
        self.locks.entry(sensor_id.clone()).or_default().clone()
    }
}

#[async_trait]
impl ReadingStore for FileLogStore {
    async fn initialize(&self) -> Result<()> {
        if !self.base_path.exists() {
            info!("Creating base directory: {}", self.base_path.display());
            fs::create_dir_all(&self.base_path)
                .await
                .context("Failed to create base directory")?;
        } else {
            info!(
                "Base directory already exists: {}",
                self.base_path.display()
            );
        }
        Ok(())
    }

    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        let path = self.log_path(&reading.sensor_id);
        let mut record = BytesMut::with_capacity(RecordLayout::SIZE);
        encode_record(reading, &mut record);

        let lock = self.sensor_lock(&reading.sensor_id);
        let _guard = lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io("open", &path, e))?;

        // One write per record keeps concurrent appenders from interleaving
        file.write_all(&record)
            .await
            .map_err(|e| StoreError::io("write", &path, e))?;
        file.flush()
            .await
            .map_err(|e| StoreError::io("flush", &path, e))?;
        if self.sync_writes {
            file.sync_data()
                .await
                .map_err(|e| StoreError::io("sync", &path, e))?;
        }

        debug!(
            "Appended reading for '{}' to {}",
            reading.sensor_id,
            path.display()
        );
        Ok(())
    }

    async fn read_first_n(
        &self,
        sensor_id: &SensorId,
        n: u64,
    ) -> Result<Vec<Reading>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let path = self.log_path(sensor_id);
        let lock = self.sensor_lock(sensor_id);
        let _guard = lock.lock().await;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No log file for '{}' yet", sensor_id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::io("open", &path, e)),
        };

        let limit = n.saturating_mul(RecordLayout::SIZE as u64);
        let mut data = Vec::new();
        file.take(limit)
            .read_to_end(&mut data)
            .await
            .map_err(|e| StoreError::io("read", &path, e))?;

        let chunks = data.chunks_exact(RecordLayout::SIZE);
        if !chunks.remainder().is_empty() {
            warn!(
                "Ignoring {} trailing bytes of a partial record in {}",
                chunks.remainder().len(),
                path.display()
            );
        }

        let mut readings = Vec::with_capacity(data.len() / RecordLayout::SIZE);
        for (index, chunk) in chunks.enumerate() {
            match decode_record(chunk) {
                Ok(reading) => readings.push(reading),
                Err(e) => warn!(
                    "Skipping corrupt record in {} at byte {}: {}",
                    path.display(),
                    index * RecordLayout::SIZE,
                    e
                ),
            }
        }

        Ok(readings)
    }

    async fn health_check(&self) -> Result<bool> {
        match fs::metadata(&self.base_path).await {
            Ok(metadata) if metadata.is_dir() => {
                let test_file = self.base_path.join(".health_check_test");
                match fs::File::create(&test_file).await {
                    Ok(mut f) => {
                        if let Err(e) = f.write_all(b"test").await {
                            warn!("Health check failed - cannot write: {}", e);
                            return Ok(false);
                        }
                        let _ = fs::remove_file(&test_file).await;
                        Ok(true)
                    }
                    Err(e) => {
                        warn!("Health check failed - cannot create file: {}", e);
                        Ok(false)
                    }
                }
            }
            Ok(_) => {
                warn!(
                    "Health check failed - base path is not a directory: {}",
                    self.base_path.display()
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    "Health check failed - cannot access base path {}: {}",
                    self.base_path.display(),
                    e
                );
                Ok(false)
            }
        }
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
