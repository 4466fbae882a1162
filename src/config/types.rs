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

// Configuration types for sensor-recorder

use crate::reading::TimestampZone;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TCP listener settings; the port comes from the command line
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Longest accepted frame, excluding the `\r\n` delimiter
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl ServerConfig {
    /// Listen address for `port`; IPv4 and IPv6 bind addresses both work
    pub fn socket_addr(&self, port: u16) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().with_context(|| {
            format!("server.bind_address '{}' is not an IP address", self.bind_address)
        })?;
        Ok(SocketAddr::new(ip, port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

/// Storage configuration with backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Backend type: "filesystem" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default)]
    pub filesystem: FilesystemConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            filesystem: FilesystemConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default = "default_file_extension")]
    pub file_extension: String, // "dat"

    /// fsync each appended record before acknowledging it
    #[serde(default = "default_true")]
    pub sync_writes: bool,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            file_extension: default_file_extension(),
            sync_writes: true,
        }
    }
}

/// When a `LOG` makes its sensor known to `GET`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Register on decode, before the append; a failed append is not rolled back
    #[default]
    Eager,
    /// Register only once the reading has been persisted
    Durable,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub timezone: TimestampZone,

    #[serde(default)]
    pub registration: RegistrationPolicy,

    /// Answer malformed `LOG` frames with an error instead of dropping them
    #[serde(default)]
    pub reply_to_malformed_log: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_max_frame_bytes() -> usize { 1024 }
fn default_backend() -> String { "filesystem".to_string() }
fn default_base_path() -> String { ".".to_string() }
fn default_file_extension() -> String { "dat".to_string() }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
