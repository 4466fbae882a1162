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


use anyhow::{anyhow, Result};
use clap::Parser;
use sensor_recorder::config::{load_config_with_env, override_data_dir, LoggingConfig};
use sensor_recorder::{Dispatcher, SensorRegistry, StoreFactory, TelemetryServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/default.yaml";

/// Sensor Recorder - ingest and serve sensor readings over TCP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port to listen on
    port: u16,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for sensor log files (overrides config file)
    #[arg(short, long)]
    data_dir: Option<String>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logging.level.to_lowercase()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // An explicit --config must exist; the default path is optional
    let (config_path, required) = match args.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    let mut config = load_config_with_env(&config_path, required)?;

    if let Some(data_dir) = args.data_dir {
        override_data_dir(&mut config, data_dir)?;
    }

    init_tracing(&config.logging)?;

    info!("Starting Sensor Recorder");
    info!("Configuration: {:?}", config_path);
    info!("Storage backend: {}", config.storage.backend);

    let store = StoreFactory::create(&config.storage)?;
    store.initialize().await?;
    if !store.health_check().await? {
        warn!("Storage backend '{}' failed its health check", store.backend_type());
    }

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(SensorRegistry::new()),
        store,
        config.protocol.clone(),
    ));

    let addr = config.server.socket_addr(args.port)?;
    let server = TelemetryServer::bind(addr, dispatcher, config.server.max_frame_bytes).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    info!("Sensor Recorder shut down");

    Ok(())
}
