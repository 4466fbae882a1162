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


use crate::session::{Dispatcher, Session};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};

// Back-off after a failed accept (e.g. file descriptor exhaustion)
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

/// TCP listener handing each accepted connection to its own session task
pub struct TelemetryServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    max_frame_bytes: usize,
    next_session_id: AtomicU64,
}

impl TelemetryServer {
    pub async fn bind(
        addr: SocketAddr,
        dispatcher: Arc<Dispatcher>,
        max_frame_bytes: usize,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            dispatcher,
            max_frame_bytes,
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
                    let dispatcher = self.dispatcher.clone();
                    let max_frame_bytes = self.max_frame_bytes;
                    let span = info_span!("session", id, %peer);

                    tokio::spawn(
                        async move {
                            debug!("Client connected");
                            let mut session = Session::new(id, stream, dispatcher, max_frame_bytes);
                            match session.run().await {
                                Ok(()) => debug!("Client disconnected"),
                                Err(e) => warn!("Session ended with error: {}", e),
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_DELAY).await;
                }
            }
        }
    }
}
