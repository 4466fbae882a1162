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


// Per-connection protocol session
//
//   AwaitingFrame --frame--> Dispatching --reply sent / LOG handled--> AwaitingFrame
//   any state --EOF / I/O error / oversized frame--> Closed

use crate::config::{ProtocolConfig, RegistrationPolicy};
use crate::frame::{FrameCodec, FrameError};
use crate::protocol::{
    decode_request, encode_error, encode_readings, ErrorKind, GetRequest, Request, LOG_TAG,
};
use crate::reading::Reading;
use crate::registry::SensorRegistry;
use crate::storage::ReadingStore;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingFrame,
    Dispatching,
    Closed,
}

/// Turns decoded frames into registry/store operations and responses
///
/// Shared by every session of a server.
pub struct Dispatcher {
    registry: Arc<SensorRegistry>,
    store: Arc<dyn ReadingStore>,
    protocol: ProtocolConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SensorRegistry>,
        store: Arc<dyn ReadingStore>,
        protocol: ProtocolConfig,
    ) -> Self {
        Self {
            registry,
            store,
            protocol,
        }
    }

    pub fn registry(&self) -> &Arc<SensorRegistry> {
        &self.registry
    }

    /// Handle one frame payload; returns the bytes to write back, if any
    pub async fn dispatch(&self, frame: &[u8]) -> Option<Bytes> {
        match decode_request(frame, self.protocol.timezone) {
            Ok(Request::Log(reading)) => {
                self.handle_log(reading).await;
                None
            }
            Ok(Request::Get(request)) => Some(self.handle_get(request).await),
            Err(e) => {
                let is_log = frame
                    .split(|&b| b == b'|')
                    .next()
                    .is_some_and(|tag| tag == LOG_TAG.as_bytes());

                warn!("Rejected frame: {}", e);
                if is_log && !self.protocol.reply_to_malformed_log {
                    return None;
                }
                Some(Bytes::from(encode_error(e.kind())))
            }
        }
    }

    async fn handle_log(&self, reading: Reading) {
        let sensor_id = reading.sensor_id.clone();

        if self.protocol.registration == RegistrationPolicy::Eager
            && self.registry.register(sensor_id.clone()).await
        {
            info!("Registered new sensor '{}'", sensor_id);
        }

        match self.store.append(&reading).await {
            Ok(()) => {
                if self.protocol.registration == RegistrationPolicy::Durable
                    && self.registry.register(sensor_id.clone()).await
                {
                    info!("Registered new sensor '{}'", sensor_id);
                }
            }
            // Ingestion is fire-and-forget; the operator log is the only report
            Err(e) => error!("Failed to store reading for '{}': {}", sensor_id, e),
        }
    }

    async fn handle_get(&self, request: GetRequest) -> Bytes {
        if !self.registry.contains(&request.sensor_id).await {
            debug!("GET for unknown sensor '{}'", request.sensor_id);
            return Bytes::from(encode_error(ErrorKind::InvalidSensorId));
        }

        match self
            .store
            .read_first_n(&request.sensor_id, request.count)
            .await
        {
            Ok(readings) => {
                debug!(
                    "Returning {} readings for '{}'",
                    readings.len(),
                    request.sensor_id
                );
                Bytes::from(encode_readings(&readings, self.protocol.timezone))
            }
            Err(e) => {
                error!("Failed to read log for '{}': {}", request.sensor_id, e);
                Bytes::new()
            }
        }
    }
}

/// One client connection: reads a frame, dispatches it, writes the reply
///
/// Frames are handled strictly one at a time; the next frame is not read
/// until the previous reply has been flushed.
pub struct Session<S> {
    id: u64,
    framed: Framed<S, FrameCodec>,
    dispatcher: Arc<Dispatcher>,
    state: SessionState,
    frames_handled: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: u64, stream: S, dispatcher: Arc<Dispatcher>, max_frame_bytes: usize) -> Self {
        Self {
            id,
            framed: Framed::new(stream, FrameCodec::new(max_frame_bytes)),
            dispatcher,
            state: SessionState::AwaitingFrame,
            frames_handled: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_handled(&self) -> u64 {
        self.frames_handled
    }

    /// Serve frames until the peer disconnects
    ///
    /// Returns `Ok` on an orderly close (including a close mid-frame, whose
    /// partial bytes are discarded) and on an oversized frame, which is
    /// answered with `MALFORMED_MESSAGE` before closing.
    pub async fn run(&mut self) -> Result<(), FrameError> {
        let result = self.serve().await;
        self.state = SessionState::Closed;
        debug!(
            "Session {} closed after {} frames",
            self.id, self.frames_handled
        );
        result
    }

    async fn serve(&mut self) -> Result<(), FrameError> {
        loop {
            self.state = SessionState::AwaitingFrame;

            let frame = match self.framed.next().await {
                None => return Ok(()),
                Some(Ok(frame)) => frame,
                Some(Err(FrameError::TooLong { limit })) => {
                    warn!(
                        "Session {}: frame exceeds {} bytes, closing",
                        self.id, limit
                    );
                    let reply = Bytes::from(encode_error(ErrorKind::MalformedMessage));
                    self.framed.send(reply).await?;
                    return Ok(());
                }
                Some(Err(e)) => return Err(e),
            };

            self.state = SessionState::Dispatching;
            self.frames_handled += 1;
            debug!(
                "Session {}: received frame '{}'",
                self.id,
                String::from_utf8_lossy(&frame)
            );

            if let Some(reply) = self.dispatcher.dispatch(&frame).await {
                self.framed.send(reply).await?;
            }
        }
    }
}
