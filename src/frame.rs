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


// `\r\n` frame splitting for tokio_util::codec

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

pub const FRAME_DELIMITER: &[u8] = b"\r\n";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame exceeds {limit} bytes without a delimiter")]
    TooLong { limit: usize },

    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Splits a byte stream into `\r\n`-terminated frames
///
/// Yielded frames exclude the delimiter. A lone `\n` or `\r` is ordinary
/// payload. Bytes left over at end of stream are dropped.
#[derive(Debug)]
pub struct FrameCodec {
    max_frame_bytes: usize,
    // Bytes already scanned without finding a delimiter
    scanned: usize,
}

impl FrameCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            scanned: 0,
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Back up one byte so a delimiter split across reads is still found
        let start = self.scanned.saturating_sub(1);
        let found = src[start..]
            .windows(FRAME_DELIMITER.len())
            .position(|w| w == FRAME_DELIMITER)
            .map(|i| start + i);

        match found {
            Some(end) if end <= self.max_frame_bytes => {
                self.scanned = 0;
                let frame = src.split_to(end).freeze();
                src.advance(FRAME_DELIMITER.len());
                Ok(Some(frame))
            }
            Some(_) => Err(FrameError::TooLong {
                limit: self.max_frame_bytes,
            }),
            // A full-length payload may be followed by a lone '\r' still awaiting its '\n'
            None if src.len() > self.max_frame_bytes + FRAME_DELIMITER.len() - 1 => {
                Err(FrameError::TooLong {
                    limit: self.max_frame_bytes,
                })
            }
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    tracing::debug!("Discarding {} bytes of incomplete frame", src.len());
                    src.clear();
                }
                self.scanned = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    /// Responses are written verbatim; they carry their own line endings
    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put(item);
        Ok(())
    }
}
