// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot control connection to a profile's daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use resmon_daemon::protocol::{encode_frame, FrameDecoder, COMMAND_MAGIC, REPLY_MAGIC};

/// How long to wait for a reply frame.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot connect to '{0}', is the daemon running?")]
    Connect(PathBuf, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a reply arrived")]
    ConnectionClosed,

    #[error("timed out waiting for a reply")]
    Timeout,
}

/// Connected control client.
pub struct Client {
    stream: UnixStream,
    decoder: FrameDecoder,
}

impl Client {
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|err| ClientError::Connect(socket_path.to_path_buf(), err))?;
        Ok(Self {
            stream,
            decoder: FrameDecoder::new(REPLY_MAGIC),
        })
    }

    /// Send one command and return the reply text verbatim.
    pub async fn request(&mut self, verb: u16, argument: &str) -> Result<String, ClientError> {
        let mut payload = verb.to_le_bytes().to_vec();
        payload.extend_from_slice(argument.as_bytes());
        self.stream
            .write_all(&encode_frame(COMMAND_MAGIC, &payload))
            .await?;

        let deadline = tokio::time::Instant::now() + REPLY_TIMEOUT;
        let mut buf = [0u8; 8192];
        loop {
            if let Some(reply) = self.decoder.next_payload() {
                return Ok(String::from_utf8_lossy(&reply).into_owned());
            }
            let read = tokio::time::timeout_at(deadline, self.stream.read(&mut buf))
                .await
                .map_err(|_| ClientError::Timeout)??;
            if read == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            self.decoder.feed(&buf[..read]);
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
