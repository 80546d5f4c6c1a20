// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control socket accept loop.
//!
//! The listener accepts connections until the shutdown token fires and
//! handles each one in a spawned task: bytes are fed into a per-
//! connection frame decoder, every decoded command payload goes through
//! the dispatcher, and the reply comes back as one reply frame. EOF or
//! an I/O error closes the connection; accept errors are logged and the
//! loop goes on.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::dispatch::Dispatcher;
use crate::protocol::{encode_frame, FrameDecoder, COMMAND_MAGIC, REPLY_MAGIC};

/// Read buffer size per connection.
const READ_CHUNK: usize = 8192;

pub struct Listener {
    socket: UnixListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(
        socket: UnixListener,
        dispatcher: Arc<Dispatcher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            socket,
            dispatcher,
            shutdown,
        }
    }

    /// Accept connections until shutdown.
    pub async fn run(self) {
        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("socket service exited");
                    return;
                }
                accepted = self.socket.accept() => accepted,
            };
            match accepted {
                Ok((stream, _addr)) => {
                    debug!("connection is established with a client");
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let shutdown = self.shutdown.clone();
                    tokio::spawn(async move {
                        match handle_connection(stream, &dispatcher, &shutdown).await {
                            Ok(()) => debug!("connection is closed"),
                            Err(err) => warn!("error on client connection: {}", err),
                        }
                    });
                }
                Err(err) => error!("error in accepting connection: {}", err),
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    dispatcher: &Dispatcher,
    shutdown: &CancellationToken,
) -> std::io::Result<()> {
    let mut decoder = FrameDecoder::new(COMMAND_MAGIC);
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let read = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            read = stream.read(&mut buf) => read?,
        };
        if read == 0 {
            return Ok(()); // client hung up
        }
        decoder.feed(&buf[..read]);
        while let Some(payload) = decoder.next_payload() {
            let reply = dispatcher.dispatch(&payload);
            let frame = encode_frame(REPLY_MAGIC, reply.as_bytes());
            stream.write_all(&frame).await?;
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
