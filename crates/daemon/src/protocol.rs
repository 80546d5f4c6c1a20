// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for the control socket.
//!
//! One frame is `2B magic | 4B length | payload | 4B CRC32`, all fields
//! little-endian. The length field holds the total frame size minus
//! one; the CRC32 (IEEE polynomial) covers every byte before the CRC
//! field. Commands and replies use distinct magic words.
//!
//! Decoding is deliberately lenient, as fits a local trusted link: a
//! wrong magic word discards the whole buffer (resynchronization by
//! drop, no forward scan), and a frame with a bad CRC is dropped
//! silently while the stream continues with the next frame.

use std::collections::VecDeque;

use crc::{Crc, CRC_32_ISO_HDLC};

/// Client-to-server frames.
pub const COMMAND_MAGIC: [u8; 2] = [0x02, 0xB7];

/// Server-to-client frames.
pub const REPLY_MAGIC: [u8; 2] = [0x46, 0x17];

/// Magic word + length field.
const HEADER_LEN: usize = 6;

/// Smallest possible frame: header plus CRC, empty payload.
const MIN_FRAME_LEN: usize = 10;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Build one frame around `payload`.
pub fn encode_frame(magic: [u8; 2], payload: &[u8]) -> Vec<u8> {
    let total = MIN_FRAME_LEN + payload.len();
    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&magic);
    frame.extend_from_slice(&((total - 1) as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    let crc = CRC32.checksum(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

/// Incremental frame decoder for one direction of a stream.
pub struct FrameDecoder {
    magic: [u8; 2],
    buffer: Vec<u8>,
    payloads: VecDeque<Vec<u8>>,
}

impl FrameDecoder {
    pub fn new(magic: [u8; 2]) -> Self {
        Self {
            magic,
            buffer: Vec::new(),
            payloads: VecDeque::new(),
        }
    }

    /// Append received bytes and drain any complete frames.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        self.drain();
    }

    /// Next decoded payload in arrival order, removing it.
    pub fn next_payload(&mut self) -> Option<Vec<u8>> {
        self.payloads.pop_front()
    }

    fn drain(&mut self) {
        while self.buffer.len() >= MIN_FRAME_LEN {
            if self.buffer[..2] != self.magic {
                // Resynchronization policy: drop everything buffered.
                self.buffer.clear();
                return;
            }
            let total = match frame_total_len(&self.buffer) {
                Some(total) => total,
                None => {
                    // A length below the minimal frame means the stream
                    // is corrupt; same drop policy as a bad magic word.
                    self.buffer.clear();
                    return;
                }
            };
            if self.buffer.len() < total {
                return; // incomplete frame, wait for more bytes
            }
            let expected = CRC32.checksum(&self.buffer[..total - 4]);
            let received = u32::from_le_bytes([
                self.buffer[total - 4],
                self.buffer[total - 3],
                self.buffer[total - 2],
                self.buffer[total - 1],
            ]);
            if expected == received {
                self.payloads
                    .push_back(self.buffer[HEADER_LEN..total - 4].to_vec());
            }
            // Bad CRC: drop the frame silently, keep the stream.
            self.buffer.drain(..total);
        }
    }
}

/// Total frame size encoded in the length field, or `None` if it cannot
/// be a frame.
fn frame_total_len(buffer: &[u8]) -> Option<usize> {
    let total = u32::from_le_bytes([buffer[2], buffer[3], buffer[4], buffer[5]]) as usize + 1;
    (total >= MIN_FRAME_LEN).then_some(total)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
