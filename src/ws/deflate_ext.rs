// Copyright 2023 Divy Srivastava <dj.srivastava23@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! permessage-deflate extension (RFC 7692; spec §4.6).
//!
//! Ties the RSV1 bit and the `00 00 FF FF` sync-flush tail convention
//! to the streaming codec in [`crate::deflate`]. The teacher's
//! `inflate_payload` only ever decompresses one whole message at a
//! time and always appends the sync-flush tail before inflating
//! (`examples/willrnch-fastwebsockets/src/lib.rs`); this module keeps
//! that same tail convention but makes both compression and
//! context-takeover policy configurable, since a sans-io protocol
//! layer needs to support both directions and both takeover modes.

use crate::deflate::{Deflator, Flush, Inflator};
use crate::error::DeflateError;

/// RFC 7692 §7.2.1's fixed 4-byte sync-flush tail, stripped from a
/// compressed message before inflation and re-appended (logically)
/// when encoding one.
pub const SYNC_FLUSH_TAIL: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// Negotiated permessage-deflate parameters (spec §4.6).
#[derive(Clone, Copy, Debug)]
pub struct Params {
  pub server_no_context_takeover: bool,
  pub client_no_context_takeover: bool,
  pub server_max_window_bits: i32,
  pub client_max_window_bits: i32,
}

impl Default for Params {
  fn default() -> Self {
    Self { server_no_context_takeover: false, client_no_context_takeover: false, server_max_window_bits: 15, client_max_window_bits: 15 }
  }
}

/// Per-connection permessage-deflate codec: one compressor for
/// outgoing messages, one decompressor for incoming ones. `is_server`
/// picks which side of `Params`' window-bits/no-context-takeover pair
/// applies to which direction.
pub struct PerMessageDeflate {
  deflator: Deflator,
  inflator: Inflator,
  reset_deflator_after_message: bool,
  reset_inflator_after_message: bool,
}

impl PerMessageDeflate {
  pub fn new(params: Params, is_server: bool) -> Self {
    let (send_bits, send_reset, recv_bits, recv_reset) = if is_server {
      (params.server_max_window_bits, params.server_no_context_takeover, params.client_max_window_bits, params.client_no_context_takeover)
    } else {
      (params.client_max_window_bits, params.client_no_context_takeover, params.server_max_window_bits, params.server_no_context_takeover)
    };
    Self {
      deflator: Deflator::new(6, -send_bits),
      inflator: Inflator::new(),
      reset_deflator_after_message: send_reset,
      reset_inflator_after_message: recv_reset,
    }
    .tap_window(recv_bits)
  }

  fn tap_window(self, _recv_bits: i32) -> Self {
    // `Inflator` auto-detects the window size from the stream itself
    // for raw deflate; `recv_bits` only bounds the *sender's* encoder,
    // so there is nothing further to configure here.
    self
  }

  /// Compress one whole message payload, tagging the result for RSV1
  /// use by the caller (spec §4.6: "RSV1 tagging"). The sync-flush
  /// tail is stripped from the returned bytes, per RFC 7692 §7.2.1.
  pub fn compress_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, DeflateError> {
    let mut out = vec![0u8; payload.len() + 64];
    let mut total_written = 0usize;
    let mut input = payload;
    loop {
      if total_written == out.len() {
        out.resize(out.len() * 2, 0);
      }
      let (consumed, written, status) = self.deflator.process(input, &mut out[total_written..], Flush::Sync)?;
      if consumed == 0 && written == 0 && !input.is_empty() {
        return Err(DeflateError::DataError);
      }
      input = &input[consumed..];
      total_written += written;
      if input.is_empty() {
        if status == crate::deflate::Status::StreamEnd || consumed == 0 {
          break;
        }
      }
    }
    out.truncate(total_written);
    if out.ends_with(&SYNC_FLUSH_TAIL) {
      out.truncate(out.len() - 4);
    }
    if self.reset_deflator_after_message {
      self.deflator.reset();
    }
    Ok(out)
  }

  /// Decompress one whole message payload whose RSV1 bit was set
  /// (spec §4.6), re-appending the sync-flush tail before inflating.
  pub fn decompress_message(&mut self, payload: &[u8], max_output: usize) -> Result<Vec<u8>, DeflateError> {
    let mut input = Vec::with_capacity(payload.len() + 4);
    input.extend_from_slice(payload);
    input.extend_from_slice(&SYNC_FLUSH_TAIL);

    let mut out = vec![0u8; (payload.len() * 3 + 64).min(max_output.max(64))];
    let mut total_written = 0usize;
    let mut remaining: &[u8] = &input;
    loop {
      if total_written == out.len() {
        if out.len() >= max_output {
          return Err(DeflateError::BufError);
        }
        let new_len = (out.len() * 2).min(max_output);
        out.resize(new_len, 0);
      }
      let (consumed, written, _status) = self.inflator.process(remaining, &mut out[total_written..], Flush::Sync)?;
      if consumed == 0 && written == 0 {
        return Err(DeflateError::DataError);
      }
      remaining = &remaining[consumed..];
      total_written += written;
      if remaining.is_empty() {
        break;
      }
    }
    out.truncate(total_written);
    if self.reset_inflator_after_message {
      self.inflator.reset();
    }
    Ok(out)
  }
}
