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

//! Streaming DEFLATE/INFLATE codec (RFC 1951; spec §4.6), wrapping
//! `miniz_oxide`'s raw streaming API rather than hand-rolling the
//! Huffman/LZ77 machinery.
//!
//! Grounded on `examples/willrnch-fastwebsockets/src/lib.rs`'s
//! `inflate_payload`, which already reaches for
//! `miniz_oxide::inflate::stream` for permessage-deflate decompression;
//! this module generalizes that single-shot call into a reusable
//! streaming wrapper (so a context can be kept across messages when
//! `no_context_takeover` is not negotiated) and adds the matching
//! compressor side, which the teacher doesn't need since it never
//! sends compressed frames.
//!
//! Per spec §9 Open Question: the exact byte sequence an encoder
//! produces is implementation-defined by RFC 1951; only round-trip
//! correctness against a conforming decoder is required, so this
//! module does not attempt to byte-match any particular reference
//! encoder's output.

use miniz_oxide::deflate::core::{create_comp_flags_from_zip_params, CompressorOxide};
use miniz_oxide::deflate::stream::deflate as deflate_stream;
use miniz_oxide::inflate::stream::{inflate as inflate_stream, InflateState};
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};

use crate::error::DeflateError;

/// Flush mode for one `process` call (spec §4.6 "flush modes").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flush {
  /// Buffer as much as beneficial; more input may follow.
  None,
  /// Emit enough output to byte-align and flush all pending input,
  /// ending with the RFC 7692 sync-flush marker `00 00 FF FF` when used
  /// by the permessage-deflate layer.
  Sync,
  /// No more input will follow; finalize the stream.
  Finish,
}

impl Flush {
  fn to_mz(self) -> MZFlush {
    match self {
      Flush::None => MZFlush::None,
      Flush::Sync => MZFlush::Sync,
      Flush::Finish => MZFlush::Finish,
    }
  }
}

/// Outcome of one `process` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
  /// Made progress; call again with more input/output space.
  Ok,
  /// The stream reached its natural end (only after `Flush::Finish`).
  StreamEnd,
}

fn map_status(result: Result<MZStatus, MZError>) -> Result<Status, DeflateError> {
  match result {
    Ok(MZStatus::Ok) => Ok(Status::Ok),
    Ok(MZStatus::StreamEnd) => Ok(Status::StreamEnd),
    Ok(MZStatus::NeedDict) => Err(DeflateError::NeedDict),
    Err(MZError::Buf) => Ok(Status::Ok),
    Err(MZError::Param) => Err(DeflateError::StreamError),
    Err(MZError::Data) => Err(DeflateError::DataError),
    Err(MZError::Stream) => Err(DeflateError::StreamError),
    Err(MZError::Memory) => Err(DeflateError::MemError),
    Err(MZError::Version) => Err(DeflateError::VersionError),
  }
}

/// A streaming DEFLATE compressor over raw (headerless) deflate
/// streams, as permessage-deflate requires (RFC 7692 §7.2.1).
pub struct Deflator {
  inner: CompressorOxide,
}

impl Deflator {
  /// `level` is 0-10 (miniz_oxide's scale); `window_bits` is negative
  /// per zlib convention for raw streams (e.g. `-15` for a 32K window).
  pub fn new(level: u8, window_bits: i32) -> Self {
    let flags = create_comp_flags_from_zip_params(level as i32, window_bits, 0);
    Self { inner: CompressorOxide::new(flags) }
  }

  /// Reset the compressor's sliding window, as required between
  /// messages when `server_no_context_takeover`/
  /// `client_no_context_takeover` was negotiated (spec §4.6).
  pub fn reset(&mut self) {
    self.inner.reset();
  }

  /// Compress as much of `input` into `output` as fits, returning
  /// `(bytes_consumed, bytes_written, status)`.
  pub fn process(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<(usize, usize, Status), DeflateError> {
    let r = deflate_stream(&mut self.inner, input, output, flush.to_mz());
    let status = map_status(r.status)?;
    Ok((r.bytes_consumed, r.bytes_written, status))
  }
}

/// A streaming raw-DEFLATE decompressor.
pub struct Inflator {
  inner: Box<InflateState>,
}

impl Default for Inflator {
  fn default() -> Self {
    Self::new()
  }
}

impl Inflator {
  pub fn new() -> Self {
    Self { inner: InflateState::new_boxed(DataFormat::Raw) }
  }

  /// Reset decompressor state, mirroring [`Deflator::reset`].
  pub fn reset(&mut self) {
    self.inner.reset(DataFormat::Raw);
  }

  pub fn process(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<(usize, usize, Status), DeflateError> {
    let r = inflate_stream(&mut self.inner, input, output, flush.to_mz());
    let status = map_status(r.status)?;
    Ok((r.bytes_consumed, r.bytes_written, status))
  }
}
