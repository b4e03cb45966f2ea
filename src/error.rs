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

//! Error taxonomy (spec §7).
//!
//! Every fallible operation in this crate returns one of the families
//! below. `need_more` is intentionally its own variant on [`HttpError`]
//! and [`WsError`] rather than folded into a generic "parse error" so
//! that callers can match on it without inspecting a string: it is the
//! only soft, non-latching status in the whole taxonomy.

use thiserror::Error;

/// Errors produced while parsing or serializing an HTTP/1 message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
  /// Not a failure: the parser needs more bytes before it can make
  /// progress. The parser's internal position is unchanged; feed more
  /// bytes and call `put` again.
  #[error("need more data")]
  NeedMore,

  #[error("stream ended before the message was complete")]
  EndOfStream,

  #[error("invalid request method")]
  BadMethod,
  #[error("invalid request-target")]
  BadTarget,
  #[error("invalid HTTP version")]
  BadVersion,
  #[error("invalid status code")]
  BadStatus,
  #[error("invalid reason phrase")]
  BadReason,
  #[error("invalid header field")]
  BadField,
  #[error("invalid header field value")]
  BadValue,
  #[error("invalid line ending")]
  BadLineEnding,
  #[error("invalid Content-Length")]
  BadContentLength,
  #[error("invalid Transfer-Encoding")]
  BadTransferEncoding,
  #[error("invalid chunk header")]
  BadChunk,
  #[error("invalid chunk extension")]
  BadChunkExtension,
  #[error("obsolete line folding is not supported")]
  BadObsFold,

  #[error("configured maximum body size exceeded")]
  BodyLimit,
  #[error("configured maximum header size exceeded")]
  HeaderLimit,

  #[error("body sink has no space to accept more data")]
  NeedBuffer,
  #[error("body sink capacity exceeded")]
  BufferOverflow,
}

impl HttpError {
  /// `true` for the one soft/non-latching status in this family.
  pub fn is_need_more(&self) -> bool {
    matches!(self, HttpError::NeedMore)
  }
}

/// Errors produced by the WebSocket frame codec and protocol state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WsError {
  /// Not a failure: the frame codec needs more bytes to complete the
  /// frame header or payload currently being read.
  #[error("need more data")]
  NeedMore,

  #[error("connection closed")]
  ConnectionClosed,
  #[error("stream ended before a complete frame was received")]
  UnexpectedEof,

  #[error("invalid or reserved opcode")]
  BadOpcode,
  #[error("non-continuation data frame received while a message was open")]
  BadDataFrame,
  #[error("continuation frame received with no message open")]
  BadContinuation,
  #[error("reserved bits set without a negotiated extension")]
  BadReservedBits,
  #[error("control frame was fragmented")]
  BadControlFragment,
  #[error("control frame payload exceeds 125 bytes")]
  BadControlSize,
  #[error("invalid WebSocket close code")]
  BadCloseCode,
  #[error("close frame payload must be empty or at least 2 bytes")]
  BadCloseSize,
  #[error("close frame reason is not valid UTF-8")]
  BadClosePayload,
  #[error("masking key required but absent, or present but not allowed")]
  BadMaskingKey,
  #[error("frame violates masking requirements for this role")]
  BadUnmaskedFrame,
  #[error("payload length used a non-minimal encoding")]
  BadSize,
  #[error("frame payload exceeds the configured maximum message size")]
  MessageTooLarge,

  #[error("message text is not valid UTF-8")]
  InvalidUtf8,

  #[error(transparent)]
  Deflate(#[from] DeflateError),
}

impl WsError {
  pub fn is_need_more(&self) -> bool {
    matches!(self, WsError::NeedMore)
  }

  /// The close code that must be sent when this error aborts a
  /// connection, per spec §7 ("UTF-8 errors on text WebSocket frames
  /// trigger a close with code 1007") and RFC 6455 §7.4.
  pub fn close_code(&self) -> u16 {
    match self {
      WsError::InvalidUtf8 | WsError::BadClosePayload => 1007,
      WsError::BadOpcode
      | WsError::BadDataFrame
      | WsError::BadContinuation
      | WsError::BadReservedBits
      | WsError::BadControlFragment
      | WsError::BadCloseCode
      | WsError::BadMaskingKey
      | WsError::BadUnmaskedFrame
      | WsError::BadSize => 1002,
      WsError::MessageTooLarge => 1009,
      _ => 1002,
    }
  }
}

/// Errors produced by the streaming DEFLATE/INFLATE codec (spec §4.6,
/// RFC 1951). Names follow zlib's status vocabulary, as referenced by
/// spec §7.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeflateError {
  #[error("need more input")]
  NeedMoreInput,
  #[error("need more output space")]
  NeedMoreOutput,
  #[error("need output and input buffers")]
  NeedBuffers,
  #[error("a preset dictionary is required")]
  NeedDict,
  #[error("inconsistent stream state")]
  StreamError,
  #[error("the compressed data is corrupt")]
  DataError,
  #[error("insufficient memory")]
  MemError,
  #[error("output buffer is too small")]
  BufError,
  #[error("incompatible codec version")]
  VersionError,
}

/// Top-level error, for call sites that work across more than one
/// family (e.g. the WebSocket upgrade path, which parses an HTTP
/// request and then runs the WS state machine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error(transparent)]
  Http(#[from] HttpError),
  #[error(transparent)]
  Ws(#[from] WsError),
  #[error(transparent)]
  Deflate(#[from] DeflateError),
}
