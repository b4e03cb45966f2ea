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

//! `wire_proto` is sans-io wire-format machinery for HTTP/1.x and
//! WebSocket (RFC 6455): a buffer abstraction, a streaming UTF-8
//! validator, an incremental HTTP/1 parser and lazy serializer, a
//! WebSocket frame codec and protocol state machine, and a
//! permessage-deflate (RFC 7692) extension over a streaming
//! DEFLATE/INFLATE codec.
//!
//! Every type here is driven by byte slices the caller already has in
//! memory; nothing in this crate reads from or writes to a socket,
//! spawns a task, or assumes any particular async runtime. Pair it with
//! whatever transport and executor fit your application.
//!
//! # Example
//!
//! ```
//! use wire_proto::http::{Header, Message, Method, OwnedBody};
//! use wire_proto::http::serializer::{Piece, Serializer};
//!
//! let mut msg = Message::new(Header::new_request(Method::Get, "/", 11), OwnedBody(Vec::new()));
//! let mut ser = Serializer::new(&mut msg).unwrap();
//! let mut out = Vec::new();
//! loop {
//!   match ser.next(&msg.body).unwrap() {
//!     Piece::Header(b) | Piece::Body(b) | Piece::ChunkBody(b) | Piece::ChunkEnd(b) => out.extend_from_slice(b),
//!     Piece::Done => break,
//!   }
//! }
//! assert!(out.starts_with(b"GET / HTTP/1.1\r\n"));
//! ```

pub mod buffer;
pub mod deflate;
pub mod error;
pub mod http;
pub mod utf8;
pub mod ws;

pub use error::{DeflateError, Error, HttpError, WsError};
