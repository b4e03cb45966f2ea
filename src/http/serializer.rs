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

//! Lazy HTTP/1 serializer (spec §3 "Serializer", §4.3).
//!
//! Grounded on Boost.Beast's `serializer`, which never materializes
//! the whole message at once: it hands the caller one piece at a time
//! (header, then successive body chunks) so the caller can write
//! directly to its own transport without an intermediate copy. Here
//! that shows up as [`Serializer::next`] returning borrowed
//! [`Piece`]s instead of writing into a socket itself, keeping this
//! crate transport-agnostic.

use std::io::Read;

use crate::error::HttpError;
use crate::http::body::Body;
use crate::http::message::Message;

/// One piece of serialized output. Feed each piece's bytes to the
/// transport in order; call [`Serializer::next`] again for the next
/// one until `Piece::Done` is returned.
pub enum Piece<'a> {
  Header(&'a [u8]),
  Body(&'a [u8]),
  ChunkBody(&'a [u8]),
  /// Chunk terminator, including the trailing zero-sized chunk: the
  /// literal bytes `"0\r\n\r\n"`.
  ChunkEnd(&'a [u8]),
  Done,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
  Header,
  Body,
  ChunkEnd,
  Done,
}

/// Serializes one [`Message`] into a stream of [`Piece`]s.
pub struct Serializer {
  header: Vec<u8>,
  header_sent: usize,
  stage: Stage,
  chunked: bool,
  scratch: Vec<u8>,
  body_buf: Vec<u8>,
}

impl Serializer {
  /// Build a serializer for `msg`, first deriving the payload framing
  /// (spec §4.3 `prepare_payload`): a Content-Length header is set if
  /// the body size is known and no framing header was already chosen
  /// by the caller; otherwise the message is sent chunked.
  pub fn new<B: Body>(msg: &mut Message<B>) -> Result<Self, HttpError> {
    prepare_payload(msg)?;
    let chunked = msg.header.fields.get("Transfer-Encoding").map(|v| v.eq_ignore_ascii_case("chunked")).unwrap_or(false);
    let header = render_header(msg);
    Ok(Self {
      header,
      header_sent: 0,
      stage: Stage::Header,
      chunked,
      scratch: Vec::new(),
      body_buf: vec![0u8; 64 * 1024],
    })
  }

  pub fn is_done(&self) -> bool {
    self.stage == Stage::Done
  }

  /// Produce the next piece of output, reading body bytes out of
  /// `body` as needed. Returns `Piece::Done` once the whole message
  /// has been emitted.
  pub fn next<'a, B: Body>(&'a mut self, body: &B) -> Result<Piece<'a>, HttpError> {
    match self.stage {
      Stage::Header => {
        if self.header_sent < self.header.len() {
          let piece = &self.header[self.header_sent..];
          self.header_sent = self.header.len();
          self.stage = Stage::Body;
          Ok(Piece::Header(piece))
        } else {
          self.stage = Stage::Body;
          self.next(body)
        }
      }
      Stage::Body => {
        let mut reader = body.reader();
        let n = reader.read(&mut self.body_buf).map_err(|_| HttpError::BufferOverflow)?;
        if n == 0 {
          self.stage = if self.chunked { Stage::ChunkEnd } else { Stage::Done };
          return self.next(body);
        }
        if self.chunked {
          self.scratch.clear();
          self.scratch.extend_from_slice(format!("{n:x}\r\n").as_bytes());
          self.scratch.extend_from_slice(&self.body_buf[..n]);
          self.scratch.extend_from_slice(b"\r\n");
          Ok(Piece::ChunkBody(&self.scratch))
        } else {
          Ok(Piece::Body(&self.body_buf[..n]))
        }
      }
      Stage::ChunkEnd => {
        self.stage = Stage::Done;
        self.scratch.clear();
        self.scratch.extend_from_slice(b"0\r\n\r\n");
        Ok(Piece::ChunkEnd(&self.scratch))
      }
      Stage::Done => Ok(Piece::Done),
    }
  }
}

/// Derive Content-Length vs chunked framing, honoring whatever the
/// caller already set explicitly (spec §4.3).
pub fn prepare_payload<B: Body>(msg: &mut Message<B>) -> Result<(), HttpError> {
  let has_cl = msg.header.fields.contains("Content-Length");
  let has_te = msg.header.fields.contains("Transfer-Encoding");
  if has_cl && has_te {
    return Err(HttpError::BadContentLength);
  }
  if has_cl || has_te {
    return Ok(());
  }
  match msg.body.size() {
    Some(n) => {
      // GET/HEAD/DELETE-style empty bodies omit Content-Length
      // entirely rather than sending "Content-Length: 0" (spec §4.3).
      let omit_for_empty = n == 0
        && msg
          .header
          .method()
          .map(|m| matches!(m.as_str(), "GET" | "HEAD" | "DELETE"))
          .unwrap_or(false);
      if !omit_for_empty {
        msg.header.fields.set("Content-Length", &n.to_string());
      }
    }
    // HTTP/1.0 has no chunked transfer-coding: an unsized body is left
    // unsized and the connection closes after it (spec §4.3).
    None if msg.header.version >= 11 => chunked(msg, true),
    None => {}
  }
  Ok(())
}

/// Force Content-Length framing, overriding any prior chunked setting
/// (spec §4.3 `content_length`/`chunked` mutual exclusion).
pub fn content_length<B: Body>(msg: &mut Message<B>, n: u64) {
  msg.header.fields.remove_all("Transfer-Encoding");
  msg.header.fields.set("Content-Length", &n.to_string());
}

/// Force or clear chunked framing (spec §4.3).
pub fn chunked<B: Body>(msg: &mut Message<B>, on: bool) {
  msg.header.fields.remove_all("Content-Length");
  if on {
    msg.header.fields.set("Transfer-Encoding", "chunked");
  } else {
    msg.header.fields.remove_all("Transfer-Encoding");
  }
}

/// Rewrite the Connection field to request or refuse persistence,
/// editing only the `close`/`keep-alive` tokens and leaving every
/// other token (e.g. `upgrade`) in place and in order (spec §4.3
/// `keep_alive`: "all token edits preserve case-insensitive
/// deduplication and order").
pub fn keep_alive<B: Body>(msg: &mut Message<B>, on: bool) {
  if msg.header.version >= 11 {
    if on {
      set_connection_token(msg, "keep-alive", false);
      set_connection_token(msg, "close", false);
    } else {
      set_connection_token(msg, "keep-alive", false);
      set_connection_token(msg, "close", true);
    }
  } else if on {
    set_connection_token(msg, "keep-alive", true);
  } else {
    set_connection_token(msg, "keep-alive", false);
    set_connection_token(msg, "close", true);
  }
}

/// Insert or remove a single case-insensitive token in the Connection
/// field, preserving every other token and their relative order.
fn set_connection_token<B: Body>(msg: &mut Message<B>, token: &str, present: bool) {
  let mut tokens = msg.header.fields.connection_tokens();
  tokens.retain(|t| !t.eq_ignore_ascii_case(token));
  if present {
    tokens.push(token.to_string());
  }
  if tokens.is_empty() {
    msg.header.fields.remove_all("Connection");
  } else {
    msg.header.fields.set("Connection", &tokens.join(", "));
  }
}

fn render_header<B: Body>(msg: &Message<B>) -> Vec<u8> {
  use crate::http::message::StartLine;
  use crate::http::status::standard_reason;

  let mut out = Vec::with_capacity(256);
  match &msg.header.start {
    StartLine::Request { method, target } => {
      out.extend_from_slice(method.as_str().as_bytes());
      out.push(b' ');
      out.extend_from_slice(target.as_bytes());
      out.extend_from_slice(format!(" HTTP/1.{}\r\n", msg.header.version % 10).as_bytes());
    }
    StartLine::Response { status, reason } => {
      out.extend_from_slice(format!("HTTP/1.{} {} ", msg.header.version % 10, status).as_bytes());
      match reason {
        Some(r) => out.extend_from_slice(r.as_bytes()),
        None => out.extend_from_slice(standard_reason(*status).as_bytes()),
      }
      out.extend_from_slice(b"\r\n");
    }
  }
  for (name, value) in msg.header.fields.iter() {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
  }
  out.extend_from_slice(b"\r\n");
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::body::OwnedBody;
  use crate::http::message::Header;
  use crate::http::method::Method;

  fn collect<B: Body>(msg: &mut Message<B>) -> Vec<u8> {
    let mut ser = Serializer::new(msg).unwrap();
    let mut out = Vec::new();
    loop {
      match ser.next(&msg.body).unwrap() {
        Piece::Header(b) | Piece::Body(b) | Piece::ChunkBody(b) | Piece::ChunkEnd(b) => out.extend_from_slice(b),
        Piece::Done => break,
      }
    }
    out
  }

  #[test]
  fn identity_body_sets_content_length() {
    let mut msg = Message::new(Header::new_response(200, 11), OwnedBody(b"hi".to_vec()));
    let out = collect(&mut msg);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Length: 2\r\n"));
    assert!(text.ends_with("\r\n\r\nhi"));
  }

  #[test]
  fn get_with_empty_body_omits_content_length() {
    let mut msg = Message::new(Header::new_request(Method::Get, "/", 11), OwnedBody(Vec::new()));
    let out = collect(&mut msg);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("GET / HTTP/1.1\r\n"));
    assert!(!text.contains("Content-Length"));
  }

  #[test]
  fn keep_alive_false_sets_connection_close() {
    let mut msg = Message::new(Header::new_response(200, 11), OwnedBody(Vec::new()));
    keep_alive(&mut msg, false);
    let out = collect(&mut msg);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Connection: close\r\n"));
  }

  #[test]
  fn keep_alive_preserves_unrelated_connection_tokens() {
    let mut msg = Message::new(Header::new_response(101, 11), OwnedBody(Vec::new()));
    msg.header.fields.append("Connection", "upgrade");
    keep_alive(&mut msg, true);
    let out = collect(&mut msg);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("upgrade"), "upgrade token must survive: {text}");
    assert!(!text.contains("close"), "keep_alive(true) must not add close: {text}");

    let mut msg2 = Message::new(Header::new_response(101, 11), OwnedBody(Vec::new()));
    msg2.header.fields.append("Connection", "upgrade");
    keep_alive(&mut msg2, false);
    let out2 = collect(&mut msg2);
    let text2 = String::from_utf8(out2).unwrap();
    assert!(text2.contains("upgrade"), "upgrade token must survive: {text2}");
    assert!(text2.contains("close"), "keep_alive(false) must add close: {text2}");
  }

  struct UnsizedBody;

  impl Body for UnsizedBody {
    fn size(&self) -> Option<u64> {
      None
    }

    fn reader(&self) -> Box<dyn Read + '_> {
      Box::new(std::io::empty())
    }
  }

  #[test]
  fn unsized_body_on_http_11_uses_chunked() {
    let mut msg = Message::new(Header::new_response(200, 11), UnsizedBody);
    prepare_payload(&mut msg).unwrap();
    assert_eq!(msg.header.fields.transfer_encoding_tokens(), vec!["chunked"]);
    assert!(!msg.header.fields.contains("Content-Length"));
  }

  #[test]
  fn unsized_body_on_http_10_stays_unsized() {
    let mut msg = Message::new(Header::new_response(200, 10), UnsizedBody);
    prepare_payload(&mut msg).unwrap();
    assert!(!msg.header.fields.contains("Transfer-Encoding"));
    assert!(!msg.header.fields.contains("Content-Length"));
  }
}
