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

//! HTTP message data model (spec §3 "HTTP message").

use crate::http::body::Body;
use crate::http::fields::Fields;
use crate::http::method::Method;

/// The start line: request-line or status-line, depending on which
/// side of the connection this message is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartLine {
  Request { method: Method, target: Box<str> },
  Response { status: u16, reason: Option<Box<str>> },
}

impl StartLine {
  pub fn is_request(&self) -> bool {
    matches!(self, StartLine::Request { .. })
  }
}

/// Version (major*10 + minor), and start line plus fields (spec §3:
/// "version... and one of: request variant... response variant").
pub struct Header {
  pub version: u8,
  pub start: StartLine,
  pub fields: Fields,
}

impl Header {
  pub fn new_request(method: Method, target: impl Into<Box<str>>, version: u8) -> Self {
    Self {
      version,
      start: StartLine::Request { method, target: target.into() },
      fields: Fields::new(),
    }
  }

  pub fn new_response(status: u16, version: u8) -> Self {
    Self {
      version,
      start: StartLine::Response { status, reason: None },
      fields: Fields::new(),
    }
  }

  pub fn is_request(&self) -> bool {
    self.start.is_request()
  }

  pub fn method(&self) -> Option<&Method> {
    match &self.start {
      StartLine::Request { method, .. } => Some(method),
      StartLine::Response { .. } => None,
    }
  }

  pub fn target(&self) -> Option<&str> {
    match &self.start {
      StartLine::Request { target, .. } => Some(target),
      StartLine::Response { .. } => None,
    }
  }

  pub fn status(&self) -> Option<u16> {
    match &self.start {
      StartLine::Response { status, .. } => Some(*status),
      StartLine::Request { .. } => None,
    }
  }

  pub fn reason(&self) -> Option<&str> {
    match &self.start {
      StartLine::Response { reason, .. } => reason.as_deref(),
      StartLine::Request { .. } => None,
    }
  }

  /// `true` if "close" is present in the Connection field (spec §3/
  /// Beast `message::has_close`).
  pub fn has_close(&self) -> bool {
    self.fields.connection_tokens().iter().any(|t| t.eq_ignore_ascii_case("close"))
  }

  /// `true` if "chunked" is the last Transfer-Encoding token (spec
  /// §4.2: "last token must be chunked to enable chunked mode").
  pub fn has_chunked(&self) -> bool {
    matches!(self.fields.transfer_encoding_tokens().last(), Some(t) if t.eq_ignore_ascii_case("chunked"))
  }

  pub fn has_content_length(&self) -> bool {
    self.fields.contains("Content-Length")
  }

  /// `true` if Connection names "upgrade" (spec §4.2: "upgrade forces
  /// upgrade semantics regardless of status").
  pub fn is_upgrade(&self) -> bool {
    self.fields.connection_tokens().iter().any(|t| t.eq_ignore_ascii_case("upgrade"))
      && self.fields.contains("Upgrade")
  }

  /// HTTP/1.1 keep-alive by default, HTTP/1.0 close by default, unless
  /// overridden by the Connection field (spec §4.3 `keep_alive`/Beast
  /// `is_keep_alive`).
  pub fn is_keep_alive(&self) -> bool {
    let tokens = self.fields.connection_tokens();
    let has = |t: &str| tokens.iter().any(|x| x.eq_ignore_ascii_case(t));
    if self.version >= 11 {
      !has("close")
    } else {
      has("keep-alive")
    }
  }
}

/// A complete HTTP message: header plus a polymorphic body (spec §3).
pub struct Message<B: Body> {
  pub header: Header,
  pub body: B,
}

impl<B: Body> Message<B> {
  pub fn new(header: Header, body: B) -> Self {
    Self { header, body }
  }

  /// Payload size in octets if known ahead of time (spec: message
  /// `size()`; `None` usually means a chunked Transfer-Encoding will be
  /// used).
  pub fn size(&self) -> Option<u64> {
    self.body.size()
  }

  /// Unconditionally set the Content-Length field (spec:
  /// `message::content_length`).
  pub fn set_content_length(&mut self, n: u64) {
    self.header.fields.remove_all("Transfer-Encoding");
    self.header.fields.set("Content-Length", &n.to_string());
  }
}

pub type Request<B> = Message<B>;
pub type Response<B> = Message<B>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::body::EmptyBody;

  #[test]
  fn keep_alive_defaults_by_version() {
    let h11 = Header::new_request(Method::Get, "/", 11);
    assert!(h11.is_keep_alive());
    let h10 = Header::new_request(Method::Get, "/", 10);
    assert!(!h10.is_keep_alive());
  }

  #[test]
  fn content_length_strips_transfer_encoding() {
    let mut msg = Message::new(Header::new_response(200, 11), EmptyBody);
    msg.header.fields.append("Transfer-Encoding", "chunked");
    msg.set_content_length(5);
    assert!(!msg.header.fields.contains("Transfer-Encoding"));
    assert_eq!(msg.header.fields.get("Content-Length"), Some("5"));
  }
}
