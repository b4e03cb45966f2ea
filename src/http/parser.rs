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

//! Incremental HTTP/1 push parser (spec §3 "Parser state", §4.2).
//!
//! Generalized from Boost.Beast's CRTP `basic_parser`
//! (`examples/original_source/include/beast/http/basic_parser.hpp`):
//! the derived-class callback methods collapse into one
//! [`ParserCallbacks`] trait (per spec §9 Design Notes), and the
//! `(bytes_consumed, error_code)` out-parameter pair becomes a single
//! `Result<usize, HttpError>` where [`HttpError::NeedMore`] is the one
//! non-latching status.

use crate::http::fields::Fields;
use crate::http::method::Method;
use crate::http::status::never_has_body;
use crate::error::HttpError;

/// Parser state (spec §3 "Parser state"; state machine in spec §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
  NothingYet,
  Header,
  BodyIdentity,
  BodyChunkHeader,
  BodyChunk,
  /// Reading trailer fields after the terminal 0-sized chunk, before
  /// the final blank line.
  Trailer,
  BodyToEof,
  Complete,
}

/// Callbacks a parser user supplies; every method has a default no-op
/// body, since most consumers only care about a handful of them (spec
/// §4.2 "Callbacks").
#[allow(unused_variables)]
pub trait ParserCallbacks {
  fn on_start_request(&mut self, method: &Method, target: &str, version: u8) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_start_response(&mut self, status: u16, reason: &str, version: u8) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_field(&mut self, name: &str, value: &str) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_header_complete(&mut self) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_body(&mut self, content_length_hint: Option<u64>) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_data(&mut self, data: &[u8]) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_chunk(&mut self, length: u64, extensions: &str) -> Result<(), HttpError> {
    Ok(())
  }
  fn on_complete(&mut self) -> Result<(), HttpError> {
    Ok(())
  }
}

#[derive(Default)]
struct Flags {
  skip_body: bool,
  eager: bool,
  got_some: bool,
  has_body: bool,
  http11: bool,
  need_eof: bool,
  final_chunk_seen: bool,
  connection_close: bool,
  connection_upgrade: bool,
  connection_keep_alive: bool,
  content_length_present: bool,
  chunked: bool,
  upgrade: bool,
}

/// Incremental HTTP/1 parser. One instance parses exactly one message;
/// construct a new one for the next message on the same connection.
pub struct Parser {
  is_request: bool,
  state: State,
  flags: Flags,
  remaining: u64,
  content_length: Option<u64>,
  /// Search-resume offset into the not-yet-matched header prefix, so
  /// repeated `put` calls don't rescan bytes already known not to
  /// contain the header terminator (Beast: `skip_`).
  skip: usize,
  max_header_size: usize,
  max_body_size: u64,
  fields: Fields,
  pending_status: Option<u16>,
}

impl Parser {
  pub fn new_request() -> Self {
    Self::new(true)
  }

  pub fn new_response() -> Self {
    Self::new(false)
  }

  fn new(is_request: bool) -> Self {
    Self {
      is_request,
      state: State::NothingYet,
      flags: Flags::default(),
      remaining: 0,
      content_length: None,
      skip: 0,
      max_header_size: 64 * 1024,
      max_body_size: u64::MAX,
      fields: Fields::new(),
      pending_status: None,
    }
  }

  pub fn set_max_header_size(&mut self, n: usize) {
    self.max_header_size = n;
  }

  pub fn set_max_body_size(&mut self, n: u64) {
    self.max_body_size = n;
  }

  /// Set before any bytes are processed (spec §4.2 "skip(bool)").
  pub fn set_skip_body(&mut self, v: bool) {
    self.flags.skip_body = v;
  }

  /// Consume as much as possible per `put` instead of stopping at each
  /// structural boundary (spec §4.2 "Eagerness policy").
  pub fn set_eager(&mut self, v: bool) {
    self.flags.eager = v;
  }

  pub fn state(&self) -> State {
    self.state
  }

  pub fn got_some(&self) -> bool {
    self.flags.got_some
  }

  pub fn is_done(&self) -> bool {
    self.state == State::Complete
  }

  pub fn is_header_done(&self) -> bool {
    !matches!(self.state, State::NothingYet | State::Header)
  }

  pub fn is_upgrade(&self) -> bool {
    self.flags.upgrade
  }

  pub fn is_chunked(&self) -> bool {
    self.flags.chunked
  }

  pub fn need_eof(&self) -> bool {
    self.flags.need_eof
  }

  pub fn content_length(&self) -> Option<u64> {
    self.content_length
  }

  pub fn fields(&self) -> &Fields {
    &self.fields
  }

  /// Feed bytes to the parser. Returns the number of bytes
  /// incorporated; on [`HttpError::NeedMore`] this is always the
  /// number of bytes incorporated *before* the point where more data
  /// was required (never more than `data.len()`), and the caller
  /// should keep those unconsumed bytes at the front of its buffer for
  /// the next `put` call (spec §4.2 "put").
  pub fn put<C: ParserCallbacks>(&mut self, data: &[u8], cb: &mut C) -> Result<usize, HttpError> {
    if !data.is_empty() {
      self.flags.got_some = true;
      if self.state == State::NothingYet {
        self.state = State::Header;
      }
    }

    let mut total = 0usize;
    loop {
      if self.state == State::Complete {
        break;
      }
      let before = total;
      match self.state {
        State::NothingYet => return Err(HttpError::NeedMore),
        State::Header => match self.step_header(&data[total..], cb)? {
          Some(n) => total += n,
          None => {
            if total == 0 {
              return Err(HttpError::NeedMore);
            }
            break;
          }
        },
        State::BodyIdentity => match self.step_body_identity(&data[total..], cb)? {
          Some(n) => total += n,
          None => break,
        },
        State::BodyChunkHeader => match self.step_chunk_header(&data[total..], cb)? {
          Some(n) => total += n,
          None => {
            if total == before && total == 0 {
              return Err(HttpError::NeedMore);
            }
            break;
          }
        },
        State::BodyChunk => match self.step_chunk_body(&data[total..], cb)? {
          Some(n) => total += n,
          None => break,
        },
        State::Trailer => match self.step_trailer(&data[total..], cb)? {
          Some(n) => total += n,
          None => break,
        },
        State::BodyToEof => {
          let chunk = &data[total..];
          if !chunk.is_empty() {
            cb.on_data(chunk)?;
            total += chunk.len();
          }
          break;
        }
        State::Complete => break,
      }
      if !self.flags.eager {
        break;
      }
    }
    Ok(total)
  }

  /// Signal end-of-stream (spec §4.2 "put_eof"). Only meaningful once
  /// [`Parser::need_eof`] is true and the header has been parsed.
  pub fn put_eof<C: ParserCallbacks>(&mut self, cb: &mut C) -> Result<(), HttpError> {
    if self.state == State::BodyToEof {
      self.state = State::Complete;
      cb.on_complete()?;
      Ok(())
    } else if self.state == State::Complete {
      Ok(())
    } else {
      Err(HttpError::EndOfStream)
    }
  }

  // ---- header -----------------------------------------------------

  fn step_header<C: ParserCallbacks>(&mut self, data: &[u8], cb: &mut C) -> Result<Option<usize>, HttpError> {
    let search_from = self.skip.saturating_sub(3).min(data.len());
    let Some(rel) = find(&data[search_from..], b"\r\n\r\n") else {
      self.skip = data.len();
      if data.len() > self.max_header_size {
        return Err(HttpError::HeaderLimit);
      }
      return Ok(None);
    };
    let end = search_from + rel; // index of the first '\r' of the terminator
    if end + 4 > self.max_header_size {
      return Err(HttpError::HeaderLimit);
    }
    let header_block = &data[..end + 2]; // includes the start line's/fields' final CRLF
    self.parse_header_block(header_block, cb)?;
    self.skip = 0;
    cb.on_header_complete()?;
    self.after_header(cb)?;
    Ok(Some(end + 4))
  }

  fn parse_header_block<C: ParserCallbacks>(&mut self, block: &[u8], cb: &mut C) -> Result<(), HttpError> {
    let text = std::str::from_utf8(block).map_err(|_| HttpError::BadField)?;
    let mut lines = text.split("\r\n");
    let start_line = lines.next().ok_or(HttpError::BadVersion)?;
    self.parse_start_line(start_line, cb)?;
    for line in lines {
      if line.is_empty() {
        continue;
      }
      if line.starts_with(' ') || line.starts_with('\t') {
        return Err(HttpError::BadObsFold);
      }
      let Some(colon) = line.find(':') else {
        return Err(HttpError::BadField);
      };
      let name = &line[..colon];
      if name.is_empty() || !name.bytes().all(is_tchar) {
        return Err(HttpError::BadField);
      }
      let value = line[colon + 1..].trim_matches(|c| c == ' ' || c == '\t');
      self.fields.append(name, value);
      cb.on_field(name, value)?;
    }
    Ok(())
  }

  fn parse_start_line<C: ParserCallbacks>(&mut self, line: &str, cb: &mut C) -> Result<(), HttpError> {
    if self.is_request {
      let mut parts = line.splitn(3, ' ');
      let method = parts.next().ok_or(HttpError::BadMethod)?;
      let target = parts.next().ok_or(HttpError::BadTarget)?;
      let version_tok = parts.next().ok_or(HttpError::BadVersion)?;
      if method.is_empty() || !method.bytes().all(is_tchar) {
        return Err(HttpError::BadMethod);
      }
      if target.is_empty() {
        return Err(HttpError::BadTarget);
      }
      let version = parse_version(version_tok)?;
      self.flags.http11 = version >= 11;
      let m = Method::parse(method);
      cb.on_start_request(&m, target, version)?;
    } else {
      let mut parts = line.splitn(3, ' ');
      let version_tok = parts.next().ok_or(HttpError::BadVersion)?;
      let status_tok = parts.next().ok_or(HttpError::BadStatus)?;
      let reason = parts.next().unwrap_or("");
      let version = parse_version(version_tok)?;
      self.flags.http11 = version >= 11;
      if status_tok.len() != 3 || !status_tok.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HttpError::BadStatus);
      }
      let status: u16 = status_tok.parse().map_err(|_| HttpError::BadStatus)?;
      if reason.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(HttpError::BadReason);
      }
      self.pending_status = Some(status);
      cb.on_start_response(status, reason, version)?;
    }
    Ok(())
  }

  fn after_header<C: ParserCallbacks>(&mut self, cb: &mut C) -> Result<(), HttpError> {
    let conn = self.fields.connection_tokens();
    self.flags.connection_close = conn.iter().any(|t| t.eq_ignore_ascii_case("close"));
    self.flags.connection_keep_alive = conn.iter().any(|t| t.eq_ignore_ascii_case("keep-alive"));
    self.flags.connection_upgrade = conn.iter().any(|t| t.eq_ignore_ascii_case("upgrade"));
    self.flags.upgrade = self.flags.connection_upgrade && self.fields.contains("Upgrade");

    let te = self.fields.transfer_encoding_tokens();
    self.flags.chunked = matches!(te.last(), Some(t) if t.eq_ignore_ascii_case("chunked"));
    self.flags.content_length_present = self.fields.contains("Content-Length");

    if self.flags.content_length_present && self.flags.chunked {
      return Err(HttpError::BadContentLength);
    }

    if self.flags.content_length_present {
      let values: Vec<&str> = self.fields.get_all("Content-Length").collect();
      // Open Question (spec §9), resolved: reject multiple
      // Content-Length fields unless every occurrence is byte-identical.
      if let Some(first) = values.first() {
        if values.iter().any(|v| v != first) {
          return Err(HttpError::BadContentLength);
        }
        let n: u64 = first.trim().parse().map_err(|_| HttpError::BadContentLength)?;
        self.content_length = Some(n);
      }
    }

    // A HEAD response must be told apart by the host, which knows the
    // request method; it calls `set_skip_body` before this parser sees
    // any bytes (spec §4.2 "skip(bool)").
    let skip_body = self.flags.skip_body || self.pending_status.map(never_has_body).unwrap_or(false);

    if self.flags.chunked && !te_chunked_is_final_and_well_formed(&te) {
      return Err(HttpError::BadTransferEncoding);
    }

    self.flags.has_body = !skip_body && (self.flags.chunked || self.flags.content_length_present || (!self.is_request));

    if skip_body {
      self.flags.has_body = false;
    }

    if !self.flags.has_body {
      cb.on_body(Some(0))?;
      self.state = State::Complete;
      cb.on_complete()?;
      return Ok(());
    }

    if self.flags.chunked {
      cb.on_body(None)?;
      self.state = State::BodyChunkHeader;
    } else if let Some(n) = self.content_length {
      cb.on_body(Some(n))?;
      self.remaining = n;
      if n == 0 {
        self.state = State::Complete;
        cb.on_complete()?;
      } else {
        self.state = State::BodyIdentity;
      }
    } else if self.is_request {
      // A request with no Content-Length/Transfer-Encoding has no body.
      cb.on_body(Some(0))?;
      self.state = State::Complete;
      cb.on_complete()?;
    } else {
      self.flags.need_eof = true;
      cb.on_body(None)?;
      self.state = State::BodyToEof;
    }
    tracing::trace!(state = ?self.state, chunked = self.flags.chunked, need_eof = self.flags.need_eof, "header parsed, entering body state");
    Ok(())
  }

  // ---- identity body ------------------------------------------------

  fn step_body_identity<C: ParserCallbacks>(&mut self, data: &[u8], cb: &mut C) -> Result<Option<usize>, HttpError> {
    if data.is_empty() {
      return Ok(None);
    }
    let take = (self.remaining.min(data.len() as u64)) as usize;
    if take > 0 {
      cb.on_data(&data[..take])?;
      self.remaining -= take as u64;
    }
    if self.remaining == 0 {
      self.state = State::Complete;
      cb.on_complete()?;
    }
    Ok(Some(take))
  }

  // ---- chunked body --------------------------------------------------

  fn step_chunk_header<C: ParserCallbacks>(&mut self, data: &[u8], cb: &mut C) -> Result<Option<usize>, HttpError> {
    let Some(rel) = find(data, b"\r\n") else {
      if data.len() > 64 * 1024 {
        return Err(HttpError::BadChunk);
      }
      return Ok(None);
    };
    let line = std::str::from_utf8(&data[..rel]).map_err(|_| HttpError::BadChunk)?;
    let (size_tok, ext) = match line.find(';') {
      Some(i) => (&line[..i], &line[i + 1..]),
      None => (line, ""),
    };
    if size_tok.is_empty() || !size_tok.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(HttpError::BadChunk);
    }
    if ext.bytes().any(|b| b == b'\r' || b == b'\n') {
      return Err(HttpError::BadChunkExtension);
    }
    let size = u64::from_str_radix(size_tok, 16).map_err(|_| HttpError::BadChunk)?;
    cb.on_chunk(size, ext)?;
    if size == 0 {
      self.flags.final_chunk_seen = true;
      self.state = State::Trailer;
      tracing::trace!("final 0-size chunk seen, entering trailer state");
    } else {
      if size > self.max_body_size {
        return Err(HttpError::BodyLimit);
      }
      self.remaining = size;
      self.state = State::BodyChunk;
    }
    Ok(Some(rel + 2))
  }

  fn step_chunk_body<C: ParserCallbacks>(&mut self, data: &[u8], cb: &mut C) -> Result<Option<usize>, HttpError> {
    if self.remaining > 0 {
      if data.is_empty() {
        return Ok(None);
      }
      let take = (self.remaining.min(data.len() as u64)) as usize;
      cb.on_data(&data[..take])?;
      self.remaining -= take as u64;
      return Ok(Some(take));
    }
    // remaining == 0: consume the trailing CRLF after the chunk data.
    if data.len() < 2 {
      return Ok(None);
    }
    if &data[..2] != b"\r\n" {
      return Err(HttpError::BadChunk);
    }
    self.state = State::BodyChunkHeader;
    Ok(Some(2))
  }

  fn step_trailer<C: ParserCallbacks>(&mut self, data: &[u8], cb: &mut C) -> Result<Option<usize>, HttpError> {
    let Some(rel) = find(data, b"\r\n\r\n") else {
      // Also accept an immediate blank line (no trailers at all).
      if data.len() >= 2 && &data[..2] == b"\r\n" {
        self.state = State::Complete;
        cb.on_complete()?;
        return Ok(Some(2));
      }
      return Ok(None);
    };
    let block = &data[..rel + 2];
    let text = std::str::from_utf8(block).map_err(|_| HttpError::BadField)?;
    for line in text.split("\r\n") {
      if line.is_empty() {
        continue;
      }
      let Some(colon) = line.find(':') else {
        return Err(HttpError::BadField);
      };
      let name = &line[..colon];
      let value = line[colon + 1..].trim_matches(|c| c == ' ' || c == '\t');
      self.fields.append(name, value);
      cb.on_field(name, value)?;
    }
    self.state = State::Complete;
    cb.on_complete()?;
    Ok(Some(rel + 4))
  }
}

fn te_chunked_is_final_and_well_formed(tokens: &[String]) -> bool {
  matches!(tokens.last(), Some(t) if t.eq_ignore_ascii_case("chunked"))
}

fn parse_version(tok: &str) -> Result<u8, HttpError> {
  let rest = tok.strip_prefix("HTTP/").ok_or(HttpError::BadVersion)?;
  let mut parts = rest.splitn(2, '.');
  let major = parts.next().ok_or(HttpError::BadVersion)?;
  let minor = parts.next().ok_or(HttpError::BadVersion)?;
  if major.len() != 1 || minor.len() != 1 {
    return Err(HttpError::BadVersion);
  }
  let major: u8 = major.parse().map_err(|_| HttpError::BadVersion)?;
  let minor: u8 = minor.parse().map_err(|_| HttpError::BadVersion)?;
  if major != 1 {
    return Err(HttpError::BadVersion);
  }
  Ok(major * 10 + minor)
}

fn is_tchar(b: u8) -> bool {
  b.is_ascii_alphanumeric()
    || matches!(b, b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  if needle.is_empty() || haystack.len() < needle.len() {
    return None;
  }
  haystack.windows(needle.len()).position(|w| w == needle)
}
