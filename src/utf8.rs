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

//! Streaming, restartable UTF-8 validator (spec §3 "UTF-8 validator",
//! §8 "UTF-8 validator" property).
//!
//! Accepts arbitrary chunk boundaries: a multi-byte sequence split
//! across two `feed` calls validates identically to the same bytes fed
//! whole. Used by the WebSocket read half for text messages and for
//! close-frame reason phrases (mirrors Boost.Beast's
//! `detail::utf8_checker`, referenced from
//! `examples/original_source/include/beast/websocket/detail/frame.hpp`'s
//! `read_close`).

use crate::error::WsError;

/// DFA states: how many continuation bytes remain, and what range the
/// next byte must fall in (to reject overlong encodings and surrogates
/// at the earliest possible byte, per spec §8).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
  Start,
  /// `remaining` continuation bytes are still expected; the next one
  /// must fall in `lo..=hi` (narrowed for the byte right after the
  /// lead byte to reject overlong encodings and surrogates; every
  /// continuation byte after that is the generic `0x80..=0xBF`).
  More { remaining: u8, lo: u8, hi: u8 },
}

/// Incremental, restartable UTF-8 validator. Does not retain the
/// validated bytes, only enough DFA state to resume across chunk
/// boundaries.
#[derive(Clone, Debug)]
pub struct Utf8Validator {
  state: State,
}

impl Default for Utf8Validator {
  fn default() -> Self {
    Self::new()
  }
}

impl Utf8Validator {
  pub fn new() -> Self {
    Self { state: State::Start }
  }

  /// Reset to the initial state, as if no bytes had ever been fed.
  pub fn reset(&mut self) {
    self.state = State::Start;
  }

  /// `true` if there is no partial multi-byte sequence pending.
  pub fn is_complete(&self) -> bool {
    self.state == State::Start
  }

  /// Validate the well-formedness of `chunk`, continuing from whatever
  /// partial sequence was pending from a previous `feed`. Rejects at
  /// the first byte that cannot extend a valid UTF-8 prefix.
  pub fn feed(&mut self, chunk: &[u8]) -> Result<(), WsError> {
    for &b in chunk {
      self.state = match self.state {
        State::Start => {
          if b < 0x80 {
            State::Start
          } else if (0xC2..=0xDF).contains(&b) {
            State::More { remaining: 1, lo: 0x80, hi: 0xBF }
          } else if b == 0xE0 {
            State::More { remaining: 2, lo: 0xA0, hi: 0xBF }
          } else if (0xE1..=0xEC).contains(&b) || (0xEE..=0xEF).contains(&b) {
            State::More { remaining: 2, lo: 0x80, hi: 0xBF }
          } else if b == 0xED {
            // Excludes the surrogate range D800..DFFF.
            State::More { remaining: 2, lo: 0x80, hi: 0x9F }
          } else if b == 0xF0 {
            // Excludes overlong 4-byte encodings below U+10000.
            State::More { remaining: 3, lo: 0x90, hi: 0xBF }
          } else if (0xF1..=0xF3).contains(&b) {
            State::More { remaining: 3, lo: 0x80, hi: 0xBF }
          } else if b == 0xF4 {
            // Excludes codepoints above U+10FFFF.
            State::More { remaining: 3, lo: 0x80, hi: 0x8F }
          } else {
            return Err(WsError::InvalidUtf8);
          }
        }
        State::More { remaining, lo, hi } => {
          if b < lo || b > hi {
            return Err(WsError::InvalidUtf8);
          }
          if remaining == 1 {
            State::Start
          } else {
            State::More { remaining: remaining - 1, lo: 0x80, hi: 0xBF }
          }
        }
      };
    }
    Ok(())
  }

  /// Call after the final chunk of the message. Fails if a multi-byte
  /// sequence was left incomplete (truncated encoding).
  pub fn finish(&self) -> Result<(), WsError> {
    if self.is_complete() {
      Ok(())
    } else {
      Err(WsError::InvalidUtf8)
    }
  }
}

/// One-shot convenience: validate a complete, non-streamed buffer.
pub fn validate(bytes: &[u8]) -> Result<(), WsError> {
  let mut v = Utf8Validator::new();
  v.feed(bytes)?;
  v.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_ascii_and_multibyte() {
    assert!(validate("hello".as_bytes()).is_ok());
    assert!(validate("héllo wörld 🎉".as_bytes()).is_ok());
  }

  #[test]
  fn accepts_split_across_chunks() {
    let s = "héllo wörld 🎉".as_bytes();
    for split in 0..=s.len() {
      let mut v = Utf8Validator::new();
      v.feed(&s[..split]).unwrap();
      v.feed(&s[split..]).unwrap();
      v.finish().unwrap();
    }
  }

  #[test]
  fn rejects_overlong_encoding() {
    // Overlong encoding of '/' (0x2F) as 0xC0 0xAF.
    assert!(validate(&[0xC0, 0xAF]).is_err());
  }

  #[test]
  fn rejects_surrogate_half() {
    // U+D800 encoded as ED A0 80.
    assert!(validate(&[0xED, 0xA0, 0x80]).is_err());
  }

  #[test]
  fn rejects_truncated_sequence() {
    let mut v = Utf8Validator::new();
    v.feed(&[0xE2, 0x82]).unwrap(); // first two bytes of '€', third missing
    assert!(v.finish().is_err());
  }
}
