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

//! Close-code validation (RFC 6455 §7.4; spec §4.4).
//!
//! Grounded on `examples/original_source/include/beast/websocket/detail/frame.hpp`'s
//! `is_valid_close_code`: codes 1000-1003 and 1007-1011 are always
//! acceptable to send/receive, 1000-4999 minus a handful of reserved
//! values are acceptable to receive on the wire (they're just not ones
//! this crate would generate itself), and everything else is rejected.

/// `true` if `code` is a close code this crate will accept in a
/// received close frame.
pub fn is_valid_close_code(code: u16) -> bool {
  match code {
    1000..=1003 | 1007..=1013 => true,
    3000..=4999 => true,
    _ => false,
  }
}

/// Parse and validate the 2-byte status code prefix of a close frame
/// payload, per RFC 6455 §5.5.1: a non-empty close payload must be at
/// least 2 bytes.
pub fn parse_close_code(payload: &[u8]) -> Result<Option<u16>, crate::error::WsError> {
  use crate::error::WsError;
  match payload.len() {
    0 => Ok(None),
    1 => Err(WsError::BadCloseSize),
    _ => {
      let code = u16::from_be_bytes([payload[0], payload[1]]);
      if !is_valid_close_code(code) {
        return Err(WsError::BadCloseCode);
      }
      Ok(Some(code))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_normal_and_reserved_application_ranges() {
    assert!(is_valid_close_code(1000));
    assert!(is_valid_close_code(1011));
    assert!(is_valid_close_code(3000));
    assert!(is_valid_close_code(4999));
  }

  #[test]
  fn rejects_reserved_and_out_of_range_codes() {
    for code in [1004, 1005, 1006, 1014, 1015, 999, 2000] {
      assert!(!is_valid_close_code(code), "{code} should be rejected");
    }
  }

  #[test]
  fn single_byte_payload_is_an_error() {
    assert!(parse_close_code(&[0x03]).is_err());
  }

  #[test]
  fn empty_payload_means_no_code() {
    assert_eq!(parse_close_code(&[]).unwrap(), None);
  }
}
