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

//! RFC 6455 §1.3 opening handshake helpers, gated behind the
//! `handshake` feature exactly as the teacher crate gates its
//! `upgrade`/`handshake` modules behind an optional dependency set
//! (`base64`, `sha1`).

use base64::Engine;
use rand::RngCore;
use sha1::{Digest, Sha1};

const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Generate a fresh, random `Sec-WebSocket-Key` value for a client
/// handshake request.
pub fn generate_key() -> String {
  let mut key = [0u8; 16];
  rand::thread_rng().fill_bytes(&mut key);
  base64::engine::general_purpose::STANDARD.encode(key)
}

/// Compute the `Sec-WebSocket-Accept` value for a given
/// `Sec-WebSocket-Key`: `base64(sha1(key ++ GUID))`.
pub fn accept_key(client_key: &str) -> String {
  let mut hasher = Sha1::new();
  hasher.update(client_key.as_bytes());
  hasher.update(GUID.as_bytes());
  let digest = hasher.finalize();
  base64::engine::general_purpose::STANDARD.encode(digest)
}

/// `true` if `accept` is the correct `Sec-WebSocket-Accept` response
/// to a request that sent `client_key`.
pub fn verify_accept(client_key: &str, accept: &str) -> bool {
  accept_key(client_key) == accept
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matches_rfc6455_worked_example() {
    // RFC 6455 §1.3's worked example.
    assert_eq!(accept_key("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
  }

  #[test]
  fn generated_key_round_trips_through_verify() {
    let key = generate_key();
    let accept = accept_key(&key);
    assert!(verify_accept(&key, &accept));
    assert!(!verify_accept(&key, "not-the-right-value"));
  }
}
