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

//! Masking-key application (RFC 6455 §5.3; spec §4.4).
//!
//! Grounded on `examples/willrnch-fastwebsockets/src/lib.rs`'s use of
//! `crate::mask::unmask` (re-exported there from a dedicated module) and
//! on Beast's `detail::mask_key`/`prepared_key` machinery, which stores
//! the key little-endian internally for word-at-a-time application.
//! XOR is its own inverse, so one function masks and unmasks alike.

/// XOR every byte of `data` with the 4-byte `key`, starting at cyclic
/// `offset` into the key (so a payload split across reads can be
/// unmasked incrementally without losing key alignment).
pub fn apply_mask(data: &mut [u8], key: [u8; 4], offset: usize) {
  for (i, byte) in data.iter_mut().enumerate() {
    *byte ^= key[(offset + i) % 4];
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn masking_is_its_own_inverse() {
    let key = [0x12, 0x34, 0x56, 0x78];
    let original = b"Hello, WebSocket!".to_vec();
    let mut data = original.clone();
    apply_mask(&mut data, key, 0);
    assert_ne!(data, original);
    apply_mask(&mut data, key, 0);
    assert_eq!(data, original);
  }

  #[test]
  fn offset_continues_key_alignment_across_chunks() {
    let key = [1, 2, 3, 4];
    let mut whole = b"abcdefgh".to_vec();
    apply_mask(&mut whole, key, 0);

    let mut a = b"abcd".to_vec();
    let mut b = b"efgh".to_vec();
    apply_mask(&mut a, key, 0);
    apply_mask(&mut b, key, 4);

    let mut combined = a;
    combined.extend_from_slice(&b);
    assert_eq!(combined, whole);
  }
}
