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

use super::DynamicBuffer;
use crate::error::HttpError;

/// Fixed-capacity, always-contiguous buffer (spec §3/§4.1 "Flat static
/// buffer"). `prepare` may shift already-committed bytes toward the
/// front of the backing array to keep both `data()` and `prepare()`
/// contiguous; it never reallocates. Grounded on Boost.Beast's
/// `flat_static_buffer<N>` (`examples/original_source/test/core/flat_static_buffer.cpp`)
/// and on the teacher's own fixed 14-byte frame-header scratch buffer.
pub struct FlatStaticBuffer<const N: usize> {
  buf: [u8; N],
  begin: usize,
  in_size: usize,
  out_size: usize,
}

impl<const N: usize> FlatStaticBuffer<N> {
  pub fn new() -> Self {
    Self { buf: [0; N], begin: 0, in_size: 0, out_size: 0 }
  }
}

impl<const N: usize> Default for FlatStaticBuffer<N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const N: usize> DynamicBuffer for FlatStaticBuffer<N> {
  fn size(&self) -> usize {
    self.in_size
  }

  fn max_size(&self) -> usize {
    N
  }

  fn capacity(&self) -> usize {
    N
  }

  fn data(&self) -> &[u8] {
    &self.buf[self.begin..self.begin + self.in_size]
  }

  fn mutable_data(&mut self) -> &mut [u8] {
    &mut self.buf[self.begin..self.begin + self.in_size]
  }

  fn prepare(&mut self, n: usize) -> Result<&mut [u8], HttpError> {
    if n > N - self.in_size {
      return Err(HttpError::BufferOverflow);
    }
    if self.begin + self.in_size + n > N {
      self.buf.copy_within(self.begin..self.begin + self.in_size, 0);
      self.begin = 0;
    }
    self.out_size = n;
    let start = self.begin + self.in_size;
    Ok(&mut self.buf[start..start + n])
  }

  fn commit(&mut self, n: usize) {
    let n = n.min(self.out_size);
    self.in_size += n;
    self.out_size = 0;
  }

  fn consume(&mut self, n: usize) {
    let n = n.min(self.in_size);
    self.begin += n;
    self.in_size -= n;
    if self.in_size == 0 {
      self.begin = 0;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn contiguous_round_trip() {
    let mut b = FlatStaticBuffer::<12>::new();
    b.prepare(5).unwrap().copy_from_slice(b"Hello");
    b.commit(5);
    assert_eq!(b.data(), b"Hello");
    b.prepare(7).unwrap().copy_from_slice(b", world");
    b.commit(7);
    assert_eq!(b.data(), b"Hello, world");
    b.consume(7);
    assert_eq!(b.data(), b"world");
    // Writing past the consumed prefix forces a memmove to stay contiguous.
    b.prepare(7).unwrap().copy_from_slice(b"! there");
    b.commit(7);
    assert_eq!(b.data(), b"world! there");
  }

  #[test]
  fn overflow_is_reported() {
    let mut b = FlatStaticBuffer::<4>::new();
    assert_eq!(b.prepare(5).unwrap_err(), HttpError::BufferOverflow);
  }
}
