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

/// Heap-backed, always-contiguous buffer that grows up to `max_size`
/// (spec §3/§4.1 "Flat buffer"). Same contiguity guarantee as
/// [`super::FlatStaticBuffer`], but reallocates instead of failing when
/// more room is needed and available headroom remains under
/// `max_size`.
pub struct FlatBuffer {
  buf: Vec<u8>,
  begin: usize,
  in_size: usize,
  out_size: usize,
  max_size: usize,
}

impl FlatBuffer {
  pub fn new(max_size: usize) -> Self {
    Self { buf: Vec::new(), begin: 0, in_size: 0, out_size: 0, max_size }
  }

  pub fn with_capacity(initial: usize, max_size: usize) -> Self {
    Self { buf: vec![0; initial], begin: 0, in_size: 0, out_size: 0, max_size }
  }
}

impl DynamicBuffer for FlatBuffer {
  fn size(&self) -> usize {
    self.in_size
  }

  fn max_size(&self) -> usize {
    self.max_size
  }

  fn capacity(&self) -> usize {
    self.buf.len()
  }

  fn data(&self) -> &[u8] {
    &self.buf[self.begin..self.begin + self.in_size]
  }

  fn mutable_data(&mut self) -> &mut [u8] {
    &mut self.buf[self.begin..self.begin + self.in_size]
  }

  fn prepare(&mut self, n: usize) -> Result<&mut [u8], HttpError> {
    if n > self.max_size - self.in_size {
      return Err(HttpError::BufferOverflow);
    }
    let needed = self.in_size + n;
    if self.begin + needed > self.buf.len() {
      if needed > self.buf.len() {
        // Shift first, then grow only as much as still required -
        // avoids reallocating past what the shift already freed.
        self.buf.copy_within(self.begin..self.begin + self.in_size, 0);
        self.begin = 0;
        if needed > self.buf.len() {
          self.buf.resize(needed, 0);
        }
      } else {
        self.buf.copy_within(self.begin..self.begin + self.in_size, 0);
        self.begin = 0;
      }
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
  fn grows_up_to_max_size() {
    let mut b = FlatBuffer::new(16);
    b.prepare(10).unwrap().copy_from_slice(&[1; 10]);
    b.commit(10);
    assert_eq!(b.size(), 10);
    b.prepare(6).unwrap().copy_from_slice(&[2; 6]);
    b.commit(6);
    assert_eq!(b.size(), 16);
  }

  #[test]
  fn refuses_past_max_size() {
    let mut b = FlatBuffer::new(8);
    assert_eq!(b.prepare(9).unwrap_err(), HttpError::BufferOverflow);
  }
}
