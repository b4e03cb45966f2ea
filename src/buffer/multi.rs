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

use std::collections::VecDeque;

use bytes::BytesMut;

use crate::error::HttpError;

/// Segmented chain of owned pages (spec §3/§4.1 "Multi buffer").
/// Unlike [`super::FlatBuffer`]/[`super::FlatStaticBuffer`], `prepare`
/// and `consume` never `memmove` existing bytes: growth appends a new
/// page, and `consume` drops whole pages (or shrinks the front of the
/// oldest one) from the front of the chain. The tradeoff, as spec §3
/// notes, is that [`MultiBuffer::data`] returns a sequence of spans
/// rather than one contiguous slice, so it does not implement
/// [`super::DynamicBuffer`] (whose `data()`/`prepare()` are
/// single-slice by construction) — it exposes the equivalent surface
/// under names that make the segmentation explicit.
pub struct MultiBuffer {
  pages: VecDeque<BytesMut>,
  page_size: usize,
  size: usize,
  max_size: usize,
  // index into the first page where committed data begins
  front_off: usize,
  // bytes reserved by the most recent `prepare`, pending `commit`
  pending: usize,
}

impl MultiBuffer {
  pub fn new(page_size: usize, max_size: usize) -> Self {
    Self {
      pages: VecDeque::new(),
      page_size,
      size: 0,
      max_size,
      front_off: 0,
      pending: 0,
    }
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn max_size(&self) -> usize {
    self.max_size
  }

  /// Committed bytes as a sequence of contiguous spans, in order.
  pub fn data(&self) -> Vec<&[u8]> {
    if self.pages.is_empty() {
      return Vec::new();
    }
    let mut remaining = self.size;
    let mut out = Vec::with_capacity(self.pages.len());
    for (i, page) in self.pages.iter().enumerate() {
      if remaining == 0 {
        break;
      }
      let start = if i == 0 { self.front_off } else { 0 };
      let avail = page.len() - start;
      // The last page may be partially filled by an in-flight `prepare`
      // that hasn't been committed yet; only expose committed bytes.
      let take = avail.min(remaining);
      out.push(&page[start..start + take]);
      remaining -= take;
    }
    out
  }

  /// Reserve at least `n` writable bytes, appending whole new pages.
  /// Returns the freshly appended writable regions in order; callers
  /// must write into them in order and call [`MultiBuffer::commit`]
  /// with the total number of bytes actually written. Only one
  /// `prepare`d region may be outstanding at a time: call `commit`
  /// (even with `0`) before the next `prepare`.
  pub fn prepare(&mut self, n: usize) -> Result<Vec<&mut [u8]>, HttpError> {
    if n > self.max_size - self.size {
      return Err(HttpError::BufferOverflow);
    }
    self.pending = n;
    let first_new_page = self.pages.len();
    let mut still_needed = n;
    while still_needed > 0 {
      let take = still_needed.min(self.page_size);
      self.pages.push_back(BytesMut::zeroed(take));
      still_needed -= take;
    }
    Ok(
      self
        .pages
        .iter_mut()
        .skip(first_new_page)
        .map(|page| &mut page[..])
        .collect(),
    )
  }

  /// Promote up to `n` bytes of the last `prepare`d region(s) to
  /// committed data. Saturates to the pending amount.
  pub fn commit(&mut self, n: usize) {
    let n = n.min(self.pending);
    self.size += n;
    self.pending = 0;
  }

  /// Drop up to `n` bytes from the front of the committed region,
  /// dropping whole pages once fully consumed.
  pub fn consume(&mut self, n: usize) {
    let mut n = n.min(self.size);
    self.size -= n;
    while n > 0 {
      let Some(front) = self.pages.front() else { break };
      let avail = front.len() - self.front_off;
      if n < avail {
        self.front_off += n;
        n = 0;
      } else {
        n -= avail;
        self.pages.pop_front();
        self.front_off = 0;
      }
    }
    if self.pages.is_empty() {
      self.front_off = 0;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spans_across_pages_without_moving() {
    let mut b = MultiBuffer::new(4, 64);
    {
      let mut w = b.prepare(6).unwrap();
      // two pages: [4 bytes][2 bytes]
      assert_eq!(w.len(), 2);
      w[0].copy_from_slice(b"abcd");
      w[1].copy_from_slice(b"ef");
    }
    b.commit(6);
    let spans = b.data();
    let joined: Vec<u8> = spans.into_iter().flatten().copied().collect();
    assert_eq!(joined, b"abcdef");
  }

  #[test]
  fn consume_drops_whole_pages() {
    let mut b = MultiBuffer::new(4, 64);
    b.prepare(8).unwrap();
    b.commit(8);
    assert_eq!(b.pages.len(), 2);
    b.consume(4);
    assert_eq!(b.pages.len(), 1);
    assert_eq!(b.size(), 4);
  }

  #[test]
  fn overflow_is_reported() {
    let mut b = MultiBuffer::new(4, 4);
    assert_eq!(b.prepare(5).unwrap_err(), HttpError::BufferOverflow);
  }
}
