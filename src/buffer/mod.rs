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

//! Dynamic-buffer contract (spec §3 "Buffer abstractions", §4.1).
//!
//! Three concrete buffers share one trait: a fixed-capacity contiguous
//! buffer, a growable contiguous buffer, and a segmented multi-buffer
//! that avoids `memmove` at the cost of a non-contiguous read view.
//! Parsers and codecs only ever borrow views out of a buffer; ownership
//! stays with whoever constructed it.

mod flat;
mod flat_static;
mod multi;

pub use flat::FlatBuffer;
pub use flat_static::FlatStaticBuffer;
pub use multi::MultiBuffer;

use crate::error::HttpError;

/// Any concrete buffer implements this. `prepare` always returns a
/// region whose combined size is at least the requested amount;
/// contiguous buffers return it in one slice, [`MultiBuffer`] may
/// return it spread across several pages (see [`MultiBuffer::prepare`]).
pub trait DynamicBuffer {
  /// Bytes currently committed (readable).
  fn size(&self) -> usize;

  /// Upper bound on `size()` this buffer will ever grow to.
  fn max_size(&self) -> usize;

  /// Bytes currently allocated, readable or not.
  fn capacity(&self) -> usize;

  /// Read view over the committed bytes.
  fn data(&self) -> &[u8];

  /// Mutable view over the committed bytes.
  fn mutable_data(&mut self) -> &mut [u8];

  /// Reserve a writable region of at least `n` bytes, returning it.
  /// Fails with [`HttpError::BufferOverflow`] if `n` exceeds the
  /// remaining writable capacity (`max_size() - size()`, further
  /// bounded by `capacity() - size()` for buffers that cannot grow).
  fn prepare(&mut self, n: usize) -> Result<&mut [u8], HttpError>;

  /// Promote up to `n` bytes of the last `prepare`d region to
  /// committed data. Saturates to the size of that region.
  fn commit(&mut self, n: usize);

  /// Drop up to `n` bytes from the front of the committed region.
  /// Saturates to `size()`.
  fn consume(&mut self, n: usize);
}

/// `min(hint, max_size - size, capacity - size)`. Returns 0 to signal
/// "cannot read more into this buffer right now" (spec §4.1).
pub fn read_size(buf: &dyn DynamicBuffer, hint: usize) -> usize {
  let by_max = buf.max_size().saturating_sub(buf.size());
  let by_cap = buf.capacity().saturating_sub(buf.size());
  hint.min(by_max).min(by_cap)
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Fixed {
    size: usize,
    max_size: usize,
    capacity: usize,
  }

  impl DynamicBuffer for Fixed {
    fn size(&self) -> usize {
      self.size
    }
    fn max_size(&self) -> usize {
      self.max_size
    }
    fn capacity(&self) -> usize {
      self.capacity
    }
    fn data(&self) -> &[u8] {
      &[]
    }
    fn mutable_data(&mut self) -> &mut [u8] {
      &mut []
    }
    fn prepare(&mut self, _n: usize) -> Result<&mut [u8], HttpError> {
      Ok(&mut [])
    }
    fn commit(&mut self, _n: usize) {}
    fn consume(&mut self, _n: usize) {}
  }

  #[test]
  fn read_size_is_bounded_by_both_limits() {
    let b = Fixed { size: 8, max_size: 10, capacity: 20 };
    assert_eq!(read_size(&b, 100), 2); // limited by max_size
    let b = Fixed { size: 8, max_size: 100, capacity: 10 };
    assert_eq!(read_size(&b, 100), 2); // limited by capacity
    let b = Fixed { size: 8, max_size: 100, capacity: 100 };
    assert_eq!(read_size(&b, 5), 5); // limited by hint
  }
}
