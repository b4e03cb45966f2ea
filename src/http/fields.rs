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

//! Ordered, case-insensitive multimap of header fields (spec §3
//! "Fields"). Duplicates are preserved verbatim in insertion order;
//! nothing is pre-parsed beyond tagging each entry with a recognized-
//! field enum, mirroring Boost.Beast's `fields` container referenced
//! from `examples/original_source/test/http/fields.cpp`.

use std::collections::HashMap;

/// A subset of header names the parser/serializer treat specially.
/// Every other name is `Unknown`; the literal bytes are always kept
/// alongside this tag so round-tripping never loses the original
/// casing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldName {
  Connection,
  ContentLength,
  TransferEncoding,
  Upgrade,
  Host,
  Unknown,
}

impl FieldName {
  fn classify(name: &str) -> FieldName {
    if name.eq_ignore_ascii_case("connection") {
      FieldName::Connection
    } else if name.eq_ignore_ascii_case("content-length") {
      FieldName::ContentLength
    } else if name.eq_ignore_ascii_case("transfer-encoding") {
      FieldName::TransferEncoding
    } else if name.eq_ignore_ascii_case("upgrade") {
      FieldName::Upgrade
    } else if name.eq_ignore_ascii_case("host") {
      FieldName::Host
    } else {
      FieldName::Unknown
    }
  }
}

struct Entry {
  tag: FieldName,
  name: Box<str>,
  value: Box<str>,
}

/// Ordered multimap with case-insensitive lookup by name.
#[derive(Default)]
pub struct Fields {
  entries: Vec<Entry>,
  // Lowercased name -> indices into `entries`, insertion order preserved.
  index: HashMap<Box<str>, Vec<usize>>,
}

impl Fields {
  pub fn new() -> Self {
    Self::default()
  }

  fn key(name: &str) -> Box<str> {
    name.to_ascii_lowercase().into_boxed_str()
  }

  /// Append a field, preserving any existing entries for the same name.
  pub fn append(&mut self, name: &str, value: &str) {
    let tag = FieldName::classify(name);
    let idx = self.entries.len();
    self.entries.push(Entry { tag, name: name.into(), value: value.into() });
    self.index.entry(Self::key(name)).or_default().push(idx);
  }

  /// Remove every entry for `name` and insert a single new one with
  /// `value`, at the position of the first removed entry (or the end,
  /// if there was none). Used by the serializer's `content_length`/
  /// `chunked`/`keep_alive` edits to keep a single authoritative value.
  pub fn set(&mut self, name: &str, value: &str) {
    self.remove_all(name);
    self.append(name, value);
  }

  /// Remove every entry for `name`.
  pub fn remove_all(&mut self, name: &str) {
    let key = Self::key(name);
    if let Some(indices) = self.index.remove(&key) {
      let to_remove: std::collections::HashSet<usize> = indices.into_iter().collect();
      let mut kept = Vec::with_capacity(self.entries.len());
      let mut old = std::mem::take(&mut self.entries);
      for (i, e) in old.drain(..).enumerate() {
        if !to_remove.contains(&i) {
          kept.push(e);
        }
      }
      self.entries = kept;
      self.rebuild_index();
    }
  }

  fn rebuild_index(&mut self) {
    self.index.clear();
    for (i, e) in self.entries.iter().enumerate() {
      self.index.entry(Self::key(&e.name)).or_default().push(i);
    }
  }

  /// First value for `name`, if present.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.get_all(name).next()
  }

  /// All values for `name`, in insertion order.
  pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
    let key = Self::key(name);
    self
      .index
      .get(&key)
      .into_iter()
      .flatten()
      .map(move |&i| self.entries[i].value.as_ref())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(&Self::key(name))
  }

  pub fn count(&self, name: &str) -> usize {
    self.index.get(&Self::key(name)).map(|v| v.len()).unwrap_or(0)
  }

  /// All `(name, value)` pairs, in insertion order, with the literal
  /// name bytes (not lowercased).
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|e| (e.name.as_ref(), e.value.as_ref()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub(crate) fn tag(&self, name: &str) -> FieldName {
    FieldName::classify(name)
  }

  /// Comma-separated tokens of the Connection field, across all
  /// occurrences, in order (spec §4.2: "parsed as a comma-separated
  /// list").
  pub fn connection_tokens(&self) -> Vec<String> {
    self
      .get_all("Connection")
      .flat_map(|v| v.split(','))
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .collect()
  }

  /// Transfer-Encoding tokens, with multiple fields concatenated in
  /// order (spec §4.2: "If multiple Transfer-Encoding fields appear
  /// they are concatenated in order").
  pub fn transfer_encoding_tokens(&self) -> Vec<String> {
    self
      .get_all("Transfer-Encoding")
      .flat_map(|v| v.split(','))
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn case_insensitive_lookup_preserves_literal_name() {
    let mut f = Fields::new();
    f.append("Content-Type", "text/plain");
    assert_eq!(f.get("content-type"), Some("text/plain"));
    assert_eq!(f.iter().next().unwrap().0, "Content-Type");
  }

  #[test]
  fn duplicates_preserved_in_order() {
    let mut f = Fields::new();
    f.append("X-Trace", "a");
    f.append("X-Trace", "b");
    assert_eq!(f.get_all("x-trace").collect::<Vec<_>>(), vec!["a", "b"]);
  }

  #[test]
  fn set_replaces_all_occurrences() {
    let mut f = Fields::new();
    f.append("Connection", "upgrade");
    f.append("Connection", "keep-alive");
    f.set("Connection", "close");
    assert_eq!(f.get_all("connection").collect::<Vec<_>>(), vec!["close"]);
  }

  #[test]
  fn connection_tokens_split_and_trim() {
    let mut f = Fields::new();
    f.append("Connection", "close, upgrade");
    assert_eq!(f.connection_tokens(), vec!["close", "upgrade"]);
  }
}
