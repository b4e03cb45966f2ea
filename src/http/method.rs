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

//! Request method (spec §3 "Header": "method (enumerated verb + raw
//! string for unknown methods)"). Mirrors Boost.Beast's `verb`/
//! `verb::unknown` split (`examples/original_source/include/beast/http/message.hpp`).

use std::fmt;

/// A recognized HTTP request method, or an opaque extension token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
  Connect,
  Options,
  Trace,
  Patch,
  /// Any token not in the list above, stored verbatim.
  Extension(Box<str>),
}

impl Method {
  pub fn as_str(&self) -> &str {
    match self {
      Method::Get => "GET",
      Method::Head => "HEAD",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
      Method::Connect => "CONNECT",
      Method::Options => "OPTIONS",
      Method::Trace => "TRACE",
      Method::Patch => "PATCH",
      Method::Extension(s) => s,
    }
  }

  /// `true` for methods whose responses never carry a body regardless
  /// of other framing headers (spec §3 invariants / §4.2 "HEAD
  /// requests... no body").
  pub fn is_head(&self) -> bool {
    matches!(self, Method::Head)
  }

  pub(crate) fn parse(token: &str) -> Method {
    match token {
      "GET" => Method::Get,
      "HEAD" => Method::Head,
      "POST" => Method::Post,
      "PUT" => Method::Put,
      "DELETE" => Method::Delete,
      "CONNECT" => Method::Connect,
      "OPTIONS" => Method::Options,
      "TRACE" => Method::Trace,
      "PATCH" => Method::Patch,
      other => Method::Extension(other.into()),
    }
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recognizes_known_verbs() {
    assert_eq!(Method::parse("GET"), Method::Get);
    assert_eq!(Method::parse("PATCH"), Method::Patch);
  }

  #[test]
  fn keeps_unknown_verbs_verbatim() {
    assert_eq!(Method::parse("PROPFIND"), Method::Extension("PROPFIND".into()));
    assert_eq!(Method::parse("PROPFIND").as_str(), "PROPFIND");
  }
}
