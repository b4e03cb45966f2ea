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

//! Standard reason phrases, used by the serializer when no explicit
//! reason was set on a response (spec §4.3; Beast: `header<false,_>`'s
//! reason-phrase defaulting, `message.hpp`).

/// Returns the standard reason phrase for `code`, or `"Unknown"` if
/// `code` is not a registered status code.
pub fn standard_reason(code: u16) -> &'static str {
  match code {
    100 => "Continue",
    101 => "Switching Protocols",
    103 => "Early Hints",
    200 => "OK",
    201 => "Created",
    202 => "Accepted",
    203 => "Non-Authoritative Information",
    204 => "No Content",
    205 => "Reset Content",
    206 => "Partial Content",
    300 => "Multiple Choices",
    301 => "Moved Permanently",
    302 => "Found",
    303 => "See Other",
    304 => "Not Modified",
    307 => "Temporary Redirect",
    308 => "Permanent Redirect",
    400 => "Bad Request",
    401 => "Unauthorized",
    402 => "Payment Required",
    403 => "Forbidden",
    404 => "Not Found",
    405 => "Method Not Allowed",
    406 => "Not Acceptable",
    407 => "Proxy Authentication Required",
    408 => "Request Timeout",
    409 => "Conflict",
    410 => "Gone",
    411 => "Length Required",
    412 => "Precondition Failed",
    413 => "Payload Too Large",
    414 => "URI Too Long",
    415 => "Unsupported Media Type",
    416 => "Range Not Satisfiable",
    417 => "Expectation Failed",
    426 => "Upgrade Required",
    428 => "Precondition Required",
    429 => "Too Many Requests",
    431 => "Request Header Fields Too Large",
    500 => "Internal Server Error",
    501 => "Not Implemented",
    502 => "Bad Gateway",
    503 => "Service Unavailable",
    504 => "Gateway Timeout",
    505 => "HTTP Version Not Supported",
    511 => "Network Authentication Required",
    _ => "Unknown",
  }
}

/// `true` for status codes whose responses never carry a body
/// regardless of Content-Length/Transfer-Encoding (spec §4.2: "responses
/// with status 1xx/204/304... no body").
pub fn never_has_body(code: u16) -> bool {
  (100..200).contains(&code) || code == 204 || code == 304
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_codes_have_phrases() {
    assert_eq!(standard_reason(200), "OK");
    assert_eq!(standard_reason(404), "Not Found");
  }

  #[test]
  fn unknown_code_is_unknown() {
    assert_eq!(standard_reason(799), "Unknown");
  }

  #[test]
  fn bodyless_classes() {
    assert!(never_has_body(101));
    assert!(never_has_body(204));
    assert!(never_has_body(304));
    assert!(!never_has_body(200));
  }
}
