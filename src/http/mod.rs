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

//! HTTP/1.x message model, incremental parser, and lazy serializer
//! (spec §3, §4.2, §4.3).

pub mod body;
pub mod fields;
pub mod message;
pub mod method;
pub mod parser;
pub mod serializer;
pub mod status;

pub use body::{Body, EmptyBody, FileBody, OwnedBody, SpanBody};
pub use fields::Fields;
pub use message::{Header, Message, Request, Response, StartLine};
pub use method::Method;
pub use parser::{Parser, ParserCallbacks, State as ParserState};
pub use serializer::{Piece, Serializer};
