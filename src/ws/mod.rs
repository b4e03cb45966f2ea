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

//! WebSocket (RFC 6455) frame codec, protocol state machine, and
//! permessage-deflate (RFC 7692) extension (spec §4.4, §4.5, §4.6).

pub mod close;
pub mod deflate_ext;
pub mod frame;
#[cfg(feature = "handshake")]
pub mod handshake;
pub mod mask;
pub mod protocol;

pub use close::{is_valid_close_code, parse_close_code};
pub use deflate_ext::{PerMessageDeflate, Params as DeflateParams};
pub use frame::{FrameHeader, OpCode};
pub use mask::apply_mask;
pub use protocol::{Event, Role, WsProtocol};
