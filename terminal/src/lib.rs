//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Terminal negotiation and capability layer
//!
//! ```text
//! TerminalDetector ──probe──▶ TerminalKind
//!                                  │
//!        TerminalStream ──────▶ Terminal { Ansi | Dumb } : TerminalCapability
//! ```
//!
//! [`TerminalStream`] owns the transport and implements the line I/O contract every
//! emulation shares. [`TerminalDetector`] picks the emulation once per connection
//! and [`Terminal`] exposes it through [`TerminalCapability`].

pub mod ansi;
mod capability;
pub mod consts;
mod detect;
mod dumb;
mod result;
mod stream;
mod terminal;
mod types;

pub use self::ansi::AnsiTerminal;
pub use self::capability::TerminalCapability;
pub use self::detect::TerminalDetector;
pub use self::dumb::DumbTerminal;
pub use self::result::{InvalidColor, TerminalError, TerminalResult};
pub use self::stream::{BoxTransport, TerminalStream, Transport};
pub use self::terminal::{Terminal, TerminalKind};
pub use self::types::{CursorPosition, TerminalColor};
