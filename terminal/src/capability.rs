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

use crate::result::TerminalResult;
use crate::types::{CursorPosition, TerminalColor};
use async_trait::async_trait;

/// Display features a negotiated terminal offers
///
/// Implementations that cannot honor a request treat it as a no-op and report the
/// matching `supports_*` flag as false, so callers may invoke every method
/// unconditionally.
#[async_trait]
pub trait TerminalCapability: Send {
    /// Emulation name shown to the user
    fn name(&self) -> &'static str;

    /// Whether foreground colors are rendered
    fn supports_fore_color(&self) -> bool;

    /// Whether background colors are rendered
    fn supports_back_color(&self) -> bool;

    /// Whether the cursor can be queried and moved
    fn supports_positioning(&self) -> bool;

    /// Put the client display into a known state right after negotiation
    async fn initialize(&mut self) -> TerminalResult<()>;

    /// Change the foreground color
    async fn set_fore_color(&mut self, color: TerminalColor) -> TerminalResult<()>;

    /// Change the background color
    async fn set_back_color(&mut self, color: TerminalColor) -> TerminalResult<()>;

    /// Ask the client where its cursor is
    ///
    /// `None` when positioning is unsupported or the client's answer could not be read.
    async fn cursor_position(&mut self) -> TerminalResult<Option<CursorPosition>>;

    /// Move the cursor
    async fn set_cursor_position(&mut self, row: u16, col: u16) -> TerminalResult<()>;

    /// Blank the client display
    async fn clear_screen(&mut self) -> TerminalResult<()>;
}
