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

//! Fallback capability for clients that did not answer the probe

use crate::capability::TerminalCapability;
use crate::consts::{CRLF, DUMB_CLEAR_LINES};
use crate::result::TerminalResult;
use crate::stream::{TerminalStream, Transport};
use crate::types::{CursorPosition, TerminalColor};
use async_trait::async_trait;

/// Plain byte stream terminal. Never emits an escape sequence.
pub struct DumbTerminal<S> {
    stream: TerminalStream<S>,
}

impl<S: Transport> DumbTerminal<S> {
    /// Emulation name
    pub const NAME: &'static str = "Dumb";

    pub fn new(stream: TerminalStream<S>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &TerminalStream<S> {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TerminalStream<S> {
        &mut self.stream
    }

    pub fn into_stream(self) -> TerminalStream<S> {
        self.stream
    }
}

#[async_trait]
impl<S: Transport> TerminalCapability for DumbTerminal<S> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports_fore_color(&self) -> bool {
        false
    }

    fn supports_back_color(&self) -> bool {
        false
    }

    fn supports_positioning(&self) -> bool {
        false
    }

    async fn initialize(&mut self) -> TerminalResult<()> {
        self.stream.send(&CRLF.repeat(2)).await
    }

    async fn set_fore_color(&mut self, _color: TerminalColor) -> TerminalResult<()> {
        Ok(())
    }

    async fn set_back_color(&mut self, _color: TerminalColor) -> TerminalResult<()> {
        Ok(())
    }

    async fn cursor_position(&mut self) -> TerminalResult<Option<CursorPosition>> {
        Ok(None)
    }

    async fn set_cursor_position(&mut self, _row: u16, _col: u16) -> TerminalResult<()> {
        Ok(())
    }

    /// Scrolls the old content away with blank lines.
    async fn clear_screen(&mut self) -> TerminalResult<()> {
        self.stream.send(&CRLF.repeat(DUMB_CLEAR_LINES)).await
    }
}

impl<S> std::fmt::Debug for DumbTerminal<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumbTerminal")
            .field("stream", &self.stream)
            .finish()
    }
}
