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

//! The closed set of terminal emulations

use crate::ansi::AnsiTerminal;
use crate::capability::TerminalCapability;
use crate::dumb::DumbTerminal;
use crate::result::TerminalResult;
use crate::stream::{TerminalStream, Transport};
use crate::types::{CursorPosition, TerminalColor};
use async_trait::async_trait;
use std::fmt;

/// Which emulation a connection negotiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalKind {
    Ansi,
    Dumb,
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalKind::Ansi => write!(f, "ansi"),
            TerminalKind::Dumb => write!(f, "dumb"),
        }
    }
}

/// A negotiated terminal
///
/// Chosen once per connection and never swapped. New emulations are added as
/// variants here.
pub enum Terminal<S> {
    Ansi(AnsiTerminal<S>),
    Dumb(DumbTerminal<S>),
}

impl<S: Transport> Terminal<S> {
    /// Build the terminal of the given kind over `stream`
    pub fn new(kind: TerminalKind, stream: TerminalStream<S>) -> Self {
        match kind {
            TerminalKind::Ansi => Terminal::Ansi(AnsiTerminal::new(stream)),
            TerminalKind::Dumb => Terminal::Dumb(DumbTerminal::new(stream)),
        }
    }

    pub fn kind(&self) -> TerminalKind {
        match self {
            Terminal::Ansi(_) => TerminalKind::Ansi,
            Terminal::Dumb(_) => TerminalKind::Dumb,
        }
    }

    pub fn stream(&self) -> &TerminalStream<S> {
        match self {
            Terminal::Ansi(term) => term.stream(),
            Terminal::Dumb(term) => term.stream(),
        }
    }

    pub fn stream_mut(&mut self) -> &mut TerminalStream<S> {
        match self {
            Terminal::Ansi(term) => term.stream_mut(),
            Terminal::Dumb(term) => term.stream_mut(),
        }
    }

    pub fn into_stream(self) -> TerminalStream<S> {
        match self {
            Terminal::Ansi(term) => term.into_stream(),
            Terminal::Dumb(term) => term.into_stream(),
        }
    }

    pub async fn send(&mut self, bytes: &[u8]) -> TerminalResult<()> {
        self.stream_mut().send(bytes).await
    }

    pub async fn send_str(&mut self, text: &str) -> TerminalResult<()> {
        self.stream_mut().send_str(text).await
    }

    pub async fn send_line(&mut self, text: &str) -> TerminalResult<()> {
        self.stream_mut().send_line(text).await
    }

    pub async fn newline(&mut self) -> TerminalResult<()> {
        self.stream_mut().newline().await
    }

    pub async fn recv(&mut self) -> TerminalResult<u8> {
        self.stream_mut().recv().await
    }

    pub async fn read_line(&mut self, max_len: usize) -> TerminalResult<String> {
        self.stream_mut().read_line(max_len).await
    }

    pub fn clear_buffer(&mut self) -> TerminalResult<usize> {
        self.stream_mut().clear_buffer()
    }

    pub async fn shutdown(&mut self) -> TerminalResult<()> {
        self.stream_mut().shutdown().await
    }
}

#[async_trait]
impl<S: Transport> TerminalCapability for Terminal<S> {
    fn name(&self) -> &'static str {
        match self {
            Terminal::Ansi(term) => term.name(),
            Terminal::Dumb(term) => term.name(),
        }
    }

    fn supports_fore_color(&self) -> bool {
        match self {
            Terminal::Ansi(term) => term.supports_fore_color(),
            Terminal::Dumb(term) => term.supports_fore_color(),
        }
    }

    fn supports_back_color(&self) -> bool {
        match self {
            Terminal::Ansi(term) => term.supports_back_color(),
            Terminal::Dumb(term) => term.supports_back_color(),
        }
    }

    fn supports_positioning(&self) -> bool {
        match self {
            Terminal::Ansi(term) => term.supports_positioning(),
            Terminal::Dumb(term) => term.supports_positioning(),
        }
    }

    async fn initialize(&mut self) -> TerminalResult<()> {
        match self {
            Terminal::Ansi(term) => term.initialize().await,
            Terminal::Dumb(term) => term.initialize().await,
        }
    }

    async fn set_fore_color(&mut self, color: TerminalColor) -> TerminalResult<()> {
        match self {
            Terminal::Ansi(term) => term.set_fore_color(color).await,
            Terminal::Dumb(term) => term.set_fore_color(color).await,
        }
    }

    async fn set_back_color(&mut self, color: TerminalColor) -> TerminalResult<()> {
        match self {
            Terminal::Ansi(term) => term.set_back_color(color).await,
            Terminal::Dumb(term) => term.set_back_color(color).await,
        }
    }

    async fn cursor_position(&mut self) -> TerminalResult<Option<CursorPosition>> {
        match self {
            Terminal::Ansi(term) => term.cursor_position().await,
            Terminal::Dumb(term) => term.cursor_position().await,
        }
    }

    async fn set_cursor_position(&mut self, row: u16, col: u16) -> TerminalResult<()> {
        match self {
            Terminal::Ansi(term) => term.set_cursor_position(row, col).await,
            Terminal::Dumb(term) => term.set_cursor_position(row, col).await,
        }
    }

    async fn clear_screen(&mut self) -> TerminalResult<()> {
        match self {
            Terminal::Ansi(term) => term.clear_screen().await,
            Terminal::Dumb(term) => term.clear_screen().await,
        }
    }
}

impl<S> fmt::Debug for Terminal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Ansi(term) => f.debug_tuple("Terminal::Ansi").field(term).finish(),
            Terminal::Dumb(term) => f.debug_tuple("Terminal::Dumb").field(term).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_kind_matches_variant() {
        let (_a, server_a) = duplex(64);
        let (_b, server_b) = duplex(64);

        let ansi = Terminal::new(TerminalKind::Ansi, TerminalStream::new(server_a));
        let dumb = Terminal::new(TerminalKind::Dumb, TerminalStream::new(server_b));

        assert_eq!(ansi.kind(), TerminalKind::Ansi);
        assert_eq!(ansi.name(), "ANSI");
        assert!(ansi.supports_positioning());
        assert_eq!(dumb.kind(), TerminalKind::Dumb);
        assert_eq!(dumb.name(), "Dumb");
        assert!(!dumb.supports_fore_color());
    }
}
