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

//! ANSI terminal capability
//!
//! Wire encodings used here:
//!
//! | Operation      | Bytes                               |
//! |----------------|-------------------------------------|
//! | background     | `ESC [ 4 <digit> m`                 |
//! | foreground     | `ESC [ <0 or 1> ; 3 <digit> m`      |
//! | cursor query   | `ESC [ R`, reply `ESC [ rr ; cc R`  |
//! | cursor set     | `ESC [ <row> ; <col> H`             |
//! | clear screen   | `ESC 2 J`                           |
//!
//! A foreground with attribute `0` resets every SGR attribute on the client, the
//! background included, so [`AnsiTerminal`] replays the last background after it.

use crate::capability::TerminalCapability;
use crate::consts::{ASCII_ESCAPE, CLEAR_SCREEN_SEQUENCE, CURSOR_REPORT_MAX, PROBE_SEQUENCE};
use crate::result::TerminalResult;
use crate::stream::{TerminalStream, Transport};
use crate::types::{CursorPosition, TerminalColor};
use async_trait::async_trait;
use tracing::trace;

/// Encode a background color change
pub fn encode_back_color(color: TerminalColor) -> [u8; 5] {
    [ASCII_ESCAPE, b'[', b'4', color.base_digit(), b'm']
}

/// Encode a foreground color change
///
/// Intense colors carry attribute `1`; base colors carry `0`, which also resets
/// every other attribute on the client.
pub fn encode_fore_color(color: TerminalColor) -> [u8; 7] {
    let attribute = if color.is_intense() { b'1' } else { b'0' };
    [
        ASCII_ESCAPE,
        b'[',
        attribute,
        b';',
        b'3',
        color.base_digit(),
        b'm',
    ]
}

/// Encode a cursor move with minimal decimal digits
pub fn encode_cursor_position(row: u16, col: u16) -> Vec<u8> {
    let mut sequence = vec![ASCII_ESCAPE, b'['];
    sequence.extend_from_slice(row.to_string().as_bytes());
    sequence.push(b';');
    sequence.extend_from_slice(col.to_string().as_bytes());
    sequence.push(b'H');
    sequence
}

/// Parse a cursor report of the form `ESC [ rr ; cc R`
///
/// Both fields are read as exactly two decimal digits at fixed offsets. Anything
/// else yields `None`.
pub fn parse_cursor_report(reply: &[u8]) -> Option<CursorPosition> {
    fn two_digits(field: &[u8]) -> Option<u16> {
        match field {
            [tens, ones] if tens.is_ascii_digit() && ones.is_ascii_digit() => {
                Some(u16::from(tens - b'0') * 10 + u16::from(ones - b'0'))
            }
            _ => None,
        }
    }

    let row = two_digits(reply.get(2..4)?)?;
    let col = two_digits(reply.get(5..7)?)?;
    Some(CursorPosition::new(row, col))
}

/// Terminal that understands ANSI control sequences
pub struct AnsiTerminal<S> {
    stream: TerminalStream<S>,
    back_color: TerminalColor,
}

impl<S: Transport> AnsiTerminal<S> {
    /// Emulation name
    pub const NAME: &'static str = "ANSI";

    /// Wrap a stream whose client answered the capability probe
    pub fn new(stream: TerminalStream<S>) -> Self {
        Self {
            stream,
            back_color: TerminalColor::Black,
        }
    }

    /// Background color most recently sent to the client
    pub fn back_color(&self) -> TerminalColor {
        self.back_color
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
impl<S: Transport> TerminalCapability for AnsiTerminal<S> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supports_fore_color(&self) -> bool {
        true
    }

    fn supports_back_color(&self) -> bool {
        true
    }

    fn supports_positioning(&self) -> bool {
        true
    }

    async fn initialize(&mut self) -> TerminalResult<()> {
        self.set_fore_color(TerminalColor::White).await?;
        self.set_back_color(TerminalColor::Black).await?;
        self.clear_screen().await
    }

    async fn set_fore_color(&mut self, color: TerminalColor) -> TerminalResult<()> {
        self.stream.send(&encode_fore_color(color)).await?;
        if !color.is_intense() {
            // attribute 0 dropped the background on the client
            self.stream.send(&encode_back_color(self.back_color)).await?;
        }
        Ok(())
    }

    async fn set_back_color(&mut self, color: TerminalColor) -> TerminalResult<()> {
        self.stream.send(&encode_back_color(color)).await?;
        self.back_color = color;
        Ok(())
    }

    async fn cursor_position(&mut self) -> TerminalResult<Option<CursorPosition>> {
        self.stream.send(&PROBE_SEQUENCE).await?;

        let mut reply = Vec::with_capacity(CURSOR_REPORT_MAX);
        while reply.len() < CURSOR_REPORT_MAX {
            let byte = self.stream.recv().await?;
            reply.push(byte);
            if byte == b'R' {
                break;
            }
        }

        let position = parse_cursor_report(&reply);
        trace!(reply = ?reply, position = ?position, "Cursor report received");
        Ok(position)
    }

    async fn set_cursor_position(&mut self, row: u16, col: u16) -> TerminalResult<()> {
        self.stream.send(&encode_cursor_position(row, col)).await
    }

    async fn clear_screen(&mut self) -> TerminalResult<()> {
        self.stream.send(&CLEAR_SCREEN_SEQUENCE).await
    }
}

impl<S> std::fmt::Debug for AnsiTerminal<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiTerminal")
            .field("stream", &self.stream)
            .field("back_color", &self.back_color)
            .finish()
    }
}
