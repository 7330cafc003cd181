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

//! One-shot capability negotiation
//!
//! The detector discards anything the client already sent, writes `ESC [ R` and
//! waits a bounded window for a single byte. A client that answers with `ESC`
//! speaks ANSI; silence or any other byte selects the dumb fallback. Transport
//! failures during the probe are reported, never masked as a dumb terminal.

use crate::consts::{ASCII_ESCAPE, DEFAULT_DETECT_WINDOW, PROBE_SEQUENCE};
use crate::result::TerminalResult;
use crate::stream::{TerminalStream, Transport};
use crate::terminal::{Terminal, TerminalKind};
use metrics::counter;
use std::time::Duration;
use tracing::{debug, instrument};

/// Selects the terminal emulation for a new connection
#[derive(Debug, Clone, Copy)]
pub struct TerminalDetector {
    window: Duration,
}

impl Default for TerminalDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DETECT_WINDOW)
    }
}

impl TerminalDetector {
    /// Create a detector that waits `window` for the probe answer
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// How long the client has to answer
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Probe the client and report which emulation it supports
    #[instrument(skip_all, fields(window = ?self.window))]
    pub async fn probe<S: Transport>(
        &self,
        stream: &mut TerminalStream<S>,
    ) -> TerminalResult<TerminalKind> {
        stream.clear_buffer()?;
        stream.send(&PROBE_SEQUENCE).await?;

        let answer = stream.recv_timeout(self.window).await?;
        let kind = match answer {
            Some(ASCII_ESCAPE) => {
                // the rest of the client's report must not reach the first prompt
                stream.clear_buffer()?;
                TerminalKind::Ansi
            }
            _ => TerminalKind::Dumb,
        };

        debug!(answer = ?answer, kind = %kind, "Terminal detected");
        counter!("switchboard.terminals.detected", "kind" => kind.to_string()).increment(1);
        Ok(kind)
    }

    /// Probe the client and wrap the stream in the matching terminal
    pub async fn detect<S: Transport>(
        &self,
        mut stream: TerminalStream<S>,
    ) -> TerminalResult<Terminal<S>> {
        let kind = self.probe(&mut stream).await?;
        Ok(Terminal::new(kind, stream))
    }
}
