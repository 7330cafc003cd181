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

//! Post-login hooks

use crate::config::ServiceConfig;
use crate::context::ServiceContext;
use crate::registry::SessionRegistry;
use crate::session::SessionHandle;
use crate::types::{SessionId, SessionInfo};
use async_trait::async_trait;
use std::path::Path;
use switchboard_terminal::consts::ASCII_BACKSPACE;
use switchboard_terminal::{BoxTransport, Terminal, TerminalCapability, TerminalResult};
use switchboard_userstore::{UserRecord, UserStore};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

const PAUSE_PROMPT: &str = "Hit a key";
const FILE_CHUNK: usize = 256;

/// Application logic that runs once a user has logged in
///
/// All methods are async and have default implementations that do nothing.
///
/// # Example
///
/// ```no_run
/// use switchboard_service::{ActiveSession, SessionHandler};
/// use switchboard_terminal::TerminalResult;
/// use async_trait::async_trait;
///
/// struct Goodbye;
///
/// #[async_trait]
/// impl SessionHandler for Goodbye {
///     async fn on_active(&self, session: &mut ActiveSession<'_>) -> TerminalResult<()> {
///         let name = session.user().real_name().to_string();
///         session.terminal().send_line(&format!("Goodbye, {name}.")).await
///     }
/// }
/// ```
#[async_trait]
pub trait SessionHandler: Send + Sync + 'static {
    /// Called after a successful login
    ///
    /// The session ends when this returns. A connection-lost error is the normal
    /// way out when the client hangs up.
    async fn on_active(&self, _session: &mut ActiveSession<'_>) -> TerminalResult<()> {
        Ok(())
    }

    /// Called once after the session has been torn down
    ///
    /// Runs for every session, including rejected ones and ones that never logged in.
    async fn on_disconnect(&self, _info: &SessionInfo) {}
}

/// A logged in session as seen by post-login logic
pub struct ActiveSession<'a> {
    handle: &'a SessionHandle,
    context: &'a ServiceContext,
    terminal: &'a mut Terminal<BoxTransport>,
    user: UserRecord,
}

impl<'a> ActiveSession<'a> {
    pub(crate) fn new(
        handle: &'a SessionHandle,
        context: &'a ServiceContext,
        terminal: &'a mut Terminal<BoxTransport>,
        user: UserRecord,
    ) -> Self {
        Self {
            handle,
            context,
            terminal,
            user,
        }
    }

    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// The authenticated account
    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    /// Replace the session's copy of the account, e.g. after writing changes back
    pub fn set_user(&mut self, user: UserRecord) {
        self.handle.set_user(user.handle());
        self.user = user;
    }

    /// The negotiated terminal
    pub fn terminal(&mut self) -> &mut Terminal<BoxTransport> {
        &mut *self.terminal
    }

    pub fn store(&self) -> &UserStore {
        self.context.store()
    }

    pub fn registry(&self) -> &SessionRegistry {
        self.context.registry()
    }

    pub fn config(&self) -> &ServiceConfig {
        self.context.config()
    }

    /// Time since the service context was created
    pub fn uptime(&self) -> std::time::Duration {
        self.context.uptime()
    }

    /// Whether shutdown has been requested for this session
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Ask a yes/no question
    ///
    /// Keys other than `y` or `n` (either case) are ignored. The answer is echoed
    /// as "yes" or "no".
    pub async fn get_yes_no(&mut self, prompt: &str) -> TerminalResult<bool> {
        self.terminal.send_str(prompt).await?;
        let answer = loop {
            match self.terminal.recv().await?.to_ascii_lowercase() {
                b'y' => break true,
                b'n' => break false,
                _ => {}
            }
        };
        self.terminal
            .send_line(if answer { "yes" } else { "no" })
            .await?;
        Ok(answer)
    }

    /// Wait for any key, then erase the prompt
    pub async fn pause(&mut self) -> TerminalResult<()> {
        self.terminal.newline().await?;
        let row = if self.terminal.supports_positioning() {
            self.terminal.cursor_position().await?.map(|pos| pos.row)
        } else {
            None
        };

        self.terminal.send_str(PAUSE_PROMPT).await?;
        self.terminal.recv().await?;

        let blank = " ".repeat(PAUSE_PROMPT.len());
        match row {
            Some(row) => {
                self.terminal.set_cursor_position(row, 1).await?;
                self.terminal.send_str(&blank).await?;
                self.terminal.set_cursor_position(row, 1).await
            }
            None => {
                let back = vec![ASCII_BACKSPACE; PAUSE_PROMPT.len()];
                self.terminal.send(&back).await?;
                self.terminal.send_str(&blank).await?;
                self.terminal.send(&back).await
            }
        }
    }

    /// Send a file to the client as-is
    ///
    /// Returns false, after telling the user, when the file cannot be read. Only a
    /// lost connection is an error.
    pub async fn send_file(&mut self, path: impl AsRef<Path>) -> TerminalResult<bool> {
        let path = path.as_ref();
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "File not sent");
                let notice = format!("Couldn't send '{}'!", path.display());
                self.terminal.send_line(&notice).await?;
                return Ok(false);
            }
        };

        let mut chunk = [0u8; FILE_CHUNK];
        loop {
            match file.read(&mut chunk).await {
                Ok(0) => return Ok(true),
                Ok(read) => self.terminal.send(&chunk[..read]).await?,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "File read failed mid-send");
                    let notice = format!("Error sending '{}'!", path.display());
                    self.terminal.send_line(&notice).await?;
                    return Ok(false);
                }
            }
        }
    }
}

impl std::fmt::Debug for ActiveSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("id", &self.handle.id())
            .field("user", &self.user)
            .field("terminal", &self.terminal.kind())
            .finish()
    }
}
