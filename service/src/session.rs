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

//! Per-connection session
//!
//! A [`Session`] drives one client from the accepted transport to teardown:
//!
//! ```text
//! detect terminal → admit → greet → login (≤ login_tries) → SessionHandler::on_active
//!        │             │                    │                        │
//!        └─────────────┴──── any fault, rejection or cancellation ───┴──▶ teardown
//! ```
//!
//! Every phase runs under the session's cancellation token. Teardown always
//! shuts the transport down and frees the registry slot exactly once.

use crate::context::ServiceContext;
use crate::handler::{ActiveSession, SessionHandler};
use crate::types::{SessionId, SessionInfo, SessionState};
use metrics::counter;
use parking_lot::RwLock;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;
use switchboard_terminal::{
    BoxTransport, Terminal, TerminalCapability, TerminalDetector, TerminalError, TerminalKind,
    TerminalResult, TerminalStream,
};
use switchboard_userstore::{HANDLE_LEN, PASSWORD_LEN, UserRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

const DETECT_NOTICE: &str = "Please wait...checking term emulation...";
const REJECT_NOTICE: &str =
    "Sorry, we can't connect you at this time. Try again later. Thanks!\r\n\r\n";
const LOGIN_BANNER: &str = "  Please Login.";
const USERNAME_PROMPT: &str = "username : ";
const PASSWORD_PROMPT: &str = "password : ";
const LOGIN_INCORRECT: &str = "Login incorrect.";

/// Extra input accepted past a field's width, so the prompt does not reveal it
const LINE_SLACK: usize = 20;

#[derive(Default)]
struct SessionDetails {
    terminal: Option<TerminalKind>,
    user: Option<String>,
}

/// Shared view of a running session
///
/// The registry holds these; the session task owns everything else.
pub struct SessionHandle {
    id: SessionId,
    peer_addr: Option<SocketAddr>,
    connected_at: Instant,
    state: AtomicU8,
    details: RwLock<SessionDetails>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Create a handle in the `New` state
    pub fn new(id: SessionId, peer_addr: Option<SocketAddr>, cancel: CancellationToken) -> Self {
        Self {
            id,
            peer_addr,
            connected_at: Instant::now(),
            state: AtomicU8::new(SessionState::New.as_u8()),
            details: RwLock::new(SessionDetails::default()),
            cancel,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Negotiated terminal, once detection finished
    pub fn terminal(&self) -> Option<TerminalKind> {
        self.details.read().terminal
    }

    /// Handle of the logged in user
    pub fn user(&self) -> Option<String> {
        self.details.read().user.clone()
    }

    /// Ask the session to end; it tears itself down at its next suspension point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Point-in-time snapshot
    pub fn info(&self) -> SessionInfo {
        let details = self.details.read();
        SessionInfo {
            id: self.id,
            state: self.state(),
            peer_addr: self.peer_addr,
            terminal: details.terminal,
            user: details.user.clone(),
            connected_at: self.connected_at,
        }
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn set_terminal(&self, kind: TerminalKind) {
        self.details.write().terminal = Some(kind);
    }

    pub(crate) fn set_user(&self, handle: &str) {
        self.details.write().user = Some(handle.to_string());
    }

    /// Move to `Closed`; true only for the call that actually closed the session
    pub(crate) fn close(&self) -> bool {
        self.state.swap(SessionState::Closed.as_u8(), Ordering::AcqRel)
            != SessionState::Closed.as_u8()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// How a session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// The registry was full
    Rejected,
    /// Every login attempt failed
    LoginFailed,
    /// Post-login logic returned normally
    Completed,
    /// The transport failed, went idle, or the session was cancelled
    ConnectionLost(TerminalError),
}

impl SessionOutcome {
    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::Rejected => "rejected",
            SessionOutcome::LoginFailed => "login_failed",
            SessionOutcome::Completed => "completed",
            SessionOutcome::ConnectionLost(_) => "connection_lost",
        }
    }

    pub fn is_connection_lost(&self) -> bool {
        matches!(self, SessionOutcome::ConnectionLost(_))
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::ConnectionLost(err) => write!(f, "connection_lost ({err})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Run `phase` unless the session is cancelled first
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    phase: impl Future<Output = TerminalResult<T>>,
) -> TerminalResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            Err(TerminalError::connection_lost("session cancelled", "Session::run"))
        }
        result = phase => result,
    }
}

/// One client connection from accept to teardown
pub struct Session {
    handle: Arc<SessionHandle>,
    context: Arc<ServiceContext>,
    handler: Arc<dyn SessionHandler>,
}

impl Session {
    /// Build a session for a freshly accepted client
    pub fn new(
        context: Arc<ServiceContext>,
        handler: Arc<dyn SessionHandler>,
        peer_addr: Option<SocketAddr>,
    ) -> Self {
        let handle = Arc::new(SessionHandle::new(
            context.next_session_id(),
            peer_addr,
            context.shutdown_token().child_token(),
        ));
        counter!("switchboard.sessions.total").increment(1);
        Self {
            handle,
            context,
            handler,
        }
    }

    pub fn handle(&self) -> &Arc<SessionHandle> {
        &self.handle
    }

    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// Drive the session to completion over `transport`
    ///
    /// Never fails: every fault ends this session only and is reported in the
    /// returned outcome.
    #[instrument(skip_all, fields(session = %self.handle.id(), peer = ?self.handle.peer_addr()))]
    pub async fn run(self, transport: BoxTransport) -> SessionOutcome {
        let cancel = self.handle.cancellation_token().clone();
        let config = self.context.config();
        let detector = TerminalDetector::new(config.detect_window);
        let mut stream = TerminalStream::new(transport).with_idle_timeout(config.idle_timeout);

        self.handle.set_state(SessionState::Detecting);
        let detected = until_cancelled(&cancel, async {
            stream.send_str(DETECT_NOTICE).await?;
            detector.probe(&mut stream).await
        })
        .await;

        let outcome = match detected {
            Ok(kind) => {
                self.handle.set_terminal(kind);
                let mut terminal = Terminal::new(kind, stream);
                let outcome = until_cancelled(&cancel, self.converse(&mut terminal))
                    .await
                    .unwrap_or_else(SessionOutcome::ConnectionLost);
                if let Err(err) = terminal.shutdown().await {
                    trace!(error = %err, "Transport already gone at teardown");
                }
                outcome
            }
            Err(err) => {
                if let Err(err) = stream.shutdown().await {
                    trace!(error = %err, "Transport already gone at teardown");
                }
                SessionOutcome::ConnectionLost(err)
            }
        };

        self.teardown(&outcome).await;
        outcome
    }

    async fn converse(&self, terminal: &mut Terminal<BoxTransport>) -> TerminalResult<SessionOutcome> {
        terminal.initialize().await?;

        if !self.context.registry().admit(&self.handle) {
            self.handle.set_state(SessionState::Rejected);
            info!("Session rejected, registry full");
            terminal.send_str(REJECT_NOTICE).await?;
            return Ok(SessionOutcome::Rejected);
        }
        self.handle.set_state(SessionState::Registered);
        self.greet(terminal).await?;

        self.handle.set_state(SessionState::Authenticating);
        let Some(user) = self.authenticate(terminal).await? else {
            return Ok(SessionOutcome::LoginFailed);
        };
        self.handle.set_user(user.handle());
        self.handle.set_state(SessionState::Authenticated);

        self.handle.set_state(SessionState::Active);
        let mut active = ActiveSession::new(&self.handle, &self.context, terminal, user);
        self.handler.on_active(&mut active).await?;
        Ok(SessionOutcome::Completed)
    }

    async fn greet(&self, terminal: &mut Terminal<BoxTransport>) -> TerminalResult<()> {
        let greeting = format!("Connected with {} terminal.", terminal.name());
        terminal.send_line(&greeting).await?;
        terminal.newline().await?;
        terminal.send_line(&self.context.config().bbs_name).await?;
        terminal.send_line(LOGIN_BANNER).await
    }

    async fn authenticate(
        &self,
        terminal: &mut Terminal<BoxTransport>,
    ) -> TerminalResult<Option<UserRecord>> {
        let tries = self.context.config().login_tries;
        for attempt in 1..=tries {
            terminal.send_str(USERNAME_PROMPT).await?;
            let handle = terminal.read_line(HANDLE_LEN + LINE_SLACK).await?;
            terminal.send_str(PASSWORD_PROMPT).await?;
            let password = terminal.read_line(PASSWORD_LEN + LINE_SLACK).await?;

            if let Some(user) = self.context.store().retrieve(&handle, &password).await {
                counter!("switchboard.logins.accepted").increment(1);
                info!(user = user.handle(), attempt, "Login accepted");
                return Ok(Some(user));
            }

            counter!("switchboard.logins.failed").increment(1);
            warn!(attempt, tries, "Login incorrect");
            terminal.send_line(LOGIN_INCORRECT).await?;
            terminal.newline().await?;
        }
        Ok(None)
    }

    async fn teardown(&self, outcome: &SessionOutcome) {
        if !self.handle.close() {
            return;
        }
        self.context.registry().remove(&self.handle);
        counter!("switchboard.sessions.closed", "outcome" => outcome.label()).increment(1);
        match outcome {
            SessionOutcome::ConnectionLost(err) => debug!(error = %err, "Session closed"),
            other => info!(outcome = %other, "Session closed"),
        }
        self.handler.on_disconnect(&self.handle.info()).await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // a task aborted mid-run still gives its slot back
        if self.handle.close() {
            self.context.registry().remove(&self.handle);
            warn!(session = %self.handle.id(), "Session dropped before teardown");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_close_once() {
        let handle = SessionHandle::new(SessionId::new(1), None, CancellationToken::new());
        assert_eq!(handle.state(), SessionState::New);
        assert!(handle.close());
        assert!(!handle.close());
        assert_eq!(handle.state(), SessionState::Closed);
    }

    #[test]
    fn test_handle_info_tracks_details() {
        let handle = SessionHandle::new(SessionId::new(3), None, CancellationToken::new());
        handle.set_terminal(TerminalKind::Ansi);
        handle.set_user("alice");
        handle.set_state(SessionState::Active);

        let info = handle.info();
        assert_eq!(info.id, SessionId::new(3));
        assert_eq!(info.state, SessionState::Active);
        assert_eq!(info.terminal, Some(TerminalKind::Ansi));
        assert_eq!(info.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SessionOutcome::Rejected.to_string(), "rejected");
        assert_eq!(SessionOutcome::LoginFailed.label(), "login_failed");
        let lost = SessionOutcome::ConnectionLost(TerminalError::connection_lost(
            "idle timeout",
            "TerminalStream::recv",
        ));
        assert!(lost.is_connection_lost());
        assert!(lost.to_string().starts_with("connection_lost ("));
    }

    #[tokio::test]
    async fn test_until_cancelled_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: TerminalResult<()> =
            until_cancelled(&cancel, std::future::pending()).await;
        let err = result.unwrap_err();
        assert!(err.is_connection_lost());
        assert_eq!(err.message(), "session cancelled");
    }
}
