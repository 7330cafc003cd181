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

//! Core types for the session service

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use switchboard_terminal::TerminalKind;

/// Unique identifier for a session (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a new session ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Session lifecycle state (stored as atomic u8 for lock-free reads)
///
/// ```text
/// New → Detecting → Registered → Authenticating → Authenticated → Active → Closed
///                 ↘ Rejected → Closed              ↘ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Built around an accepted transport
    New = 0,
    /// Probing the client's terminal
    Detecting = 1,
    /// Holding a registry slot
    Registered = 2,
    /// Turned away at admission
    Rejected = 3,
    /// Prompting for credentials
    Authenticating = 4,
    /// Credentials accepted
    Authenticated = 5,
    /// Running post-login logic
    Active = 6,
    /// Torn down
    Closed = 7,
}

impl SessionState {
    /// Convert from u8 (for atomic operations)
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::New,
            1 => Self::Detecting,
            2 => Self::Registered,
            3 => Self::Rejected,
            4 => Self::Authenticating,
            5 => Self::Authenticated,
            6 => Self::Active,
            _ => Self::Closed,
        }
    }

    /// Convert to u8 (for atomic operations)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if the session has finished
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if a user is logged in
    pub fn is_logged_in(self) -> bool {
        matches!(self, Self::Authenticated | Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Detecting => write!(f, "detecting"),
            Self::Registered => write!(f, "registered"),
            Self::Rejected => write!(f, "rejected"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Active => write!(f, "active"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Session information snapshot (for non-blocking queries)
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session ID
    pub id: SessionId,
    /// Current state
    pub state: SessionState,
    /// Peer address, when the transport has one
    pub peer_addr: Option<SocketAddr>,
    /// Negotiated terminal, once detection finished
    pub terminal: Option<TerminalKind>,
    /// Handle of the logged in user
    pub user: Option<String>,
    /// When the session was created
    pub connected_at: Instant,
}

impl SessionInfo {
    /// Get the session duration
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Server snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Number of admitted sessions
    pub active_sessions: usize,
    /// Sessions admitted since server start
    pub lifetime_sessions: u64,
    /// Registry capacity
    pub capacity: usize,
    /// Server bind address
    pub bind_address: SocketAddr,
    /// Server uptime
    pub uptime: Duration,
    /// Server start time
    pub started_at: Instant,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BbsServer {{ active: {}/{}, lifetime: {}, addr: {}, uptime: {} }}",
            self.active_sessions,
            self.capacity,
            self.lifetime_sessions,
            self.bind_address,
            format_uptime(self.uptime)
        )
    }
}

/// Render an uptime as "D days, H hours, M minutes, S seconds."
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{days} days, {hours} hours, {minutes} minutes, {seconds} seconds.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id() {
        let id1 = SessionId::new(1);
        let id2 = SessionId::new(2);

        assert_eq!(id1.as_u64(), 1);
        assert!(id1 < id2);
        assert_eq!(id2.to_string(), "session-2");
    }

    #[test]
    fn test_session_state_conversion() {
        for state in [
            SessionState::New,
            SessionState::Detecting,
            SessionState::Registered,
            SessionState::Rejected,
            SessionState::Authenticating,
            SessionState::Authenticated,
            SessionState::Active,
            SessionState::Closed,
        ] {
            assert_eq!(SessionState::from_u8(state.as_u8()), state);
        }
        assert_eq!(SessionState::from_u8(200), SessionState::Closed);
    }

    #[test]
    fn test_session_state_predicates() {
        assert!(SessionState::Closed.is_terminal());
        assert!(!SessionState::Rejected.is_terminal());
        assert!(SessionState::Active.is_logged_in());
        assert!(!SessionState::Authenticating.is_logged_in());
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(
            format_uptime(Duration::ZERO),
            "0 days, 0 hours, 0 minutes, 0 seconds."
        );
        let uptime = Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5);
        assert_eq!(format_uptime(uptime), "2 days, 3 hours, 4 minutes, 5 seconds.");
    }
}
