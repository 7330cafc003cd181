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

//! Error types for the terminal layer

use thiserror::Error;

/// Result type for terminal operations
pub type TerminalResult<T> = Result<T, TerminalError>;

/// Terminal layer errors
///
/// Every transport primitive funnels its failures into [`TerminalError::ConnectionLost`].
/// The error carries the call site that observed the failure so a session can log
/// where the carrier dropped before tearing itself down.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// The remote end can no longer be reached
    #[error("Connection lost in {context}: {message}")]
    ConnectionLost {
        /// Human readable cause
        message: String,
        /// Call site that observed the failure
        context: &'static str,
    },
}

impl TerminalError {
    /// Create a connection-lost error
    pub fn connection_lost(message: impl Into<String>, context: &'static str) -> Self {
        TerminalError::ConnectionLost {
            message: message.into(),
            context,
        }
    }

    /// Convert an I/O failure observed at `context` into a connection-lost error
    pub fn from_io(error: std::io::Error, context: &'static str) -> Self {
        let message = match error.kind() {
            std::io::ErrorKind::UnexpectedEof => "connection closed by peer".to_string(),
            _ => error.to_string(),
        };
        Self::connection_lost(message, context)
    }

    /// Human readable cause of the failure
    pub fn message(&self) -> &str {
        match self {
            TerminalError::ConnectionLost { message, .. } => message,
        }
    }

    /// Call site that observed the failure
    pub fn context(&self) -> &'static str {
        match self {
            TerminalError::ConnectionLost { context, .. } => context,
        }
    }

    /// Check if the error means the session has lost its carrier
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, TerminalError::ConnectionLost { .. })
    }
}

/// Returned when a byte does not name one of the sixteen terminal colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid terminal color index {0}")]
pub struct InvalidColor(pub u8);
