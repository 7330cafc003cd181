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

//! Error types for the session service

use switchboard_userstore::StoreError;
use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Session service errors
///
/// These cover setup and lifecycle of the service itself. A single session's
/// failures never surface here; they end that session only.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// I/O error from the listening socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The user store could not be opened or is the wrong version
    #[error("User store error: {0}")]
    Store(#[from] StoreError),

    /// The configuration was rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// `start` was called on a running server
    #[error("Server already running")]
    AlreadyRunning,

    /// `shutdown` was called on a server that is not running
    #[error("Server not running")]
    NotRunning,
}

impl ServiceError {
    /// Check if the error is a start/stop ordering mistake rather than a failure
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, ServiceError::AlreadyRunning | ServiceError::NotRunning)
    }

    /// Check if the error came from the user store
    pub fn is_store_error(&self) -> bool {
        matches!(self, ServiceError::Store(_))
    }
}
