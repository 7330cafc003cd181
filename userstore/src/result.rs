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

//! Error types for the user store

use crate::version::StoreVersion;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// User store errors
///
/// Lookups never surface these; a failed lookup is simply "not found". They are
/// reported by store setup, version checks, writes and record validation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the backing file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file's header names a different schema version
    #[error("Store version {found} does not match expected version {expected}")]
    VersionMismatch {
        /// Version found in the header
        found: StoreVersion,
        /// Version the caller requires
        expected: StoreVersion,
    },

    /// A field does not fit its fixed width
    #[error("Field {field} is {len} bytes, limit is {max}")]
    FieldTooLong {
        /// Field name
        field: &'static str,
        /// Encoded length
        len: usize,
        /// Fixed width of the field
        max: usize,
    },

    /// A field holds non-ASCII text
    #[error("Field {field} must be ASCII")]
    NotAscii {
        /// Field name
        field: &'static str,
    },

    /// A required field is empty
    #[error("Field {field} must not be empty")]
    EmptyField {
        /// Field name
        field: &'static str,
    },

    /// Record number 0 belongs to the superuser and is only assigned at creation
    #[error("Record number 0 is reserved for the superuser")]
    ReservedNumber,
}

impl StoreError {
    /// Check if the error came from the backing file rather than from input validation
    pub fn is_io(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}
