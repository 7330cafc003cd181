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

//! Fixed-width user records
//!
//! Each record is a 75 byte image of three space padded ASCII fields:
//!
//! ```text
//! 0                    20                                      60             75
//! ├──── handle (20) ───┼──────────── real name (40) ───────────┼─ password ───┤
//! ```
//!
//! Record `n` lives at file offset `HEADER_LEN + n * RECORD_LEN`. The record number
//! itself is not stored; it is implied by position.

use crate::result::{StoreError, StoreResult};
use crate::version::HEADER_LEN;
use std::fmt;

/// Width of the handle field
pub const HANDLE_LEN: usize = 20;
/// Width of the real name field
pub const REAL_NAME_LEN: usize = 40;
/// Width of the password field
pub const PASSWORD_LEN: usize = 15;
/// Width of one record on disk
pub const RECORD_LEN: usize = HANDLE_LEN + REAL_NAME_LEN + PASSWORD_LEN;

/// Record number of the superuser account
pub const SUPERUSER_NUMBER: u32 = 0;

const HANDLE_OFFSET: usize = 0;
const REAL_NAME_OFFSET: usize = HANDLE_OFFSET + HANDLE_LEN;
const PASSWORD_OFFSET: usize = REAL_NAME_OFFSET + REAL_NAME_LEN;
const PAD: u8 = b' ';

/// File offset of record `number`
pub fn record_offset(number: u32) -> u64 {
    HEADER_LEN + u64::from(number) * RECORD_LEN as u64
}

/// Number of whole records in a file of `file_len` bytes
pub fn records_in(file_len: u64) -> u32 {
    let count = file_len.saturating_sub(HEADER_LEN) / RECORD_LEN as u64;
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn validate(field: &'static str, value: &str, max: usize) -> StoreResult<()> {
    if !value.is_ascii() {
        return Err(StoreError::NotAscii { field });
    }
    if value.len() > max {
        return Err(StoreError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

fn validate_handle(handle: &str) -> StoreResult<()> {
    if handle.is_empty() {
        return Err(StoreError::EmptyField { field: "handle" });
    }
    validate("handle", handle, HANDLE_LEN)
}

fn decode_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

/// One account
///
/// Values returned by the store are snapshots; changing one has no effect until it
/// is written back with [`UserStore::update`](crate::UserStore::update).
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    number: u32,
    handle: String,
    real_name: String,
    password: String,
}

impl UserRecord {
    /// Create a record for a new or replaced account
    ///
    /// `number` must not be [`SUPERUSER_NUMBER`]; that record is only written when
    /// the store is created.
    pub fn new(
        number: u32,
        handle: impl Into<String>,
        real_name: impl Into<String>,
        password: impl Into<String>,
    ) -> StoreResult<Self> {
        if number == SUPERUSER_NUMBER {
            return Err(StoreError::ReservedNumber);
        }
        let record = Self {
            number,
            handle: handle.into(),
            real_name: real_name.into(),
            password: password.into(),
        };
        validate_handle(&record.handle)?;
        validate("real_name", &record.real_name, REAL_NAME_LEN)?;
        validate("password", &record.password, PASSWORD_LEN)?;
        Ok(record)
    }

    /// The account written as record 0 of a fresh store
    pub(crate) fn superuser() -> Self {
        Self {
            number: SUPERUSER_NUMBER,
            handle: "root".to_string(),
            real_name: "John Sysop".to_string(),
            password: String::new(),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether this is the superuser account
    pub fn is_superuser(&self) -> bool {
        self.number == SUPERUSER_NUMBER
    }

    /// Move the record to another slot. Slot 0 cannot be assigned.
    pub fn set_number(&mut self, number: u32) -> StoreResult<()> {
        if number == SUPERUSER_NUMBER {
            return Err(StoreError::ReservedNumber);
        }
        self.number = number;
        Ok(())
    }

    pub fn set_handle(&mut self, handle: impl Into<String>) -> StoreResult<()> {
        let handle = handle.into();
        validate_handle(&handle)?;
        self.handle = handle;
        Ok(())
    }

    pub fn set_real_name(&mut self, real_name: impl Into<String>) -> StoreResult<()> {
        let real_name = real_name.into();
        validate("real_name", &real_name, REAL_NAME_LEN)?;
        self.real_name = real_name;
        Ok(())
    }

    pub fn set_password(&mut self, password: impl Into<String>) -> StoreResult<()> {
        let password = password.into();
        validate("password", &password, PASSWORD_LEN)?;
        self.password = password;
        Ok(())
    }

    /// Passwords compare without regard to ASCII case
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password.eq_ignore_ascii_case(candidate)
    }

    /// File offset of this record
    pub fn offset(&self) -> u64 {
        record_offset(self.number)
    }

    /// Disk image of the record
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut image = [PAD; RECORD_LEN];
        let fields = [
            (HANDLE_OFFSET, HANDLE_LEN, self.handle.as_bytes()),
            (REAL_NAME_OFFSET, REAL_NAME_LEN, self.real_name.as_bytes()),
            (PASSWORD_OFFSET, PASSWORD_LEN, self.password.as_bytes()),
        ];
        for (offset, width, bytes) in fields {
            let len = bytes.len().min(width);
            image[offset..offset + len].copy_from_slice(&bytes[..len]);
        }
        image
    }

    /// Rebuild the record stored at position `number` from its disk image
    pub fn decode(number: u32, image: &[u8; RECORD_LEN]) -> Self {
        Self {
            number,
            handle: decode_field(&image[HANDLE_OFFSET..REAL_NAME_OFFSET]),
            real_name: decode_field(&image[REAL_NAME_OFFSET..PASSWORD_OFFSET]),
            password: decode_field(&image[PASSWORD_OFFSET..RECORD_LEN]),
        }
    }

    /// Whether the handle field of `image` starts with `query`, byte for byte
    pub(crate) fn handle_field_matches(image: &[u8; RECORD_LEN], query: &[u8]) -> bool {
        query.len() <= HANDLE_LEN && image[HANDLE_OFFSET..HANDLE_OFFSET + query.len()] == *query
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("number", &self.number)
            .field("handle", &self.handle)
            .field("real_name", &self.real_name)
            .field("password", &"<redacted>")
            .finish()
    }
}
