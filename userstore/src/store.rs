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

//! File-backed user store
//!
//! All reads and writes go through a single file handle guarded by one async
//! mutex, so a lookup never observes a record that is half written.

use crate::record::{RECORD_LEN, UserRecord, record_offset, records_in};
use crate::result::{StoreError, StoreResult};
use crate::version::{HEADER_LEN, StoreVersion};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Fixed-record credential store
pub struct UserStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl UserStore {
    /// Create a new store holding only the superuser record
    ///
    /// Fails if `path` already exists.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        file.write_all(&StoreVersion::CURRENT.encode()).await?;
        file.write_all(&UserRecord::superuser().encode()).await?;
        file.flush().await?;

        info!(version = %StoreVersion::CURRENT, "User store created");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open an existing store for reading and writing
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .await?;
        debug!("User store opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open the store at `path`, creating it first if it does not exist
    pub async fn open_or_create(path: impl AsRef<Path>) -> StoreResult<Self> {
        match Self::open(&path).await {
            Err(StoreError::Io(err)) if err.kind() == ErrorKind::NotFound => {
                Self::create(path).await
            }
            other => other,
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version stamped in the header
    pub async fn version(&self) -> StoreResult<StoreVersion> {
        let mut file = self.file.lock().await;
        let mut header = [0u8; HEADER_LEN as usize];
        file.seek(SeekFrom::Start(0)).await?;
        file.read_exact(&mut header).await?;
        Ok(StoreVersion::decode(header))
    }

    /// Fail unless the header names `expected`
    pub async fn check_version(&self, expected: StoreVersion) -> StoreResult<()> {
        let found = self.version().await?;
        if found != expected {
            return Err(StoreError::VersionMismatch { found, expected });
        }
        Ok(())
    }

    /// Number of whole records in the store, the superuser included
    pub async fn record_count(&self) -> StoreResult<u32> {
        let file = self.file.lock().await;
        let len = file.metadata().await?.len();
        Ok(records_in(len))
    }

    /// First record number past the end of the store
    ///
    /// The lock is released before this returns, so the number may be taken by
    /// the time the caller writes it. Create accounts with
    /// [`append`](Self::append) instead.
    pub async fn next_number(&self) -> StoreResult<u32> {
        self.record_count().await
    }

    /// Create a new account at the end of the store
    ///
    /// The number is assigned and the record written under one lock, so
    /// concurrent callers always get distinct numbers.
    #[instrument(skip(self, real_name, password))]
    pub async fn append(
        &self,
        handle: &str,
        real_name: &str,
        password: &str,
    ) -> StoreResult<UserRecord> {
        let mut file = self.file.lock().await;
        let number = records_in(file.metadata().await?.len());
        let record = UserRecord::new(number, handle, real_name, password)?;
        Self::write_at(&mut file, &record).await?;
        info!(number, "User account created");
        Ok(record)
    }

    /// Look up an account by handle and password
    ///
    /// Records are scanned from number 0. The first record whose handle field starts
    /// with `handle` (case-sensitive) decides the result: its password is compared
    /// ignoring case. An unknown handle, a wrong password and a failing file all
    /// yield `None`.
    #[instrument(skip(self, password))]
    pub async fn retrieve(&self, handle: &str, password: &str) -> Option<UserRecord> {
        let mut file = self.file.lock().await;
        match Self::scan(&mut file, handle.as_bytes()).await {
            Ok(Some(record)) if record.password_matches(password) => {
                debug!(number = record.number(), "User record matched");
                Some(record)
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "User store lookup failed");
                None
            }
        }
    }

    async fn scan(file: &mut File, query: &[u8]) -> std::io::Result<Option<UserRecord>> {
        // an empty prefix would match record 0 and log anyone in as the superuser
        if query.is_empty() || query.len() > crate::record::HANDLE_LEN {
            return Ok(None);
        }
        file.seek(SeekFrom::Start(HEADER_LEN)).await?;

        let mut reader = BufReader::new(file);
        let mut image = [0u8; RECORD_LEN];
        let mut number = 0u32;
        loop {
            match reader.read_exact(&mut image).await {
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
                Err(err) => return Err(err),
            }
            if UserRecord::handle_field_matches(&image, query) {
                return Ok(Some(UserRecord::decode(number, &image)));
            }
            number = number.saturating_add(1);
        }
    }

    /// Write `record` at the slot given by its number
    ///
    /// Writing past the end of the file appends the record; any gap left before it
    /// reads back as blank records.
    #[instrument(skip_all, fields(number = record.number(), handle = record.handle()))]
    pub async fn update(&self, record: &UserRecord) -> StoreResult<()> {
        let mut file = self.file.lock().await;
        Self::write_at(&mut file, record).await?;
        debug!("User record written");
        Ok(())
    }

    async fn write_at(file: &mut File, record: &UserRecord) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(record_offset(record.number())))
            .await?;
        file.write_all(&record.encode()).await?;
        file.flush().await
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_create_writes_header_and_superuser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.dat");
        let store = UserStore::create(&path).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 2 + RECORD_LEN);
        assert_eq!(&bytes[..2], &[0, 10]);
        assert_eq!(&bytes[2..6], b"root");

        assert_eq!(store.record_count().await.unwrap(), 1);
        assert_eq!(store.next_number().await.unwrap(), 1);
        let root = store.retrieve("root", "").await.unwrap();
        assert!(root.is_superuser());
        assert_eq!(root.real_name(), "John Sysop");
        assert!(logs_contain("User store created"));
    }

    #[tokio::test]
    async fn test_create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.dat");
        UserStore::create(&path).await.unwrap();
        assert!(UserStore::create(&path).await.unwrap_err().is_io());
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = UserStore::open(dir.path().join("absent.dat")).await;
        assert!(result.unwrap_err().is_io());
    }

    #[tokio::test]
    async fn test_empty_handle_never_matches() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::create(dir.path().join("users.dat"))
            .await
            .unwrap();
        assert!(store.retrieve("", "").await.is_none());
    }

    #[tokio::test]
    async fn test_truncated_tail_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.dat");
        drop(UserStore::create(&path).await.unwrap());

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(b"partial");
        std::fs::write(&path, bytes).unwrap();

        let store = UserStore::open(&path).await.unwrap();
        assert_eq!(store.record_count().await.unwrap(), 1);
        assert!(store.retrieve("partial", "").await.is_none());
    }
}
