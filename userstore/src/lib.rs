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

//! Fixed-record user credential store
//!
//! ```text
//! offset 0      2                 77                152
//!        ├ ver ─┼── record 0 ─────┼── record 1 ─────┼ ...
//! ```
//!
//! A store file is a 2 byte [`StoreVersion`] header followed by 75 byte
//! [`UserRecord`] images. Record 0 is the superuser and is written only when the
//! store is created.
//!
//! # Example
//!
//! ```no_run
//! use switchboard_userstore::{UserRecord, UserStore};
//!
//! # async fn demo() -> switchboard_userstore::StoreResult<()> {
//! let store = UserStore::open_or_create("users.dat").await?;
//! let number = store.next_number().await?;
//! store.update(&UserRecord::new(number, "alice", "Alice Liddell", "rabbit")?).await?;
//! assert!(store.retrieve("alice", "RABBIT").await.is_some());
//! # Ok(())
//! # }
//! ```

mod record;
mod result;
mod store;
mod version;

pub use self::record::{
    HANDLE_LEN, PASSWORD_LEN, REAL_NAME_LEN, RECORD_LEN, SUPERUSER_NUMBER, UserRecord,
    record_offset,
};
pub use self::result::{StoreError, StoreResult};
pub use self::store::UserStore;
pub use self::version::{HEADER_LEN, StoreVersion};
