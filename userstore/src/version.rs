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

use std::fmt;

/// Length of the version header at the start of the store file
pub const HEADER_LEN: u64 = 2;

/// Schema version stamped into the first two bytes of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreVersion {
    pub major: u8,
    pub minor: u8,
}

impl StoreVersion {
    /// Version written by this release
    pub const CURRENT: StoreVersion = StoreVersion::new(0, 10);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Header bytes, major first
    pub fn encode(self) -> [u8; HEADER_LEN as usize] {
        [self.major, self.minor]
    }

    pub fn decode(header: [u8; HEADER_LEN as usize]) -> Self {
        Self::new(header[0], header[1])
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
