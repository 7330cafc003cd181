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

use std::time::Duration;

/// ASCII escape, the first byte of every control sequence.
pub const ASCII_ESCAPE: u8 = 0x1B;

/// ASCII backspace as sent by the client to erase a character.
pub const ASCII_BACKSPACE: u8 = 0x08;

/// ASCII carriage return, the line terminator of the line protocol.
pub const ASCII_CR: u8 = b'\r';

/// Line ending sent to clients.
pub const CRLF: &[u8] = b"\r\n";

/// Echoed to the client for every accepted backspace.
pub const ERASE_SEQUENCE: [u8; 3] = [ASCII_BACKSPACE, b' ', ASCII_BACKSPACE];

/// Capability probe. Also used as the cursor position query.
pub const PROBE_SEQUENCE: [u8; 3] = [ASCII_ESCAPE, b'[', b'R'];

/// Clear screen as understood by the clients this server targets.
pub const CLEAR_SCREEN_SEQUENCE: [u8; 3] = [ASCII_ESCAPE, b'2', b'J'];

/// Number of line endings a dumb terminal receives in place of a clear screen.
pub const DUMB_CLEAR_LINES: usize = 49;

/// Upper bound on the bytes read while waiting for a cursor report.
pub const CURSOR_REPORT_MAX: usize = 10;

/// Colors at or above this index request the intensity attribute.
pub const INTENSITY_COLORS: u8 = 8;

/// How long a client has to answer the capability probe.
pub const DEFAULT_DETECT_WINDOW: Duration = Duration::from_secs(3);
