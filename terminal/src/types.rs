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

use crate::consts::INTENSITY_COLORS;
use crate::result::InvalidColor;
use std::fmt;

/// One of the sixteen colors a capability may render
///
/// Indices 0 through 7 are the base hues. Indices 8 through 15 share the base
/// hue of `index - 8` and additionally request the intensity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TerminalColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl TerminalColor {
    /// All colors in index order
    pub const ALL: [TerminalColor; 16] = [
        TerminalColor::Black,
        TerminalColor::Red,
        TerminalColor::Green,
        TerminalColor::Yellow,
        TerminalColor::Blue,
        TerminalColor::Magenta,
        TerminalColor::Cyan,
        TerminalColor::White,
        TerminalColor::BrightBlack,
        TerminalColor::BrightRed,
        TerminalColor::BrightGreen,
        TerminalColor::BrightYellow,
        TerminalColor::BrightBlue,
        TerminalColor::BrightMagenta,
        TerminalColor::BrightCyan,
        TerminalColor::BrightWhite,
    ];

    /// Color identifier, 0 through 15
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Whether the color requests the intensity attribute
    pub fn is_intense(self) -> bool {
        self.index() >= INTENSITY_COLORS
    }

    /// The base hue, 0 through 7
    pub fn base(self) -> TerminalColor {
        Self::ALL[(self.index() % INTENSITY_COLORS) as usize]
    }

    /// ASCII digit of the base hue as used in SGR parameters
    pub fn base_digit(self) -> u8 {
        b'0' + self.base().index()
    }
}

impl TryFrom<u8> for TerminalColor {
    type Error = InvalidColor;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidColor(value))
    }
}

impl fmt::Display for TerminalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Cursor location as reported by the client, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

impl CursorPosition {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.row, self.col)
    }
}
