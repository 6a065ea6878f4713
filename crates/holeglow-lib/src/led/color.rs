//! Named LED colors of the PiGlow board.
//!
//! Every arm carries one LED of each color, in the order of [`Color::ALL`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the six LED colors present on each arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    White,
}

impl Color {
    /// All colors in arm order (outermost LED first).
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::White,
    ];

    /// Position of this color within an arm (0–5).
    pub fn position(self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Orange => 1,
            Color::Yellow => 2,
            Color::Green => 3,
            Color::Blue => 4,
            Color::White => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = crate::HoleglowError;

    /// Parse a color name, case-insensitively.
    fn from_str(s: &str) -> crate::error::Result<Self> {
        let s = s.trim();
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                crate::HoleglowError::Config(format!(
                    "unknown color: {s} (expected one of red, orange, yellow, green, blue, white)"
                ))
            })
    }
}

impl TryFrom<String> for Color {
    type Error = crate::HoleglowError;

    fn try_from(s: String) -> crate::error::Result<Self> {
        s.parse()
    }
}
