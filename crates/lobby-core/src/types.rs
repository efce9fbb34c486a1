use crate::{
    Result,
    constants::{MAX_HOST_LENGTH, MAX_NICKNAME_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trim `raw` and keep at most `max` characters.
fn trim_and_truncate(raw: &str, max: usize) -> String {
    raw.trim().chars().take(max).collect()
}

/// Player nickname (1-20 characters)
///
/// The nickname is trimmed and truncated to [`MAX_NICKNAME_LENGTH`]
/// characters. Only a blank nickname is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nickname(String);

impl Nickname {
    /// Create a new nickname, trimming and truncating the input.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the nickname is blank after trimming.
    pub fn new(raw: &str) -> Result<Self> {
        let nickname = trim_and_truncate(raw, MAX_NICKNAME_LENGTH);
        if nickname.is_empty() {
            return Err(Error::InvalidIdentity("nickname is blank".to_string()));
        }
        Ok(Nickname(nickname))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server host address (1-15 characters)
///
/// Same normalisation rules as [`Nickname`], with a [`MAX_HOST_LENGTH`] cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostAddress(String);

impl HostAddress {
    /// Create a new host address, trimming and truncating the input.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the host is blank after trimming.
    pub fn new(raw: &str) -> Result<Self> {
        let host = trim_and_truncate(raw, MAX_HOST_LENGTH);
        if host.is_empty() {
            return Err(Error::InvalidIdentity("host address is blank".to_string()));
        }
        Ok(HostAddress(host))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 8-bit RGB color of a player token.
///
/// Parsed from the textual forms the server sends: `#RGB`, `#RRGGBB`,
/// `0xRRGGBB`, bare `RRGGBB` and a set of basic color names. Eight-digit hex
/// forms carry an alpha byte, which is accepted and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Color::rgb(0x00, 0x00, 0x00),
            "white" => Color::rgb(0xFF, 0xFF, 0xFF),
            "red" => Color::rgb(0xFF, 0x00, 0x00),
            "green" => Color::rgb(0x00, 0x80, 0x00),
            "blue" => Color::rgb(0x00, 0x00, 0xFF),
            "yellow" => Color::rgb(0xFF, 0xFF, 0x00),
            "orange" => Color::rgb(0xFF, 0xA5, 0x00),
            "purple" => Color::rgb(0x80, 0x00, 0x80),
            "pink" => Color::rgb(0xFF, 0xC0, 0xCB),
            "brown" => Color::rgb(0xA5, 0x2A, 0x2A),
            "gray" | "grey" => Color::rgb(0x80, 0x80, 0x80),
            "cyan" => Color::rgb(0x00, 0xFF, 0xFF),
            "magenta" => Color::rgb(0xFF, 0x00, 0xFF),
            "lime" => Color::rgb(0x00, 0xFF, 0x00),
            "navy" => Color::rgb(0x00, 0x00, 0x80),
            "teal" => Color::rgb(0x00, 0x80, 0x80),
            "maroon" => Color::rgb(0x80, 0x00, 0x00),
            "olive" => Color::rgb(0x80, 0x80, 0x00),
            "silver" => Color::rgb(0xC0, 0xC0, 0xC0),
            "gold" => Color::rgb(0xFF, 0xD7, 0x00),
            _ => return None,
        };
        Some(color)
    }

    fn from_hex(digits: &str) -> Option<Self> {
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 | 4 => {
                // Short form: each digit is doubled (#F0A -> #FF00AA).
                let mut chars = digits.chars();
                let mut next = || {
                    chars
                        .next()
                        .and_then(|c| c.to_digit(16))
                        .map(|d| (d * 17) as u8)
                };
                Some(Color::rgb(next()?, next()?, next()?))
            }
            6 | 8 => Some(Color::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        let lower = value.to_ascii_lowercase();

        let parsed = if let Some(hex) = lower.strip_prefix('#') {
            Color::from_hex(hex)
        } else if let Some(hex) = lower.strip_prefix("0x") {
            Color::from_hex(hex)
        } else {
            Color::named(&lower).or_else(|| Color::from_hex(&lower))
        };

        parsed.ok_or_else(|| Error::InvalidColor(value.to_string()))
    }
}

/// A player taking part in the active game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub nickname: String,
    pub color: Color,
}

impl Player {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>, color: Color) -> Self {
        Player {
            id: id.into(),
            nickname: nickname.into(),
            color,
        }
    }
}

/// A game listed in the lobby or joined by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    /// Score needed to win.
    pub goal: i32,
}

impl Game {
    pub fn new(id: impl Into<String>, name: impl Into<String>, goal: i32) -> Self {
        Game {
            id: id.into(),
            name: name.into(),
            goal,
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (goal: {})", self.name, self.goal)
    }
}
