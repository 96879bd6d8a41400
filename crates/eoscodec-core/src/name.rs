//! Dense 64-bit account and action names.
//!
//! A name is at most 13 characters over the alphabet `.12345abcdefghijklmnopqrstuvwxyz`.
//! The first 12 characters take 5 bits each, starting from the most significant
//! bit; the 13th character takes the lowest 4 bits. `.` maps to 0, so trailing
//! dots are indistinguishable from a shorter name: `"tbcox2."` and `"tbcox2"`
//! encode to the same value.

use crate::error::CodecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Alphabet in code order. Index = 5-bit symbol value.
const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters a name can carry.
pub const MAX_NAME_LEN: usize = 13;

fn char_to_symbol(ch: u8) -> Option<u64> {
    match ch {
        b'a'..=b'z' => Some(u64::from(ch - b'a') + 6),
        b'1'..=b'5' => Some(u64::from(ch - b'1') + 1),
        b'.' => Some(0),
        _ => None,
    }
}

/// Encode a name string into its 64-bit representation.
///
/// The empty string encodes to `0`.
pub fn string_to_name(s: &str) -> Result<u64, CodecError> {
    let len = s.chars().count();
    if len > MAX_NAME_LEN {
        return Err(CodecError::NameTooLong { len });
    }

    let mut value: u64 = 0;
    for (i, ch) in s.chars().enumerate() {
        let symbol = u8::try_from(ch)
            .ok()
            .and_then(char_to_symbol)
            .ok_or(CodecError::InvalidCharacter { ch, position: i })?;

        if i < 12 {
            value |= symbol << (64 - 5 * (i + 1));
        } else {
            // 13th character only has 4 bits: '.', '1'-'5', 'a'-'j'
            if symbol > 0x0f {
                return Err(CodecError::InvalidCharacter { ch, position: i });
            }
            value |= symbol;
        }
    }
    Ok(value)
}

/// Decode a 64-bit name into text, trimming trailing `.` filler.
///
/// Every `u64` decodes; embedded dots are preserved.
pub fn name_to_string(value: u64) -> String {
    let mut out = [b'.'; MAX_NAME_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        let symbol = if i < 12 {
            (value >> (64 - 5 * (i + 1))) & 0x1f
        } else {
            value & 0x0f
        };
        *slot = CHARMAP[symbol as usize];
    }

    let end = out.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
    // CHARMAP is pure ASCII
    out[..end].iter().map(|&c| c as char).collect()
}

/// A name in its canonical 64-bit form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u64);

/// Account names share the name encoding; the alias documents intent.
pub type AccountName = Name;

/// Action names share the name encoding; the alias documents intent.
pub type ActionName = Name;

impl Name {
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Parse and encode a name string.
    pub fn new(s: &str) -> Result<Self, CodecError> {
        string_to_name(s).map(Self)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Wire representation: 8 bytes, little-endian.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(bytes))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Name {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Name> for u64 {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl FromStr for Name {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Name {
    type Error = CodecError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&name_to_string(self.0))
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&name_to_string(self.0))
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::new(&s).map_err(serde::de::Error::custom)
    }
}
