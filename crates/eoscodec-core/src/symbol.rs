//! Token symbols: a precision byte followed by up to 7 uppercase letters,
//! packed little-endian into a `u64`.
//!
//! `4,CUR` is stored as `0x0000_0000_5255_4304`, i.e. the wire bytes
//! `04 43 55 52 00 00 00 00`.

use crate::error::CodecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MAX_SYMBOL_CODE_LEN: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Symbol(u64);

impl Symbol {
    /// Build a symbol from a precision and a code such as `"EOS"`.
    pub fn new(precision: u8, code: &str) -> Result<Self, CodecError> {
        let invalid = |reason: &str| CodecError::InvalidSymbol {
            symbol: format!("{precision},{code}"),
            reason: reason.to_string(),
        };
        if code.is_empty() || code.len() > MAX_SYMBOL_CODE_LEN {
            return Err(invalid("code must be 1 to 7 characters"));
        }
        let mut value = u64::from(precision);
        for (i, b) in code.bytes().enumerate() {
            if !b.is_ascii_uppercase() {
                return Err(invalid("code must be uppercase A-Z"));
            }
            value |= u64::from(b) << (8 * (i + 1));
        }
        Ok(Self(value))
    }

    /// Wrap a raw value without checking it. Prefer [`Symbol::try_from_u64`]
    /// for values read off the wire.
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Wrap a raw value, requiring 1 to 7 uppercase letters followed only by
    /// zero bytes so that the text form parses back to the same value. Zero,
    /// the default symbol written for missing fields, is also accepted.
    pub fn try_from_u64(value: u64) -> Result<Self, CodecError> {
        if value == 0 {
            return Ok(Self::default());
        }
        let code = &value.to_le_bytes()[1..];
        let len = code.iter().take_while(|b| b.is_ascii_uppercase()).count();
        if len == 0 || code[len..].iter().any(|&b| b != 0) {
            return Err(CodecError::InvalidSymbol {
                symbol: format!("0x{value:016x}"),
                reason: "code must be 1 to 7 uppercase letters padded with zeros".into(),
            });
        }
        Ok(Self(value))
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// The letter code; stops at the first zero byte. Lossless only for
    /// symbols built by `new`, `try_from_u64` or parsing.
    pub fn code(self) -> String {
        self.0.to_le_bytes()[1..]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl FromStr for Symbol {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s.split_once(',').ok_or_else(|| CodecError::InvalidSymbol {
            symbol: s.to_string(),
            reason: "expected '<precision>,<CODE>'".into(),
        })?;
        if precision.trim() == "0" && code.trim().is_empty() {
            return Ok(Self::default());
        }
        let precision: u8 = precision.trim().parse().map_err(|_| CodecError::InvalidSymbol {
            symbol: s.to_string(),
            reason: "precision must be 0-255".into(),
        })?;
        Self::new(precision, code.trim())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
