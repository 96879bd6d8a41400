//! Error types for the eoscodec encode/decode pipeline.

use thiserror::Error;

/// Errors that can occur while encoding or decoding names, primitives,
/// records, action envelopes and table rows.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid character {ch:?} at position {position} in name")]
    InvalidCharacter { ch: char, position: usize },

    #[error("Name is {len} characters long, at most 13 are allowed")]
    NameTooLong { len: usize },

    #[error("Invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("Buffer too short: needed {needed} bytes, {remaining} remaining")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("Malformed varint")]
    MalformedVarint,

    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Size mismatch on '{field}': declared {declared}, actual {actual}")]
    SizeMismatch {
        field: String,
        declared: u64,
        actual: u64,
    },

    #[error("Unknown field kind: {kind}")]
    UnknownFieldKind { kind: String },

    #[error("Invalid record descriptor '{record}': {reason}")]
    InvalidDescriptor { record: String, reason: String },

    #[error("Type mismatch on '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    #[error("Value {value} of '{field}' does not fit in {kind}")]
    ValueOutOfRange {
        field: String,
        kind: String,
        value: String,
    },

    #[error("{count} trailing bytes after the last field")]
    TrailingBytes { count: usize },

    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("No payload type registered for {contract}::{action}")]
    UnresolvedPayloadType { contract: String, action: String },

    #[error("Payload field '{key}' collides with an envelope key")]
    InterchangeConflict { key: String },

    #[error("Invalid interchange value: {reason}")]
    InvalidInterchange { reason: String },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from ABI-definition registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Contract '{contract}' already registered")]
    AlreadyExists { contract: String },

    #[error("Parse error in ABI definition: {0}")]
    ParseError(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
