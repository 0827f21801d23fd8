//! Error types shared by every buildscope crate.
//!
//! `DecodeError` is fatal to a single decode call. `Error` covers the engine
//! as a whole; fetch and insufficient-data variants are per item and are
//! usually collected rather than propagated.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { offset: usize, needed: usize, remaining: usize },

    #[error("varint at offset {offset} exceeds 64 bits")]
    VarintOverflow { offset: usize },

    #[error("invalid UTF-8 in string field at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("unsupported wire type {wire_type} at offset {offset}")]
    UnsupportedWireType { wire_type: u8, offset: usize },

    #[error("invalid field tag {tag} at offset {offset}")]
    InvalidTag { tag: u64, offset: usize },

    #[error("required field '{0}' missing")]
    MissingField(&'static str),

    #[error("message of {len} bytes exceeds limit of {max} bytes")]
    MessageTooLarge { len: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Dictionary missing: {0}")]
    DictionaryMissing(String),

    #[error("Fetch failed for '{item}': {message}")]
    Fetch { item: String, message: String },

    #[error("Insufficient data for {0}")]
    InsufficientData(String),

    #[error("Stale generation: planned {planned}, current {current}")]
    StaleGeneration { planned: u64, current: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
