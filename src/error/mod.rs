//! Error handling for the chain engine.
//!
//! Validation failures are deliberately *not* represented here: the chain
//! validator reports them through [`crate::core::ValidationError`], which is
//! returned as a value and never propagated as a failure of the engine
//! itself.

use std::fmt;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Error types for codec, crypto, storage, and mining operations.
#[derive(Debug, Clone)]
pub enum ChainError {
    /// A decoder ran out of buffer before the declared length.
    Truncated,
    /// A decoder read an unexpected framing value.
    Invalid(String),
    /// Cryptographic operation errors (key parsing, signing, entropy).
    Crypto(String),
    /// File I/O errors.
    Io(String),
    /// Block log store errors (open, write, durability barrier).
    Store(String),
    /// The miner observed its cancel flag before finding a nonce.
    Cancelled,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Truncated => write!(f, "deserialize: truncated buffer"),
            ChainError::Invalid(msg) => write!(f, "deserialize: {msg}"),
            ChainError::Crypto(msg) => write!(f, "cryptographic error: {msg}"),
            ChainError::Io(msg) => write!(f, "I/O error: {msg}"),
            ChainError::Store(msg) => write!(f, "block store error: {msg}"),
            ChainError::Cancelled => write!(f, "mining cancelled"),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}
