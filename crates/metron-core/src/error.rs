//! Error types for metron-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in metron-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Text that is not one of the six expression symbols
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Two tokens in one formula claimed the same position
    #[error("Duplicate token position: {0}")]
    DuplicatePosition(u32),

    /// Formula name was empty or whitespace
    #[error("Formula name must not be empty")]
    EmptyName,
}
