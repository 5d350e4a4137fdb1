//! Error types for name parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name string is empty.
    #[error("name cannot be empty")]
    Empty,

    /// The name exceeds the maximum label length.
    #[error("name is {len} characters long, at most {max} are allowed")]
    TooLong { len: usize, max: usize },

    /// The name contains a character outside `[a-z0-9-]`.
    #[error("invalid character {ch:?} at position {pos}")]
    InvalidChar { ch: char, pos: usize },

    /// The name starts or ends with a `-`.
    #[error("name must start and end with an alphanumeric character")]
    InvalidBoundary,
}
