//! Error types for the AIngle defeasible reasoning engine.

use thiserror::Error;

/// A specialized `Result` type for defeasible engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while building programs and answering queries.
///
/// Absence of a proof is never an error: search and comparison operations
/// report it as an empty result or a negative answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The program text could not be parsed.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The strict part of a program derives a literal and its complement.
    #[error("Contradictory strict knowledge: both {literal} and {complement} are strictly derivable")]
    ContradictoryProgram { literal: String, complement: String },

    /// A ground literal was required but the given one contains variables.
    #[error("Literal is not ground: {0}")]
    NonGroundLiteral(String),

    /// Grounding produced more rule instances than the configured limit.
    #[error("Grounding limit exceeded: more than {limit} ground rules")]
    GroundingLimitExceeded { limit: usize },

    /// An error occurred during data serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
