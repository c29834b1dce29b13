//! Error types for beanbills-parser

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The first line is not a transaction header
    #[error("no matches")]
    NoMatches,

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Invalid amount: {value}")]
    InvalidAmount { value: String },
}
