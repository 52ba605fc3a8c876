//! # Validation Errors
//!
//! Raised by the validated constructors in this crate. Each variant names
//! the offending input so callers can report it without re-parsing.

use thiserror::Error;

/// A value failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier was empty or whitespace-only.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Which identifier kind was rejected.
        kind: &'static str,
    },

    /// The public signal vector had the wrong arity.
    #[error("expected {expected} public signals, got {actual}")]
    SignalCount {
        /// Required number of signals.
        expected: usize,
        /// Number supplied.
        actual: usize,
    },

    /// A public signal was not a non-empty string of ASCII digits.
    #[error("public signal {position} is not a decimal string: {value:?}")]
    NonDecimalSignal {
        /// Zero-based position in the signal vector.
        position: usize,
        /// The rejected value.
        value: String,
    },

    /// A voting mode name was not recognised.
    #[error("unknown voting mode {0:?}; expected \"plaintext\" or \"anonymous\"")]
    UnknownMode(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}
