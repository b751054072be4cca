//! Error types for the dosewise workspace.
//!
//! The decision engine itself is total: scoring, titration, and
//! de-escalation never fail. Errors only arise at the edges, when a
//! formulary document is loaded or a raw patient file is parsed.

use thiserror::Error;

/// The unified error type for dosewise.
#[derive(Debug, Error)]
pub enum DosewiseError {
    /// The formulary document could not be read or deserialized.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The formulary parsed, but a value is out of its permitted range.
    #[error("invalid configuration for '{drug}': {reason}")]
    ConfigValidation { drug: String, reason: String },

    /// A raw patient document could not be turned into a profile.
    #[error("profile error: {reason}")]
    ProfileError { reason: String },
}

/// Convenience alias used throughout the dosewise crates.
pub type DosewiseResult<T> = Result<T, DosewiseError>;
