//! Error types for the medledger_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for record store operations
///
/// The `Display` output is the message handed back to the invoking caller,
/// so variants carry their full text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong number or shape of positional arguments
    #[error("{0}")]
    InvalidArguments(String),

    /// Stored record could not be decoded
    #[error("Failed to decode record at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Record could not be serialized for writing
    #[error("Error creating {what} record: {source}")]
    Encoding {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Point read of a key with no stored value
    #[error("{{\"Error\":\"Failed to get state for {0}\"}}")]
    NotFound(String),

    /// Underlying ledger get/put/scan failure
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Dispatch of an operation name that is not registered
    #[error("Received unknown invoke function name - '{0}'")]
    UnknownFunction(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
