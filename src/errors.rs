/*!
 * Error types for the subdb client.
 *
 * This module contains the error taxonomy for the client, using the
 * thiserror crate for ergonomic error definitions. Validation errors are
 * raised before any request leaves the client; transport errors describe
 * a request that never produced a response.
 */

use thiserror::Error;

/// Errors that can occur inside a transport while executing a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Error when making the request fails
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The request could not be turned into an HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be read
    #[error("Failed to read response body: {0}")]
    BodyError(String),
}

/// Main error type returned by the client and the fingerprint generator
#[derive(Error, Debug)]
pub enum SubDbError {
    /// The hash argument was empty or whitespace
    #[error("You must search using a valid hash")]
    InvalidHash,

    /// The language list argument was empty or whitespace
    #[error("At least one language must be provided")]
    InvalidLanguages,

    /// A byte source was missing or empty
    #[error("Source must exist and not be empty: {argument}")]
    EmptySource {
        /// Name of the offending argument
        argument: &'static str,
    },

    /// A byte source is shorter than the sampled region
    #[error("File size must be at least {required} bytes, got {length}")]
    SourceTooShort {
        /// Actual length of the source
        length: u64,
        /// Minimum length required for fingerprinting
        required: u64,
    },

    /// The source does not support random access
    #[error("Source must be seekable: {0}")]
    UnseekableSource(#[source] std::io::Error),

    /// The source cannot be read
    #[error("Source must be readable: {0}")]
    UnreadableSource(#[source] std::io::Error),

    /// The server answered with a body this client cannot interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubDbError {
    /// Whether this error was raised by argument validation, before any I/O
    /// beyond inspecting the source
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidHash
                | Self::InvalidLanguages
                | Self::EmptySource { .. }
                | Self::SourceTooShort { .. }
                | Self::UnseekableSource(_)
                | Self::UnreadableSource(_)
        )
    }
}

impl From<anyhow::Error> for SubDbError {
    fn from(error: anyhow::Error) -> Self {
        Self::InvalidConfig(error.to_string())
    }
}
