//! Client-side error taxonomy
//!
//! Mirrors the server's logical errors plus the transport failures the
//! terminal has to surface. Every error is recoverable: the form keeps
//! its context and the user retries.

use thiserror::Error;

/// Errors surfaced by the count terminal client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Submit attempted with no barcode, SKU, or selected variant
    #[error("no barcode, SKU, or selected variant to submit")]
    MissingIdentifier,

    /// The server found no catalog entry for the identifier
    #[error("variant not found")]
    VariantNotFound,

    /// Mutating call against a finalized session
    #[error("invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other structured server error
    #[error("server error {status}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Connectivity or server failure; caller must re-fetch the session
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
