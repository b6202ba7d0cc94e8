use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// The cookie could not be decoded at the transport level
    /// (base64, framing, character set).
    #[error("Decode error: {0}")]
    Decode(String),

    /// The cookie decoded but failed authentication: bad MAC, stale
    /// timestamp or failed decryption.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl SessionError {
    /// True for failures caused by a tampered, expired or foreign cookie.
    pub fn is_authentication(&self) -> bool {
        matches!(self, SessionError::Authentication(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsrfError {
    /// The request token is missing, empty or differs from the session token.
    #[error("CSRF token mismatch")]
    Mismatch,

    #[error("Failed to generate CSRF token: {0}")]
    Generation(String),
}

impl From<UtilError> for CsrfError {
    fn from(err: UtilError) -> Self {
        CsrfError::Generation(err.to_string())
    }
}
