use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OAuth2Error {
    /// The strategy or the authorization redirect could not be prepared.
    #[error("Failed to initiate OAuth2 flow: {0}")]
    InitiateFailure(String),

    /// The token endpoint could not be reached or refused the code.
    #[error("Failed to exchange authorization code: {0}")]
    ExchangeFailure(String),

    /// The callback `state` differs from the one issued at login, or no
    /// login was started in this session.
    #[error("OAuth2 state mismatch")]
    CsrfMismatch,

    #[error("Failed to authenticate OAuth2 token: {0}")]
    AuthenticateFailure(String),
}
