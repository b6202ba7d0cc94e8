use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("No active key in key set")]
    ActiveKeyMissing,

    #[error("Token header has no kid")]
    KidMissing,

    #[error("Unknown kid: {0}")]
    KidUnknown(String),

    #[error("Failed to parse claims: {0}")]
    ClaimsParse(String),

    #[error("Invalid token: {0}")]
    Invalid(InvalidTokenReason),

    #[error("Failed to sign token: {0}")]
    SignFailure(String),

    #[error("Failed to generate key: {0}")]
    KeyGeneration(String),
}

/// Why a structurally sound token was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTokenReason {
    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("token issued in the future")]
    IssuedInFuture,

    #[error("signature mismatch")]
    Signature,

    #[error("algorithm not allowed")]
    Algorithm,

    #[error("missing required claim {0}")]
    MissingClaim(String),

    #[error("malformed claim {0}")]
    MalformedClaim(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Invalid(InvalidTokenReason::Expired),
            ErrorKind::ImmatureSignature => JwtError::Invalid(InvalidTokenReason::NotYetValid),
            ErrorKind::InvalidSignature => JwtError::Invalid(InvalidTokenReason::Signature),
            ErrorKind::InvalidAlgorithm => JwtError::Invalid(InvalidTokenReason::Algorithm),
            ErrorKind::MissingRequiredClaim(claim) => {
                JwtError::Invalid(InvalidTokenReason::MissingClaim(claim.clone()))
            }
            _ => JwtError::ClaimsParse(err.to_string()),
        }
    }
}

impl JwtError {
    /// True when the token was rejected because of its time claims.
    pub fn is_expired(&self) -> bool {
        matches!(self, JwtError::Invalid(InvalidTokenReason::Expired))
    }
}
