use std::sync::Arc;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, Method, StatusCode, Uri, request::Parts};
use thiserror::Error;

use kix::{CsrfError, OAuth2Error, SessionError};

/// Failures surfaced by the middlewares and handlers of this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing identity context")]
    IdentityMissing,

    #[error("missing session context")]
    SessionMissing,

    #[error("failed to read session: {0}")]
    SessionRead(#[source] SessionError),

    #[error("failed to write session: {0}")]
    SessionWrite(#[source] SessionError),

    #[error("failed to erase session: {0}")]
    SessionErase(#[source] SessionError),

    #[error(transparent)]
    Csrf(#[from] CsrfError),

    #[error("failed to identify: {0}")]
    IdentifyFailure(String),

    #[error("already authenticated")]
    AlreadyAuthenticated,

    #[error(transparent)]
    OAuth2(#[from] OAuth2Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::IdentityMissing => StatusCode::UNAUTHORIZED,
            Error::SessionRead(_) => StatusCode::BAD_REQUEST,
            Error::Csrf(CsrfError::Mismatch) => StatusCode::FORBIDDEN,
            Error::AlreadyAuthenticated => StatusCode::FORBIDDEN,
            Error::OAuth2(OAuth2Error::CsrfMismatch) => StatusCode::FORBIDDEN,
            Error::OAuth2(OAuth2Error::ExchangeFailure(_)) => StatusCode::BAD_GATEWAY,
            Error::OAuth2(OAuth2Error::AuthenticateFailure(_)) => StatusCode::UNAUTHORIZED,
            Error::SessionMissing
            | Error::SessionWrite(_)
            | Error::SessionErase(_)
            | Error::Csrf(CsrfError::Generation(_))
            | Error::IdentifyFailure(_)
            | Error::OAuth2(OAuth2Error::InitiateFailure(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// The parts of a request an error handler may look at. The body has
/// already been handed to (or consumed by) the inner service.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestHead {
    pub fn from_request(req: &Request) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
        }
    }
}

impl From<&Parts> for RequestHead {
    fn from(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }
}

/// Application hook turning an [`Error`] into the response sent to the client.
pub type HandleError = Arc<dyn Fn(&RequestHead, Error) -> Response + Send + Sync>;

/// Logs the error and answers with its status code and message.
pub fn default_error_handler() -> HandleError {
    Arc::new(|head: &RequestHead, err: Error| {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!("{} {}: {}", head.method, head.uri.path(), err);
        } else {
            tracing::warn!("{} {}: {}", head.method, head.uri.path(), err);
        }
        err.into_response()
    })
}
