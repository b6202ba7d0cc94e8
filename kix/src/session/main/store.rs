use http::HeaderMap;

use crate::session::errors::SessionError;
use crate::session::types::Session;

/// Pluggable persistence of a [`Session`] into and out of HTTP headers.
///
/// `read` takes the request headers; `write` and `erase` return the
/// `Set-Cookie` headers to attach to the response.
pub trait SessionStore: Send + Sync {
    /// Reads the session from the request. A missing cookie yields an empty
    /// session, never an error.
    fn read(&self, headers: &HeaderMap) -> Result<Session, SessionError>;

    fn write(&self, headers: &HeaderMap, session: &Session) -> Result<HeaderMap, SessionError>;

    /// Expires the session cookie on the client.
    fn erase(&self, headers: &HeaderMap) -> Result<HeaderMap, SessionError>;
}
