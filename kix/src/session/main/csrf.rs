use http::{HeaderMap, Method};
use subtle::ConstantTimeEq;

use crate::session::config::{CSRF_TOKEN_HEADER, CSRF_TOKEN_KEY};
use crate::session::errors::CsrfError;
use crate::session::types::Session;
use crate::utils::gen_random_string;

const CSRF_TOKEN_BYTES: usize = 16;

/// Returns a fresh random token without touching any session.
pub fn generate_csrf_token() -> Result<String, CsrfError> {
    Ok(gen_random_string(CSRF_TOKEN_BYTES)?)
}

/// Returns the token stored in the session, or an empty string when none
/// has been issued.
pub fn get_csrf_token(session: &Session) -> &str {
    session.get_first(CSRF_TOKEN_KEY)
}

/// Replaces the stored token with a new one.
pub fn refresh_csrf_token(session: &mut Session) -> Result<(), CsrfError> {
    let token = generate_csrf_token()?;
    session.reset(CSRF_TOKEN_KEY, token);
    Ok(())
}

pub fn get_fresh_csrf_token(session: &mut Session) -> Result<String, CsrfError> {
    refresh_csrf_token(session)?;
    Ok(get_csrf_token(session).to_string())
}

/// Returns the stored token, issuing one first if the session has none.
pub fn get_or_create_csrf_token(session: &mut Session) -> Result<String, CsrfError> {
    if get_csrf_token(session).is_empty() {
        refresh_csrf_token(session)?;
    }
    Ok(get_csrf_token(session).to_string())
}

/// Checks the `X-CSRF-TOKEN` header of a request against the session token.
///
/// Safe methods pass unconditionally. Any other request fails with
/// [`CsrfError::Mismatch`] unless the header is present, non-empty and equal
/// to the stored token.
pub fn verify_csrf_token(
    method: &Method,
    headers: &HeaderMap,
    session: &Session,
) -> Result<(), CsrfError> {
    if method.is_safe() {
        return Ok(());
    }

    let provided = headers
        .get(CSRF_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let expected = get_csrf_token(session);

    if provided.is_empty() || expected.is_empty() {
        tracing::warn!("CSRF token missing for {} request", method);
        return Err(CsrfError::Mismatch);
    }

    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("CSRF token mismatch for {} request", method);
        return Err(CsrfError::Mismatch);
    }

    Ok(())
}
