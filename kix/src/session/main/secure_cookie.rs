//! Signed (and optionally encrypted) cookie session store.
//!
//! The sealed value is `<issued at>.<base64url JSON session>`, signed or
//! encrypted by the first [`SessionKey`].

use chrono::Utc;
use http::HeaderMap;

use crate::session::config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME};
use crate::session::errors::SessionError;
use crate::session::types::Session;
use crate::utils::{
    CookieOptions, base64url_decode, base64url_encode, get_cookie_from_headers, header_set_cookie,
};

use super::key::SessionKey;
use super::store::SessionStore;

const SEPARATOR: char = '.';

/// Stores the session in a cookie the client can neither read (with
/// private keys) nor modify.
///
/// Keys are tried in order on read, so prepending a new key rotates the
/// signing key while cookies sealed with older keys stay valid.
#[derive(Debug, Clone)]
pub struct SecureCookieSessionStore {
    keys: Vec<SessionKey>,
    max_age: i64,
    options: CookieOptions,
}

impl SecureCookieSessionStore {
    pub fn new(keys: Vec<SessionKey>) -> Result<Self, SessionError> {
        if keys.is_empty() {
            return Err(SessionError::InvalidKey(
                "At least one session key is required".to_string(),
            ));
        }

        let max_age = *SESSION_COOKIE_MAX_AGE;
        let mut options = CookieOptions::new(SESSION_COOKIE_NAME.as_str());
        options.max_age = Some(max_age);

        Ok(Self {
            keys,
            max_age,
            options,
        })
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.options.name = name.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.options.secure = secure;
        self
    }

    pub fn with_same_site(mut self, same_site: Option<&str>) -> Self {
        self.options.same_site = same_site.map(str::to_string);
        self
    }

    /// Sets both the cookie `Max-Age` and the oldest issue time accepted on
    /// read.
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.options.max_age = Some(max_age);
        self.max_age = max_age;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.options.name
    }

    fn seal(&self, payload: &[u8], issued_at: i64) -> Result<String, SessionError> {
        let signing_key = self
            .keys
            .first()
            .ok_or_else(|| SessionError::InvalidKey("No signing key".to_string()))?;
        let value = format!("{issued_at}{SEPARATOR}{}", base64url_encode(payload));
        signing_key.seal(&self.options.name, value)
    }

    fn open(&self, cookie: &str) -> Result<Vec<u8>, SessionError> {
        if cookie.is_empty() || !cookie.bytes().all(is_sealed_value_byte) {
            return Err(SessionError::Decode(
                "Malformed secure cookie value".to_string(),
            ));
        }

        let opened = self
            .keys
            .iter()
            .find_map(|key| key.open(&self.options.name, cookie))
            .ok_or_else(|| {
                SessionError::Authentication("Cookie signature mismatch".to_string())
            })?;

        let (issued_at, value) = opened
            .split_once(SEPARATOR)
            .ok_or_else(|| SessionError::Decode("Missing cookie timestamp".to_string()))?;
        let issued_at: i64 = issued_at
            .parse()
            .map_err(|_| SessionError::Decode("Malformed cookie timestamp".to_string()))?;

        let now = Utc::now().timestamp();
        if issued_at > now {
            return Err(SessionError::Authentication(
                "Cookie timestamp is in the future".to_string(),
            ));
        }
        if issued_at < now.saturating_sub(self.max_age) {
            return Err(SessionError::Authentication("Cookie expired".to_string()));
        }

        base64url_decode(value)
            .map_err(|_| SessionError::Decode("Malformed cookie payload".to_string()))
    }
}

/// Characters the jars and the base64 encodings can produce.
fn is_sealed_value_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_' | b'.')
}

impl SessionStore for SecureCookieSessionStore {
    fn read(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let Some(cookie) = get_cookie_from_headers(headers, &self.options.name)? else {
            tracing::debug!("No session cookie, starting an empty session");
            return Ok(Session::new());
        };

        let payload = self.open(cookie).map_err(|e| {
            tracing::warn!("Rejected session cookie: {}", e);
            e
        })?;

        serde_json::from_slice(&payload)
            .map_err(|e| SessionError::Decode(format!("Invalid session payload: {e}")))
    }

    /// Writes every non-empty key of `session`. The cookie replaces the
    /// previous one entirely, so deleted keys do not come back.
    fn write(&self, _headers: &HeaderMap, session: &Session) -> Result<HeaderMap, SessionError> {
        let retained = Session::from_values(
            session
                .values()
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(key, values)| (key.clone(), values.clone()))
                .collect(),
        );

        let payload = serde_json::to_vec(&retained)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        let value = self.seal(&payload, Utc::now().timestamp())?;

        let mut headers = HeaderMap::new();
        header_set_cookie(&mut headers, &self.options, &value, self.options.max_age)?;
        Ok(headers)
    }

    fn erase(&self, _headers: &HeaderMap) -> Result<HeaderMap, SessionError> {
        let mut headers = HeaderMap::new();
        header_set_cookie(&mut headers, &self.options, "", Some(-1))?;
        Ok(headers)
    }
}
