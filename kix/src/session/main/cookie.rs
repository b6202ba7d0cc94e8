//! Plain cookie session store.
//!
//! The session is written as a base64 encoded query string. The client can
//! read and edit it freely: only use it for data that carries no authority.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use http::HeaderMap;

use crate::session::config::SESSION_COOKIE_NAME;
use crate::session::errors::SessionError;
use crate::session::types::Session;
use crate::utils::{CookieOptions, get_cookie_from_headers, header_set_cookie};

use super::store::SessionStore;

#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    options: CookieOptions,
}

impl Default for CookieSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieSessionStore {
    pub fn new() -> Self {
        Self {
            options: CookieOptions::new(SESSION_COOKIE_NAME.as_str()),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.options.name = name.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.options.secure = secure;
        self
    }

    /// `None` omits the `SameSite` attribute.
    pub fn with_same_site(mut self, same_site: Option<&str>) -> Self {
        self.options.same_site = same_site.map(str::to_string);
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.options.name
    }
}

fn encode_query(session: &Session) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, values) in session.values() {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Parses an `application/x-www-form-urlencoded` session. Unlike
/// `form_urlencoded::parse`, a `%` not followed by two hex digits is an
/// error rather than a literal.
fn decode_query(query: &str) -> Result<Session, SessionError> {
    if let Some(at) = find_bad_escape(query.as_bytes()) {
        return Err(SessionError::Decode(format!(
            "Invalid percent escape at offset {at} in session cookie"
        )));
    }

    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        values
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    Ok(Session::from_values(values))
}

fn find_bad_escape(bytes: &[u8]) -> Option<usize> {
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let valid = b != b'%'
            || matches!(
                bytes.get(i + 1..i + 3),
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            );
        (!valid).then_some(i)
    })
}

impl SessionStore for CookieSessionStore {
    fn read(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let Some(cookie) = get_cookie_from_headers(headers, &self.options.name)? else {
            tracing::debug!("No session cookie, starting an empty session");
            return Ok(Session::new());
        };

        let data = STANDARD
            .decode(cookie)
            .map_err(|e| SessionError::Decode(format!("Invalid base64 session cookie: {e}")))?;

        let query = String::from_utf8(data)
            .map_err(|e| SessionError::Decode(format!("Invalid session cookie encoding: {e}")))?;

        decode_query(&query)
    }

    fn write(&self, _headers: &HeaderMap, session: &Session) -> Result<HeaderMap, SessionError> {
        let encoded = STANDARD.encode(encode_query(session));

        let mut headers = HeaderMap::new();
        header_set_cookie(&mut headers, &self.options, &encoded, self.options.max_age)?;
        Ok(headers)
    }

    fn erase(&self, _headers: &HeaderMap) -> Result<HeaderMap, SessionError> {
        let mut headers = HeaderMap::new();
        header_set_cookie(&mut headers, &self.options, "", Some(-1))?;
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::{COOKIE, SET_COOKIE};
    use proptest::prelude::*;

    /// Turns the `Set-Cookie` headers of a write into the `Cookie` header of
    /// the next request.
    fn replay(store: &CookieSessionStore, set_cookie: &HeaderMap) -> HeaderMap {
        let raw = set_cookie.get(SET_COOKIE).unwrap().to_str().unwrap();
        let pair = raw.split(';').next().unwrap();
        assert!(pair.starts_with(&format!("{}=", store.cookie_name())));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[test]
    fn test_read_without_cookie_returns_empty_session() {
        let store = CookieSessionStore::new().with_cookie_name("session");
        let session = store.read(&HeaderMap::new()).unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let store = CookieSessionStore::new().with_cookie_name("session");
        let mut session = Session::new();
        session.add("flash", "saved");
        session.add("flash", "a & b = c");
        session.reset("lang", "fr");

        let set_cookie = store.write(&HeaderMap::new(), &session).unwrap();
        let read_back = store.read(&replay(&store, &set_cookie)).unwrap();

        assert_eq!(read_back, session);
    }

    #[test]
    fn test_write_sets_http_only_secure_root_cookie() {
        let store = CookieSessionStore::new().with_cookie_name("session");
        let headers = store.write(&HeaderMap::new(), &Session::new()).unwrap();
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();

        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn test_read_rejects_invalid_base64() {
        let store = CookieSessionStore::new().with_cookie_name("session");
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=%%%not-base64"));

        let result = store.read(&headers);
        assert!(matches!(result, Err(SessionError::Decode(_))));
    }

    #[test]
    fn test_read_rejects_non_utf8_payload() {
        let store = CookieSessionStore::new().with_cookie_name("session");
        let value = STANDARD.encode([0xff, 0xfe, 0xfd]);
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("session={value}")).unwrap(),
        );

        let result = store.read(&headers);
        assert!(matches!(result, Err(SessionError::Decode(_))));
    }

    #[test]
    fn test_read_rejects_malformed_percent_escapes() {
        let store = CookieSessionStore::new().with_cookie_name("session");

        for payload in ["user=%zz&role=admin", "role=admin%", "user=%4", "%g1=x"] {
            let value = STANDARD.encode(payload);
            let mut headers = HeaderMap::new();
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&format!("session={value}")).unwrap(),
            );

            let result = store.read(&headers);
            assert!(
                matches!(result, Err(SessionError::Decode(_))),
                "{payload} was accepted"
            );
        }
    }

    #[test]
    fn test_decode_query_accepts_valid_escapes() {
        let session = decode_query("a=%41%2b&b=x+y&c=100%25").unwrap();
        assert_eq!(session.get_first("a"), "A+");
        assert_eq!(session.get_first("b"), "x y");
        assert_eq!(session.get_first("c"), "100%");
    }

    #[test]
    fn test_erase_expires_cookie() {
        let store = CookieSessionStore::new().with_cookie_name("session");
        let headers = store.erase(&HeaderMap::new()).unwrap();
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();

        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=-1"));
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            entries in proptest::collection::btree_map(
                "[a-z-]{1,8}",
                proptest::collection::vec("[ -~]{0,12}", 1..4),
                0..5,
            )
        ) {
            let store = CookieSessionStore::new().with_cookie_name("session");
            let mut session = Session::new();
            for (key, values) in &entries {
                session.set(key.clone(), values.clone());
            }

            let set_cookie = store.write(&HeaderMap::new(), &session).unwrap();
            let read_back = store.read(&replay(&store, &set_cookie)).unwrap();
            prop_assert_eq!(read_back, session);
        }
    }
}
