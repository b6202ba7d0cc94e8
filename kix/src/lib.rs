//! kix - session state and authentication primitives for HTTP services
//!
//! This crate is framework-agnostic: it works on `http` request and response
//! headers. It provides cookie-backed sessions (plain and signed/encrypted),
//! CSRF tokens, HS256 JWTs with key rotation and the protocol pieces of an
//! OAuth2 authorization-code flow. See `kix-axum` for the axum integration.

mod jwt;
mod oauth2;
mod session;
mod utils;

pub use jwt::{
    Claims, InvalidTokenReason, Jwk, Jwks, JwtError, KeySetCache, generate_jwt, parse_jwt,
};

pub use oauth2::{
    AuthResponse, OAUTH2_PKCE_VERIFIER_KEY, OAUTH2_STATE_KEY, OAuth2Config, OAuth2Error,
    OAuth2Token, consume_auth_state, exchange_code_for_token, prepare_oauth2_auth_request,
};

pub use session::{
    CSRF_TOKEN_HEADER, CSRF_TOKEN_KEY, CookieSessionStore, CsrfError, SESSION_COOKIE_MAX_AGE,
    SESSION_COOKIE_NAME, SecureCookieSessionStore, Session, SessionError, SessionKey,
    SessionStore, generate_csrf_token, get_csrf_token, get_fresh_csrf_token,
    get_or_create_csrf_token, refresh_csrf_token, verify_csrf_token,
};

pub use utils::{CookieOptions, UtilError, gen_random_string};
