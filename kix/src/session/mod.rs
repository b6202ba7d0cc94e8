mod config;
mod errors;
mod main;
mod types;

pub use config::{CSRF_TOKEN_HEADER, CSRF_TOKEN_KEY, SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME};
pub use errors::{CsrfError, SessionError};
pub use main::{
    CookieSessionStore, SecureCookieSessionStore, SessionKey, SessionStore, generate_csrf_token,
    get_csrf_token, get_fresh_csrf_token, get_or_create_csrf_token, refresh_csrf_token,
    verify_csrf_token,
};
pub use types::Session;
