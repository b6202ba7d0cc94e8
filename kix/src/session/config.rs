use std::sync::LazyLock;

/// Name of the session cookie.
/// Default: "session"
pub static SESSION_COOKIE_NAME: LazyLock<String> =
    LazyLock::new(|| parse_cookie_name(std::env::var("SESSION_COOKIE_NAME").ok().as_deref()));

const DEFAULT_SESSION_COOKIE_NAME: &str = "session";

fn parse_cookie_name(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SESSION_COOKIE_NAME)
        .to_string()
}

/// Lifetime in seconds of a signed session cookie. It is written as the
/// cookie `Max-Age` and bounds the age of the signed timestamp on read.
/// Default: 30 days
pub static SESSION_COOKIE_MAX_AGE: LazyLock<i64> = LazyLock::new(|| {
    parse_max_age(std::env::var("SESSION_COOKIE_MAX_AGE").ok().as_deref())
});

const DEFAULT_SESSION_COOKIE_MAX_AGE: i64 = 86400 * 30;

fn parse_max_age(value: Option<&str>) -> i64 {
    value
        .and_then(|s| s.parse().ok())
        .filter(|max_age: &i64| *max_age > 0)
        .unwrap_or(DEFAULT_SESSION_COOKIE_MAX_AGE)
}

/// Session key holding the anti-forgery token checked against `X-CSRF-TOKEN`.
pub const CSRF_TOKEN_KEY: &str = "csrf-token";

/// Request header carrying the anti-forgery token.
pub const CSRF_TOKEN_HEADER: &str = "X-CSRF-TOKEN";
