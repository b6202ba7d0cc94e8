use std::sync::LazyLock;

/// Session key holding the `state` value issued by the login redirect.
pub const OAUTH2_STATE_KEY: &str = "oauth-csrf-token";

/// Session key holding the PKCE code verifier between login and callback.
pub const OAUTH2_PKCE_VERIFIER_KEY: &str = "oauth-pkce-verifier";

/// Timeout in seconds for requests to the provider's token endpoint.
/// Default: 30 seconds
pub(crate) static OAUTH2_HTTP_TIMEOUT: LazyLock<u64> = LazyLock::new(|| {
    std::env::var("OAUTH2_HTTP_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|secs: &u64| *secs > 0)
        .unwrap_or(30)
});
