use std::time::Duration;

use crate::oauth2::config::OAUTH2_HTTP_TIMEOUT;
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::{OAuth2Config, OAuth2Token};

/// HTTP client for the token endpoint.
///
/// No retries: a transport failure surfaces immediately. Dropping the
/// returned future cancels the request.
fn get_client() -> Result<reqwest::Client, OAuth2Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(*OAUTH2_HTTP_TIMEOUT))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| OAuth2Error::ExchangeFailure(format!("Failed to build HTTP client: {e}")))
}

/// Exchanges an authorization `code` for a token at the provider's token
/// endpoint.
pub async fn exchange_code_for_token(
    config: &OAuth2Config,
    code: &str,
    code_verifier: Option<&str>,
) -> Result<OAuth2Token, OAuth2Error> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", config.redirect_url.as_str()),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ];
    if let Some(verifier) = code_verifier {
        form.push(("code_verifier", verifier));
    }

    let response = get_client()?
        .post(config.token_url.as_str())
        .header(http::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| OAuth2Error::ExchangeFailure(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Token endpoint answered {}", status);
        return Err(OAuth2Error::ExchangeFailure(format!(
            "Token endpoint returned {status}"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| OAuth2Error::ExchangeFailure(e.to_string()))?;

    serde_json::from_str(&body)
        .map_err(|e| OAuth2Error::ExchangeFailure(format!("Invalid token response: {e}")))
}
