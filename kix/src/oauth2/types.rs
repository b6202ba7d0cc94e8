use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static description of one OAuth2 provider registration.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub use_pkce: bool,
    /// Extra query parameters appended to the authorization URL
    /// (e.g. `access_type=offline`, `prompt=consent`).
    pub extra_params: Vec<(String, String)>,
}

impl OAuth2Config {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            redirect_url: redirect_url.into(),
            scopes: Vec::new(),
            use_pkce: false,
            extra_params: Vec::new(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pkce(mut self, use_pkce: bool) -> Self {
        self.use_pkce = use_pkce;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }
}

/// Token endpoint response. Provider-specific fields (such as `id_token`
/// for OpenID Connect) that are not modelled land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Parameters the provider sends back to the redirect URL. On a denied or
/// failed authorization, `error` is set and `code` is empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A minimal token response only needs `access_token`.
    #[test]
    fn test_token_deserialization_minimal() {
        let token: OAuth2Token =
            serde_json::from_value(json!({ "access_token": "at-123" })).unwrap();
        assert_eq!(token.access_token, "at-123");
        assert!(token.id_token.is_none());
        assert!(token.extra.is_empty());
    }

    #[test]
    fn test_token_deserialization_keeps_unknown_fields() {
        let token: OAuth2Token = serde_json::from_value(json!({
            "access_token": "at",
            "token_type": "Bearer",
            "expires_in": 3599,
            "id_token": "header.payload.sig",
            "ext_expires_in": 3599
        }))
        .unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, Some(3599));
        assert_eq!(token.id_token.as_deref(), Some("header.payload.sig"));
        assert_eq!(token.extra.get("ext_expires_in"), Some(&json!(3599)));
    }

    #[test]
    fn test_token_without_access_token_is_rejected() {
        let result: Result<OAuth2Token, _> =
            serde_json::from_value(json!({ "token_type": "Bearer" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_response_error_callback() {
        let response: AuthResponse = serde_json::from_value(json!({
            "state": "abc",
            "error": "access_denied"
        }))
        .unwrap();
        assert_eq!(response.code, "");
        assert_eq!(response.error.as_deref(), Some("access_denied"));
    }

    #[test]
    fn test_config_builders() {
        let config = OAuth2Config::new("id", "secret", "https://a", "https://t", "https://r")
            .with_scopes(["openid", "email"])
            .with_pkce(true)
            .with_param("prompt", "consent");

        assert_eq!(config.scopes, vec!["openid", "email"]);
        assert!(config.use_pkce);
        assert_eq!(
            config.extra_params,
            vec![("prompt".to_string(), "consent".to_string())]
        );
    }
}
