use async_trait::async_trait;
use axum::{
    BoxError, Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use kix_axum::kix::{
    Claims, OAuth2Token, Session, generate_jwt, get_or_create_csrf_token,
};
use kix_axum::{Error, Identify, Identity, OAuth2Strategy, SessionHandle};

use crate::AppState;

const USER_KEY: &str = "user";
pub(crate) const JWT_KEY_SET: &str = "api";

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) name: String,
}

/// The logged-in user is whatever name the session carries.
pub(crate) struct SessionUsers;

#[async_trait]
impl Identify for SessionUsers {
    type Identity = User;

    async fn identify(&self, session: &Session) -> Result<Option<User>, BoxError> {
        let name = session.get_first(USER_KEY);
        Ok((!name.is_empty()).then(|| User {
            name: name.to_string(),
        }))
    }
}

/// Logs in as the `email` the provider returns with the token, falling back
/// to a generic account name.
pub(crate) struct ProviderLogin;

#[async_trait]
impl OAuth2Strategy for ProviderLogin {
    async fn authenticate(
        &self,
        token: &OAuth2Token,
        session: &mut Session,
    ) -> Result<String, BoxError> {
        let name = token
            .extra
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or("oauth2-user");
        tracing::info!("OAuth2 login as {}", name);
        session.reset(USER_KEY, name);
        Ok("/".to_string())
    }
}

/// Logout is a CSRF-protected POST, so the button fetches a token first.
const LOGOUT_BUTTON: &str = r#"<button onclick="fetch('/csrf').then(r => r.json()).then(t => fetch('/logout', {method: 'POST', headers: {'X-CSRF-TOKEN': t.csrf_token}})).then(() => location.assign('/'))">Logout</button>"#;

pub(crate) async fn index(user: Option<Identity<User>>) -> Html<String> {
    match user {
        Some(Identity(user)) => Html(format!(
            "<p>Hey {}!</p><p><a href=\"/protected\">Protected</a></p>{LOGOUT_BUTTON}",
            user.name
        )),
        None => Html(
            "<p>Not logged in.</p><p><a href=\"/oauth2/login\">Login with OAuth2</a></p>"
                .to_string(),
        ),
    }
}

pub(crate) async fn protected(Identity(user): Identity<User>) -> Html<String> {
    Html(format!("<p>Only {} can see this.</p>", user.name))
}

pub(crate) async fn csrf_token(session: SessionHandle) -> Response {
    match get_or_create_csrf_token(&mut *session.lock().await) {
        Ok(token) => Json(json!({ "csrf_token": token })).into_response(),
        Err(err) => Error::from(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DevLogin {
    name: String,
}

/// Logs in without a provider. Requires the `X-CSRF-TOKEN` header.
pub(crate) async fn dev_login(session: SessionHandle, Json(login): Json<DevLogin>) -> StatusCode {
    if login.name.is_empty() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    session.lock().await.reset(USER_KEY, login.name);
    StatusCode::NO_CONTENT
}

/// Issues a short-lived bearer token for the logged-in user.
pub(crate) async fn api_token(
    State(state): State<AppState>,
    Identity(user): Identity<User>,
) -> Response {
    let Some(jwks) = state.key_sets.get(JWT_KEY_SET) else {
        tracing::error!("No key set provisioned for {}", JWT_KEY_SET);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut claims = Claims::new();
    claims.insert("sub".to_string(), Value::String(user.name));

    match generate_jwt(&jwks, claims, chrono::Duration::minutes(5)) {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(err) => {
            tracing::error!("Failed to issue API token: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
