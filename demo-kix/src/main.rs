use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kix_axum::kix::{
    Jwk, Jwks, KeySetCache, OAuth2Config, SecureCookieSessionStore, SessionKey,
};
use kix_axum::{
    AuthenticateState, OAuth2Controller, SessionState, authenticate, authenticated, csrf_protect,
    default_error_handler, logout_handler, sessionize,
};

mod handlers;
mod server;

use crate::handlers::{
    JWT_KEY_SET, ProviderLogin, SessionUsers, User, api_token, csrf_token, dev_login, index,
    protected,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) key_sets: Arc<KeySetCache>,
}

/// Reads the provider registration from `OAUTH2_*` variables. Returns
/// `None` when no client id is configured.
fn oauth2_config() -> Option<OAuth2Config> {
    let client_id = std::env::var("OAUTH2_CLIENT_ID").ok()?;
    let var = |name: &str| std::env::var(name).unwrap_or_default();

    Some(
        OAuth2Config::new(
            client_id,
            var("OAUTH2_CLIENT_SECRET"),
            var("OAUTH2_AUTH_URL"),
            var("OAUTH2_TOKEN_URL"),
            var("OAUTH2_REDIRECT_URL"),
        )
        .with_scopes(var("OAUTH2_SCOPES").split_whitespace())
        .with_pkce(true),
    )
}

/// Uses `SESSION_SECRET` (at least 32 bytes) as the encryption key, or a
/// random key (sessions do not survive a restart) when unset.
fn session_keys() -> Result<Vec<SessionKey>, Box<dyn std::error::Error>> {
    match std::env::var("SESSION_SECRET") {
        Ok(secret) => Ok(vec![SessionKey::private(secret)?]),
        Err(_) => {
            tracing::warn!("SESSION_SECRET not set, using an ephemeral key");
            Ok(vec![SessionKey::generate()?])
        }
    }
}

fn app(store: SecureCookieSessionStore, state: AppState, oauth2: Option<OAuth2Config>) -> Router {
    let sessions = SessionState::new(store);
    let errors = default_error_handler();

    let members = Router::new()
        .route("/protected", get(protected))
        .route("/api/token", get(api_token))
        .route_layer(from_fn_with_state(errors.clone(), authenticated::<User>));

    let api = Router::new()
        .route("/dev/login", post(dev_login))
        .route("/logout", post(logout_handler(sessions.clone(), "/")))
        .route_layer(from_fn_with_state(errors.clone(), csrf_protect));

    let mut app = Router::new()
        .merge(members)
        .merge(api)
        .route("/", get(index))
        .route("/csrf", get(csrf_token));

    match oauth2 {
        Some(config) => {
            let controller = OAuth2Controller::new(config, ProviderLogin);
            app = app.merge(controller.router("/oauth2/login", "/oauth2/callback"));
        }
        None => tracing::info!("OAUTH2_CLIENT_ID not set, OAuth2 login disabled"),
    }

    app.with_state(state)
        .layer(from_fn_with_state(
            AuthenticateState::new(SessionUsers, errors),
            authenticate::<SessionUsers>,
        ))
        .layer(from_fn_with_state(sessions, sessionize))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,kix=debug,kix_axum=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let secure = std::env::var("COOKIE_SECURE").is_ok_and(|v| v == "true");
    let store = SecureCookieSessionStore::new(session_keys()?)?.with_secure(secure);

    let key_sets = Arc::new(KeySetCache::new());
    key_sets.insert(JWT_KEY_SET, Jwks::from_iter([Jwk::generate(true)?]));

    let app = app(store, AppState { key_sets }, oauth2_config());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    server::serve(port, app).await?;
    Ok(())
}
