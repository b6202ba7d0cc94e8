use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Form, Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::collections::HashMap;

pub const VALID_CODE: &str = "valid-code";

/// Token endpoint on an ephemeral local port. Accepts [`VALID_CODE`] only
/// and counts every request it receives.
pub struct MockTokenServer {
    pub token_url: String,
    hits: Arc<AtomicUsize>,
    last_form: Arc<std::sync::Mutex<HashMap<String, String>>>,
}

#[derive(Clone)]
struct ServerState {
    hits: Arc<AtomicUsize>,
    last_form: Arc<std::sync::Mutex<HashMap<String, String>>>,
}

impl MockTokenServer {
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let last_form = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let state = ServerState {
            hits: hits.clone(),
            last_form: last_form.clone(),
        };

        let app = Router::new()
            .route("/token", post(token))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            token_url: format!("http://{addr}/token"),
            hits,
            last_form,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_form(&self) -> HashMap<String, String> {
        self.last_form.lock().unwrap().clone()
    }
}

async fn token(
    State(state): State<ServerState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_form.lock().unwrap() = form.clone();

    if form.get("grant_type").map(String::as_str) != Some("authorization_code")
        || form.get("code").map(String::as_str) != Some(VALID_CODE)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        ));
    }

    Ok(Json(json!({
        "access_token": "mock-access-token",
        "token_type": "Bearer",
        "expires_in": 3600
    })))
}
