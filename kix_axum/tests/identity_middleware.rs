//! authenticate / authenticated / anonymous middlewares and the Identity
//! extractor.

mod common;

use async_trait::async_trait;
use axum::{
    BoxError, Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use kix::Session;
use kix_axum::{
    AuthenticateState, Identify, Identity, SessionHandle, SessionState, anonymous, authenticate,
    authenticated, default_error_handler, sessionize,
};

use common::{MockBrowser, body_string, test_store};

#[derive(Debug, Clone)]
struct User {
    name: String,
}

/// Identifies the session by its `user` key; `blocked` users fail.
struct Users;

#[async_trait]
impl Identify for Users {
    type Identity = User;

    async fn identify(&self, session: &Session) -> Result<Option<User>, BoxError> {
        match session.get_first("user") {
            "" => Ok(None),
            "blocked" => Err("user is blocked".into()),
            name => Ok(Some(User {
                name: name.to_string(),
            })),
        }
    }
}

async fn login_as(session: SessionHandle, body: String) -> &'static str {
    session.lock().await.reset("user", body);
    "logged in"
}

async fn profile(Identity(user): Identity<User>) -> String {
    format!("hello {}", user.name)
}

async fn whoami(user: Option<Identity<User>>) -> String {
    match user {
        Some(Identity(user)) => user.name,
        None => "anonymous".to_string(),
    }
}

fn app() -> Router {
    let errors = default_error_handler();

    let members = Router::new()
        .route("/profile", get(profile))
        .route_layer(from_fn_with_state(errors.clone(), authenticated::<User>));

    let guests = Router::new()
        .route("/signup", get(|| async { "signup form" }))
        .route_layer(from_fn_with_state(errors.clone(), anonymous::<User>));

    Router::new()
        .merge(members)
        .merge(guests)
        .route("/whoami", get(whoami))
        .route("/login", post(login_as))
        .layer(from_fn_with_state(
            AuthenticateState::new(Users, errors),
            authenticate::<Users>,
        ))
        .layer(from_fn_with_state(SessionState::new(test_store()), sessionize))
}

async fn login(browser: &mut MockBrowser, name: &str) {
    let response = browser
        .send(
            axum::http::Method::POST,
            "/login",
            Default::default(),
            name.to_string().into(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_request() {
    let mut browser = MockBrowser::new(app());

    assert_eq!(body_string(browser.get("/whoami").await).await, "anonymous");
    assert_eq!(
        browser.get("/profile").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(browser.get("/signup").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authenticated_request() {
    let mut browser = MockBrowser::new(app());
    login(&mut browser, "alice").await;

    assert_eq!(body_string(browser.get("/whoami").await).await, "alice");

    let response = browser.get("/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "hello alice");

    assert_eq!(browser.get("/signup").await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_identify_failure_is_reported() {
    let mut browser = MockBrowser::new(app());
    login(&mut browser, "blocked").await;

    let response = browser.get("/whoami").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("user is blocked"));
}

#[tokio::test]
async fn test_identity_of_other_type_is_missing() {
    let app = Router::new()
        .route("/profile", get(|| async { "secret" }))
        .route_layer(from_fn_with_state(
            default_error_handler(),
            authenticated::<String>,
        ))
        .route("/login", post(login_as))
        .layer(from_fn_with_state(
            AuthenticateState::new(Users, default_error_handler()),
            authenticate::<Users>,
        ))
        .layer(from_fn_with_state(SessionState::new(test_store()), sessionize));
    let mut browser = MockBrowser::new(app);

    login(&mut browser, "alice").await;

    assert_eq!(
        browser.get("/profile").await.status(),
        StatusCode::UNAUTHORIZED
    );
}
