//! kix-axum - axum integration for kix sessions and authentication
//!
//! Middlewares are plain `async fn(State, Request, Next) -> Response`
//! functions meant for `axum::middleware::from_fn_with_state`:
//!
//! ```ignore
//! let sessions = SessionState::new(CookieSessionStore::new());
//! let errors = default_error_handler();
//!
//! let app = Router::new()
//!     .route("/account", get(account))
//!     .route_layer(from_fn_with_state(errors.clone(), authenticated::<User>))
//!     .layer(from_fn_with_state(AuthenticateState::new(Users, errors.clone()), authenticate))
//!     .layer(from_fn_with_state(errors, csrf_protect))
//!     .layer(from_fn_with_state(sessions, sessionize));
//! ```

mod error;
mod identity;
mod middleware;
mod oauth2;
mod session;

pub use error::{Error, HandleError, RequestHead, default_error_handler};
pub use identity::{Identity, get_identity, must_get_identity};
pub use middleware::{
    AuthenticateState, Identify, anonymous, authenticate, authenticated, csrf_protect,
};
pub use oauth2::{OAuth2Controller, OAuth2Strategy};
pub use session::{
    SessionHandle, SessionState, get_session, logout, logout_handler, must_get_session,
    sessionize,
};

// Re-export the core crate so applications need a single dependency
pub use kix;
