use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    BoxError,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use kix::{Session, verify_csrf_token};

use super::error::{Error, HandleError, RequestHead};
use super::identity::{get_identity, set_identity};
use super::session::get_session;

/// Rejects unsafe requests whose `X-CSRF-TOKEN` header does not match the
/// session token. Must run inside [`sessionize`](crate::sessionize).
#[tracing::instrument(skip_all, fields(method = %req.method()))]
pub async fn csrf_protect(
    State(handle_error): State<HandleError>,
    req: Request,
    next: Next,
) -> Response {
    let handle = match get_session(req.extensions()) {
        Ok(handle) => handle,
        Err(err) => return handle_error(&RequestHead::from_request(&req), err),
    };

    let verified = {
        let session = handle.lock().await;
        verify_csrf_token(req.method(), req.headers(), &session)
    };

    if let Err(err) = verified {
        return handle_error(&RequestHead::from_request(&req), err.into());
    }

    next.run(req).await
}

/// Resolves the identity of a session, e.g. by looking up a user id stored
/// at login.
#[async_trait]
pub trait Identify: Send + Sync + 'static {
    type Identity: Clone + Send + Sync + 'static;

    /// `Ok(None)` means the session is anonymous.
    async fn identify(&self, session: &Session) -> Result<Option<Self::Identity>, BoxError>;
}

pub struct AuthenticateState<I> {
    identifier: Arc<I>,
    handle_error: HandleError,
}

impl<I> Clone for AuthenticateState<I> {
    fn clone(&self) -> Self {
        Self {
            identifier: Arc::clone(&self.identifier),
            handle_error: Arc::clone(&self.handle_error),
        }
    }
}

impl<I: Identify> AuthenticateState<I> {
    pub fn new(identifier: I, handle_error: HandleError) -> Self {
        Self {
            identifier: Arc::new(identifier),
            handle_error,
        }
    }
}

/// Runs the [`Identify`] implementation against the session and makes the
/// resulting identity available to [`get_identity`] and the
/// [`Identity`](crate::Identity) extractor.
#[tracing::instrument(skip_all)]
pub async fn authenticate<I: Identify>(
    State(state): State<AuthenticateState<I>>,
    mut req: Request,
    next: Next,
) -> Response {
    let handle = match get_session(req.extensions()) {
        Ok(handle) => handle,
        Err(err) => return (state.handle_error)(&RequestHead::from_request(&req), err),
    };

    let identified = {
        let session = handle.lock().await;
        state.identifier.identify(&session).await
    };

    match identified {
        Ok(Some(identity)) => {
            set_identity(req.extensions_mut(), identity);
        }
        Ok(None) => {
            tracing::debug!("Anonymous session");
        }
        Err(err) => {
            tracing::warn!("Failed to identify session: {}", err);
            return (state.handle_error)(
                &RequestHead::from_request(&req),
                Error::IdentifyFailure(err.to_string()),
            );
        }
    }

    next.run(req).await
}

/// Lets the request through only when an identity of type `T` is present.
pub async fn authenticated<T>(
    State(handle_error): State<HandleError>,
    req: Request,
    next: Next,
) -> Response
where
    T: Clone + Send + Sync + 'static,
{
    if let Err(err) = get_identity::<T>(req.extensions()) {
        return handle_error(&RequestHead::from_request(&req), err);
    }
    next.run(req).await
}

/// Lets the request through only when no identity of type `T` is present,
/// e.g. for login and sign-up pages.
pub async fn anonymous<T>(
    State(handle_error): State<HandleError>,
    req: Request,
    next: Next,
) -> Response
where
    T: Clone + Send + Sync + 'static,
{
    if get_identity::<T>(req.extensions()).is_ok() {
        return handle_error(&RequestHead::from_request(&req), Error::AlreadyAuthenticated);
    }
    next.run(req).await
}
