use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::{Extensions, HeaderMap, request::Parts};
use tokio::sync::{Mutex, MutexGuard};

use kix::{Session, SessionStore};

use super::error::{Error, HandleError, RequestHead, default_error_handler};

#[derive(Debug)]
struct SessionSlot {
    session: Mutex<Session>,
    erased: AtomicBool,
}

/// Request-scoped access to the session loaded by [`sessionize`].
///
/// Cloning the handle shares the same session. Changes are persisted when
/// the inner service returns.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<SessionSlot>);

impl SessionHandle {
    pub(crate) fn new(session: Session) -> Self {
        Self(Arc::new(SessionSlot {
            session: Mutex::new(session),
            erased: AtomicBool::new(false),
        }))
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.session.lock().await
    }

    /// A copy of the current session state.
    pub async fn snapshot(&self) -> Session {
        self.0.session.lock().await.clone()
    }

    /// Clears the session and stops [`sessionize`] from writing it back.
    pub(crate) async fn mark_erased(&self) {
        *self.0.session.lock().await = Session::new();
        self.0.erased.store(true, Ordering::SeqCst);
    }

    fn is_erased(&self) -> bool {
        self.0.erased.load(Ordering::SeqCst)
    }
}

pub fn get_session(extensions: &Extensions) -> Result<SessionHandle, Error> {
    extensions
        .get::<SessionHandle>()
        .cloned()
        .ok_or(Error::SessionMissing)
}

/// Like [`get_session`] but panics when [`sessionize`] is not installed.
pub fn must_get_session(extensions: &Extensions) -> SessionHandle {
    match get_session(extensions) {
        Ok(handle) => handle,
        Err(err) => panic!("{err}: is the sessionize middleware installed?"),
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        get_session(&parts.extensions)
    }
}

/// Store and error hook shared by [`sessionize`] and [`logout`].
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn SessionStore>,
    handle_error: HandleError,
}

impl SessionState {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            handle_error: default_error_handler(),
        }
    }

    pub fn with_error_handler(mut self, handle_error: HandleError) -> Self {
        self.handle_error = handle_error;
        self
    }
}

fn append_headers(response: &mut Response, headers: HeaderMap) {
    let target = response.headers_mut();
    for (name, value) in headers.iter() {
        target.append(name, value.clone());
    }
}

/// Loads the session before the inner service runs and persists it after.
///
/// The inner response is held until the session has been written, so
/// cookies set here always reach the client. A session that cannot be read
/// has its cookie erased before the error is reported. A failed write
/// replaces the inner response with the error response.
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(from_fn_with_state(SessionState::new(store), sessionize));
/// ```
#[tracing::instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
pub async fn sessionize(State(state): State<SessionState>, mut req: Request, next: Next) -> Response {
    let head = RequestHead::from_request(&req);

    let session = match state.store.read(req.headers()) {
        Ok(session) => session,
        Err(read_err) => {
            tracing::warn!("Failed to read session: {}", read_err);
            return match state.store.erase(req.headers()) {
                Ok(erase_headers) => {
                    let mut response = (state.handle_error)(&head, Error::SessionRead(read_err));
                    append_headers(&mut response, erase_headers);
                    response
                }
                Err(erase_err) => {
                    tracing::error!("Failed to erase unreadable session: {}", erase_err);
                    (state.handle_error)(&head, Error::SessionErase(erase_err))
                }
            };
        }
    };

    let handle = SessionHandle::new(session);
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    if handle.is_erased() {
        tracing::debug!("Session erased during request, skipping write");
        return response;
    }

    let session = handle.snapshot().await;
    match state.store.write(&head.headers, &session) {
        Ok(cookies) => {
            append_headers(&mut response, cookies);
            response
        }
        Err(write_err) => {
            tracing::error!("Failed to write session: {}", write_err);
            (state.handle_error)(&head, Error::SessionWrite(write_err))
        }
    }
}

/// Erases the session cookie and redirects (303) to `redirect_url`.
///
/// Works inside or outside [`sessionize`]; inside, the in-flight session is
/// dropped as well so it is not written back.
pub async fn logout(state: &SessionState, redirect_url: &str, req: Request) -> Response {
    let head = RequestHead::from_request(&req);
    let handle = get_session(req.extensions()).ok();
    drop(req);

    let erase_headers = match state.store.erase(&head.headers) {
        Ok(headers) => headers,
        Err(err) => return (state.handle_error)(&head, Error::SessionErase(err)),
    };

    if let Some(handle) = handle {
        handle.mark_erased().await;
    }

    tracing::debug!("Session erased, redirecting to {}", redirect_url);
    let mut response = Redirect::to(redirect_url).into_response();
    append_headers(&mut response, erase_headers);
    response
}

/// A route handler performing [`logout`].
///
/// ```ignore
/// .route("/logout", post(logout_handler(session_state, "/")))
/// ```
pub fn logout_handler(
    state: SessionState,
    redirect_url: impl Into<String>,
) -> impl Fn(Request) -> std::pin::Pin<Box<dyn Future<Output = Response> + Send>>
+ Clone
+ Send
+ Sync
+ 'static {
    let redirect_url: Arc<str> = redirect_url.into().into();
    move |req: Request| {
        let state = state.clone();
        let redirect_url = redirect_url.clone();
        Box::pin(async move { logout(&state, &redirect_url, req).await })
    }
}
