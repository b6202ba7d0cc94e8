use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    BoxError, Form, Router,
    extract::{FromRequest, Request},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use kix::{
    AuthResponse, OAuth2Config, OAuth2Error, OAuth2Token, Session, consume_auth_state,
    exchange_code_for_token, prepare_oauth2_auth_request,
};

use super::error::{Error, RequestHead};
use super::session::get_session;

/// Provider-specific half of an OAuth2 login.
///
/// The controller owns the `state` round trip; the strategy decides what a
/// token means for the application.
#[async_trait]
pub trait OAuth2Strategy: Send + Sync + 'static {
    /// Prepares strategy-local state before the redirect to the provider.
    async fn initiate(&self, _head: &RequestHead, _session: &mut Session) -> Result<(), BoxError> {
        Ok(())
    }

    /// Maps the provider token to an application login and returns the URL
    /// to redirect the client to.
    async fn authenticate(
        &self,
        token: &OAuth2Token,
        session: &mut Session,
    ) -> Result<String, BoxError>;

    fn handle_error(&self, head: &RequestHead, error: OAuth2Error) -> Response {
        tracing::warn!("OAuth2 {} {}: {}", head.method, head.uri.path(), error);
        Error::OAuth2(error).into_response()
    }
}

/// Login and callback endpoints of the authorization-code flow for one
/// provider. Both must run inside [`sessionize`](crate::sessionize).
pub struct OAuth2Controller<S> {
    config: Arc<OAuth2Config>,
    strategy: Arc<S>,
}

impl<S> Clone for OAuth2Controller<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            strategy: Arc::clone(&self.strategy),
        }
    }
}

impl<S: OAuth2Strategy> OAuth2Controller<S> {
    pub fn new(config: OAuth2Config, strategy: S) -> Self {
        Self {
            config: Arc::new(config),
            strategy: Arc::new(strategy),
        }
    }

    /// Routes `GET login_path` to [`login`](Self::login) and
    /// `GET|POST callback_path` to [`callback`](Self::callback).
    pub fn router<St>(&self, login_path: &str, callback_path: &str) -> Router<St>
    where
        St: Clone + Send + Sync + 'static,
    {
        let login = self.clone();
        let callback = self.clone();
        let callback = move |req: Request| {
            let controller = callback.clone();
            async move { controller.callback(req).await }
        };

        Router::new()
            .route(
                login_path,
                get(move |req: Request| {
                    let controller = login.clone();
                    async move { controller.login(req).await }
                }),
            )
            .route(callback_path, get(callback.clone()).post(callback))
    }

    /// Stores a fresh `state` in the session and redirects (303) to the
    /// provider.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, req: Request) -> Response {
        let head = RequestHead::from_request(&req);
        let handle = match get_session(req.extensions()) {
            Ok(handle) => handle,
            Err(err) => return err.into_response(),
        };
        drop(req);

        let mut session = handle.lock().await;

        if let Err(err) = self.strategy.initiate(&head, &mut session).await {
            return self
                .strategy
                .handle_error(&head, OAuth2Error::InitiateFailure(err.to_string()));
        }

        match prepare_oauth2_auth_request(&self.config, &mut session) {
            Ok(auth_url) => Redirect::to(&auth_url).into_response(),
            Err(err) => self.strategy.handle_error(&head, err),
        }
    }

    /// Consumes the stored `state`, then exchanges the code and hands the
    /// token to the strategy. A `state` mismatch stops the flow before any
    /// request to the provider.
    #[tracing::instrument(skip_all)]
    pub async fn callback(&self, req: Request) -> Response {
        let head = RequestHead::from_request(&req);
        let handle = match get_session(req.extensions()) {
            Ok(handle) => handle,
            Err(err) => return err.into_response(),
        };

        // Query string on GET, form body on POST
        let params = match Form::<AuthResponse>::from_request(req, &()).await {
            Ok(Form(params)) => params,
            Err(rejection) => {
                tracing::warn!("Unreadable OAuth2 callback parameters: {}", rejection);
                AuthResponse::default()
            }
        };

        let verifier = {
            let mut session = handle.lock().await;
            match consume_auth_state(&mut session, &params.state) {
                Ok(verifier) => verifier,
                Err(err) => return self.strategy.handle_error(&head, err),
            }
        };

        if let Some(error) = &params.error {
            let description = params.error_description.as_deref().unwrap_or_default();
            return self.strategy.handle_error(
                &head,
                OAuth2Error::ExchangeFailure(format!("Provider returned {error} {description}")),
            );
        }
        if params.code.is_empty() {
            return self.strategy.handle_error(
                &head,
                OAuth2Error::ExchangeFailure("Missing authorization code".to_string()),
            );
        }

        let token = match exchange_code_for_token(
            &self.config,
            &params.code,
            verifier.as_deref(),
        )
        .await
        {
            Ok(token) => token,
            Err(err) => return self.strategy.handle_error(&head, err),
        };

        let mut session = handle.lock().await;
        match self.strategy.authenticate(&token, &mut session).await {
            Ok(redirect_url) => Redirect::to(&redirect_url).into_response(),
            Err(err) => self
                .strategy
                .handle_error(&head, OAuth2Error::AuthenticateFailure(err.to_string())),
        }
    }
}
