use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use http::{Extensions, request::Parts};

use super::error::Error;

/// The authenticated principal of the current request, inserted by the
/// [`authenticate`](crate::authenticate) middleware.
///
/// ```ignore
/// async fn profile(Identity(user): Identity<User>) -> String {
///     format!("Hello, {}!", user.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity<T>(pub T);

pub(crate) fn set_identity<T>(extensions: &mut Extensions, identity: T)
where
    T: Clone + Send + Sync + 'static,
{
    extensions.insert(Identity(identity));
}

/// Returns the identity of type `T`. Fails with [`Error::IdentityMissing`]
/// when none was set or when it was set with another type.
pub fn get_identity<T>(extensions: &Extensions) -> Result<T, Error>
where
    T: Clone + Send + Sync + 'static,
{
    extensions
        .get::<Identity<T>>()
        .map(|Identity(identity)| identity.clone())
        .ok_or(Error::IdentityMissing)
}

/// Like [`get_identity`] but panics when no identity is present. Only use
/// behind [`authenticated`](crate::authenticated).
pub fn must_get_identity<T>(extensions: &Extensions) -> T
where
    T: Clone + Send + Sync + 'static,
{
    match get_identity(extensions) {
        Ok(identity) => identity,
        Err(err) => panic!("{err}: is the route guarded by the authenticated middleware?"),
    }
}

impl<S, T> FromRequestParts<S> for Identity<T>
where
    S: Send + Sync,
    T: Clone + Send + Sync + 'static,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        get_identity(&parts.extensions).map(Identity)
    }
}

impl<S, T> OptionalFromRequestParts<S> for Identity<T>
where
    S: Send + Sync,
    T: Clone + Send + Sync + 'static,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(get_identity(&parts.extensions).ok().map(Identity))
    }
}
