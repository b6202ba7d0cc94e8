use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use url::Url;

use crate::oauth2::config::{OAUTH2_PKCE_VERIFIER_KEY, OAUTH2_STATE_KEY};
use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::OAuth2Config;
use crate::session::Session;
use crate::utils::{base64url_encode, gen_random_string};

/// Issues a fresh `state` token (and PKCE verifier when enabled) into the
/// session and returns the provider authorization URL to redirect to.
///
/// Any previously issued state is overwritten, so only the latest login
/// attempt of a session can complete.
pub fn prepare_oauth2_auth_request(
    config: &OAuth2Config,
    session: &mut Session,
) -> Result<String, OAuth2Error> {
    let mut url = Url::parse(&config.auth_url)
        .map_err(|e| OAuth2Error::InitiateFailure(format!("Invalid authorization URL: {e}")))?;

    let state = gen_random_string(16).map_err(|e| OAuth2Error::InitiateFailure(e.to_string()))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_url);
        if !config.scopes.is_empty() {
            query.append_pair("scope", &config.scopes.join(" "));
        }
        query.append_pair("state", &state);

        if config.use_pkce {
            let verifier =
                gen_random_string(32).map_err(|e| OAuth2Error::InitiateFailure(e.to_string()))?;
            let challenge = base64url_encode(&Sha256::digest(verifier.as_bytes()));
            query
                .append_pair("code_challenge", &challenge)
                .append_pair("code_challenge_method", "S256");
            session.reset(OAUTH2_PKCE_VERIFIER_KEY, verifier);
        } else {
            session.del(OAUTH2_PKCE_VERIFIER_KEY);
        }

        for (key, value) in &config.extra_params {
            query.append_pair(key, value);
        }
    }

    session.reset(OAUTH2_STATE_KEY, state);
    tracing::debug!("Prepared OAuth2 authorization redirect to {}", config.auth_url);

    Ok(url.into())
}

/// Removes the stored `state` (and PKCE verifier) from the session and checks
/// the callback's `state` against it.
///
/// The stored values are consumed whatever the outcome, so each issued state
/// can be presented at most once. Returns the PKCE verifier, if any.
pub fn consume_auth_state(
    session: &mut Session,
    state: &str,
) -> Result<Option<String>, OAuth2Error> {
    let expected = session.get_first(OAUTH2_STATE_KEY).to_string();
    let verifier = session.get_first(OAUTH2_PKCE_VERIFIER_KEY).to_string();
    session.del(OAUTH2_STATE_KEY);
    session.del(OAUTH2_PKCE_VERIFIER_KEY);

    if expected.is_empty() || state.is_empty() {
        tracing::warn!("OAuth2 callback without an issued state");
        return Err(OAuth2Error::CsrfMismatch);
    }

    if !bool::from(expected.as_bytes().ct_eq(state.as_bytes())) {
        tracing::warn!("OAuth2 callback state mismatch");
        return Err(OAuth2Error::CsrfMismatch);
    }

    Ok((!verifier.is_empty()).then_some(verifier))
}
