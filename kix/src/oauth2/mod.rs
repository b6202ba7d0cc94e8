mod config;
mod errors;
mod main;
mod types;

pub use config::{OAUTH2_PKCE_VERIFIER_KEY, OAUTH2_STATE_KEY};
pub use errors::OAuth2Error;
pub use main::{consume_auth_state, exchange_code_for_token, prepare_oauth2_auth_request};
pub use types::{AuthResponse, OAuth2Config, OAuth2Token};
