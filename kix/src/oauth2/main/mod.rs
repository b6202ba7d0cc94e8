mod client;
mod core;

pub use client::exchange_code_for_token;
pub use core::{consume_auth_state, prepare_oauth2_auth_request};
