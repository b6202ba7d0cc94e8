#![allow(dead_code)]

pub mod mock_browser;
pub mod mock_token_server;

pub use mock_browser::{MockBrowser, body_string};
pub use mock_token_server::MockTokenServer;

use kix::CookieSessionStore;

/// Cookie store usable over plain http in tests.
pub fn test_store() -> CookieSessionStore {
    CookieSessionStore::new()
        .with_cookie_name("session")
        .with_secure(false)
}
