mod cookie;
mod csrf;
mod key;
mod secure_cookie;
mod store;

pub use self::cookie::CookieSessionStore;
pub use csrf::{
    generate_csrf_token, get_csrf_token, get_fresh_csrf_token, get_or_create_csrf_token,
    refresh_csrf_token, verify_csrf_token,
};
pub use key::SessionKey;
pub use secure_cookie::SecureCookieSessionStore;
pub use store::SessionStore;
