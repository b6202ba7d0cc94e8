//! Keys for the signed cookie session store.
//!
//! Signing and encryption are done by the `cookie` crate jars: a signed key
//! prepends an HMAC-SHA256 tag to the value, a private key seals it with
//! AES-256-GCM using the cookie name as associated data.

use cookie::{Cookie, CookieJar, Key};

use crate::session::errors::SessionError;
use crate::utils::gen_random_bytes;

const MIN_SECRET_LEN: usize = 32;
const MASTER_KEY_LEN: usize = 64;

/// One entry of a key rotation list.
#[derive(Clone)]
pub struct SessionKey {
    key: Key,
    private: bool,
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &"[REDACTED]")
            .field("private", &self.private)
            .finish()
    }
}

impl SessionKey {
    /// A key that authenticates the cookie but leaves it readable.
    ///
    /// Secrets of 64 bytes or more are used as the master key directly.
    /// Shorter secrets (at least 32 bytes) are expanded with HKDF.
    pub fn signed(secret: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        Ok(Self {
            key: master_key(secret.as_ref())?,
            private: false,
        })
    }

    /// A key that encrypts and authenticates the cookie.
    pub fn private(secret: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        Ok(Self {
            key: master_key(secret.as_ref())?,
            private: true,
        })
    }

    /// Random 64-byte private key.
    pub fn generate() -> Result<Self, SessionError> {
        Self::private(gen_random_bytes(MASTER_KEY_LEN)?)
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Signs or encrypts `value` for the cookie `name`.
    pub(crate) fn seal(&self, name: &str, value: String) -> Result<String, SessionError> {
        let mut jar = CookieJar::new();
        let cookie = Cookie::new(name.to_string(), value);
        if self.private {
            jar.private_mut(&self.key).add(cookie);
        } else {
            jar.signed_mut(&self.key).add(cookie);
        }

        jar.get(name)
            .map(|sealed| sealed.value().to_string())
            .ok_or_else(|| SessionError::Crypto("Sealed cookie missing from jar".to_string()))
    }

    /// Returns the plain value when `value` was sealed with this key for
    /// the cookie `name`.
    pub(crate) fn open(&self, name: &str, value: &str) -> Option<String> {
        let jar = CookieJar::new();
        let cookie = Cookie::new(name.to_string(), value.to_string());
        let opened = if self.private {
            jar.private(&self.key).decrypt(cookie)
        } else {
            jar.signed(&self.key).verify(cookie)
        };
        opened.map(|cookie| cookie.value().to_string())
    }
}

fn master_key(secret: &[u8]) -> Result<Key, SessionError> {
    if secret.len() >= MASTER_KEY_LEN {
        Key::try_from(secret).map_err(|e| SessionError::InvalidKey(e.to_string()))
    } else if secret.len() >= MIN_SECRET_LEN {
        Ok(Key::derive_from(secret))
    } else {
        Err(SessionError::InvalidKey(format!(
            "Session secret must be at least {MIN_SECRET_LEN} bytes, got {}",
            secret.len()
        )))
    }
}
