use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::errors::JwtError;
use crate::utils::gen_random_bytes;

/// Token claims, reserved and custom alike.
pub type Claims = HashMap<String, Value>;

/// A symmetric HS256 signing key identified by `kid`.
#[derive(Clone, PartialEq, Eq)]
pub struct Jwk {
    pub kid: String,
    pub secret: Vec<u8>,
    pub active: bool,
}

impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kid", &self.kid)
            .field("secret", &"[REDACTED]")
            .field("active", &self.active)
            .finish()
    }
}

impl Jwk {
    pub fn new(kid: impl Into<String>, secret: impl Into<Vec<u8>>, active: bool) -> Self {
        Self {
            kid: kid.into(),
            secret: secret.into(),
            active,
        }
    }

    /// Creates a key with a random UUID kid and a 32-byte random secret.
    pub fn generate(active: bool) -> Result<Self, JwtError> {
        let secret = gen_random_bytes(32).map_err(|e| JwtError::KeyGeneration(e.to_string()))?;
        Ok(Self::new(uuid::Uuid::new_v4().to_string(), secret, active))
    }
}

/// A set of keys addressed by kid. Any key verifies; only the active key signs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Jwks {
    keys: BTreeMap<String, Jwk>,
}

impl Jwks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `jwk`, replacing any key with the same kid.
    pub fn add(&mut self, jwk: Jwk) {
        self.keys.insert(jwk.kid.clone(), jwk);
    }

    pub fn remove(&mut self, kid: &str) -> Option<Jwk> {
        self.keys.remove(kid)
    }

    pub fn get_by_kid(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    /// The first active key in kid order; falls back to the first key when
    /// none is marked active.
    pub fn active(&self) -> Option<&Jwk> {
        self.keys
            .values()
            .find(|jwk| jwk.active)
            .or_else(|| self.keys.values().next())
    }

    /// Makes `jwk` the only active key. Previous keys stay in the set so
    /// tokens they signed keep verifying until removed.
    pub fn rotate(&mut self, mut jwk: Jwk) {
        for key in self.keys.values_mut() {
            key.active = false;
        }
        jwk.active = true;
        self.add(jwk);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<Jwk> for Jwks {
    fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
        let mut jwks = Jwks::new();
        for jwk in iter {
            jwks.add(jwk);
        }
        jwks
    }
}
