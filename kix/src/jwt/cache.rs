use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::types::Jwks;

type Slot = Arc<OnceLock<Arc<Jwks>>>;

/// Process-wide memo of key sets, e.g. one per tenant or issuer.
///
/// The constructor for a missing entry runs outside the map's shard locks,
/// at most once per key, while lookups and inserts of other keys proceed.
#[derive(Debug, Default)]
pub struct KeySetCache {
    slots: DashMap<String, Slot>,
}

impl KeySetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key set cached under `key`, building it with `create` if
    /// absent. Concurrent callers for the same key share one construction.
    pub fn get_or_create<F>(&self, key: &str, create: F) -> Arc<Jwks>
    where
        F: FnOnce() -> Jwks,
    {
        // Clone the slot so the shard guard is released before `create` runs
        let slot = self.slots.entry(key.to_string()).or_default().clone();
        slot.get_or_init(|| {
            tracing::debug!("Building key set for {}", key);
            Arc::new(create())
        })
        .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Jwks>> {
        self.slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Replaces the key set under `key`, e.g. after a rotation.
    pub fn insert(&self, key: &str, jwks: Jwks) {
        self.slots
            .insert(key.to_string(), Arc::new(OnceLock::from(Arc::new(jwks))));
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Jwks>> {
        self.slots
            .remove(key)
            .and_then(|(_, slot)| slot.get().cloned())
    }
}
