use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-request, multi-valued key/value state persisted across requests by a
/// [`SessionStore`](crate::SessionStore).
///
/// Values for a key keep their insertion order. None of the operations can
/// fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    values: BTreeMap<String, Vec<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_values(values: BTreeMap<String, Vec<String>>) -> Self {
        Self { values }
    }

    pub(crate) fn values(&self) -> &BTreeMap<String, Vec<String>> {
        &self.values
    }

    /// Returns every value stored for `key`, or an empty slice.
    pub fn get(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the first value stored for `key`, or an empty string.
    pub fn get_first(&self, key: &str) -> &str {
        self.get(key).first().map(String::as_str).unwrap_or_default()
    }

    /// True when `key` is not present at all.
    pub fn is_empty_key(&self, key: &str) -> bool {
        !self.values.contains_key(key)
    }

    pub fn has(&self, key: &str, value: &str) -> bool {
        self.get(key).iter().any(|v| v == value)
    }

    /// Replaces the whole sequence for `key`.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.values.insert(key.into(), values);
    }

    /// Replaces the sequence for `key` with the single `value`.
    pub fn reset(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), vec![value.into()]);
    }

    /// Appends `value` unless it is already present for `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let entry = self.values.entry(key.into()).or_default();
        if !entry.contains(&value) {
            entry.push(value);
        }
    }

    /// Removes `value` from `key`. The key itself stays, possibly empty.
    pub fn remove(&mut self, key: &str, value: &str) {
        if let Some(values) = self.values.get_mut(key) {
            values.retain(|v| v != value);
        }
    }

    pub fn toggle(&mut self, key: &str, value: &str) {
        if self.has(key, value) {
            self.remove(key, value);
        } else {
            self.add(key, value);
        }
    }

    /// Removes `key` and all its values.
    pub fn del(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_absent_key_is_empty() {
        let session = Session::new();
        assert!(session.get("missing").is_empty());
        assert_eq!(session.get_first("missing"), "");
        assert!(session.is_empty_key("missing"));
        assert!(!session.has("missing", "x"));
    }

    #[test]
    fn test_set_reset_and_get_first() {
        let mut session = Session::new();
        session.set("roles", vec!["admin".to_string(), "user".to_string()]);
        assert_eq!(session.get("roles"), ["admin", "user"]);
        assert_eq!(session.get_first("roles"), "admin");

        session.reset("roles", "guest");
        assert_eq!(session.get("roles"), ["guest"]);
    }

    #[test]
    fn test_add_is_idempotent_and_preserves_order() {
        let mut session = Session::new();
        session.add("flags", "b");
        session.add("flags", "a");
        session.add("flags", "b");
        assert_eq!(session.get("flags"), ["b", "a"]);
    }

    #[test]
    fn test_remove_keeps_key_with_empty_sequence() {
        let mut session = Session::new();
        session.add("flags", "a");
        session.remove("flags", "a");
        session.remove("flags", "a");
        session.remove("other", "a");

        assert!(session.get("flags").is_empty());
        assert!(!session.is_empty_key("flags"));
        assert!(session.is_empty_key("other"));
    }

    #[test]
    fn test_toggle() {
        let mut session = Session::new();
        session.toggle("menu", "open");
        assert!(session.has("menu", "open"));
        session.toggle("menu", "open");
        assert!(!session.has("menu", "open"));
    }

    #[test]
    fn test_del() {
        let mut session = Session::new();
        session.add("a", "1");
        session.add("b", "2");
        session.del("a");

        assert!(session.is_empty_key("a"));
        assert_eq!(session.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(session.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Remove(String),
        Toggle(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let value = prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")].prop_map(String::from);
        prop_oneof![
            value.clone().prop_map(Op::Add),
            value.clone().prop_map(Op::Remove),
            value.prop_map(Op::Toggle),
        ]
    }

    proptest! {
        /// The sequence never holds duplicates and matches a set model of the
        /// applied operations.
        #[test]
        fn prop_add_remove_toggle_matches_set_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let mut session = Session::new();
            let mut model = std::collections::BTreeSet::new();

            for op in &ops {
                match op {
                    Op::Add(v) => {
                        session.add("k", v.as_str());
                        model.insert(v.clone());
                    }
                    Op::Remove(v) => {
                        session.remove("k", v);
                        model.remove(v);
                    }
                    Op::Toggle(v) => {
                        session.toggle("k", v);
                        if !model.remove(v) {
                            model.insert(v.clone());
                        }
                    }
                }
            }

            let values = session.get("k");
            let unique: std::collections::BTreeSet<_> = values.iter().cloned().collect();
            prop_assert_eq!(unique.len(), values.len());
            prop_assert_eq!(unique, model);
        }
    }
}
