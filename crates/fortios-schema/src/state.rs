//! Locally held resource state.
//!
//! A [`ResourceState`] carries the object identity, the desired attribute
//! values and the values as of the last commit. The difference between the
//! two drives change detection when building an update payload.

use crate::value::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute values keyed by typed name.
pub type Values = BTreeMap<String, AttrValue>;

/// Identity plus attribute values for one resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    id: Option<String>,
    #[serde(default)]
    values: Values,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    prior: Values,
}

impl ResourceState {
    /// Create an empty, absent state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state whose desired values differ from the committed ones.
    #[must_use]
    pub fn planned(id: Option<String>, prior: Values, values: Values) -> Self {
        Self { id, values, prior }
    }

    /// Object identity, if the object exists.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set the object identity.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Drop the object identity, marking it absent.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Whether the state has no identity.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.id.is_none()
    }

    /// Raw value, present even if empty.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// Value only if explicitly set (non-empty string or table, any int or bool).
    #[must_use]
    pub fn get_ok(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name).filter(|value| value.is_set())
    }

    /// String value, if set.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_ok(name).and_then(AttrValue::as_str)
    }

    /// Integer value, if set.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(AttrValue::as_int)
    }

    /// Store a value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a value, returning it.
    pub fn unset(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    /// Whether the desired value differs from the committed one.
    #[must_use]
    pub fn has_change(&self, name: &str) -> bool {
        self.values.get(name) != self.prior.get(name)
    }

    /// Committed value of an attribute.
    #[must_use]
    pub fn prior(&self, name: &str) -> Option<&AttrValue> {
        self.prior.get(name)
    }

    /// Iterate desired values.
    pub fn values(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Mark the current values as committed.
    pub fn commit(&mut self) {
        self.prior.clone_from(&self.values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_ok_follows_set_semantics() {
        let mut state = ResourceState::new();
        state.set("comment", "");
        state.set("color", 0_i64);
        assert!(state.get("comment").is_some());
        assert!(state.get_ok("comment").is_none());
        assert_eq!(state.get_ok("color"), Some(&AttrValue::Int(0)));
        assert_eq!(state.get_int("color"), Some(0));
    }

    #[test]
    fn has_change_tracks_commit() {
        let mut state = ResourceState::new();
        state.set("name", "a");
        assert!(state.has_change("name"));
        state.commit();
        assert!(!state.has_change("name"));
        state.unset("name");
        assert!(state.has_change("name"));
        assert_eq!(state.prior("name"), Some(&AttrValue::from("a")));
    }

    #[test]
    fn identity_lifecycle() {
        let mut state = ResourceState::new();
        assert!(state.is_absent());
        state.set_id("grp1");
        assert_eq!(state.id(), Some("grp1"));
        state.clear_id();
        assert!(state.is_absent());
    }

    #[test]
    fn planned_reports_changes_against_prior() {
        let prior: Values = [("status".to_string(), AttrValue::from("enable"))].into();
        let values: Values = [("status".to_string(), AttrValue::from("disable"))].into();
        let state = ResourceState::planned(Some("id".into()), prior, values);
        assert!(state.has_change("status"));
        assert!(!state.has_change("server"));
    }
}
