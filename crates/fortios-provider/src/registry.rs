//! Lookup of resource schemas by typed name.

use crate::resources;
use crate::Result;
use fortios_core::Error;
use fortios_schema::ResourceSchema;
use std::collections::BTreeMap;

/// Resource schemas keyed by typed name.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    schemas: BTreeMap<&'static str, ResourceSchema>,
}

impl ResourceRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in resource.
    #[must_use]
    pub fn builtin() -> Self {
        resources::builtin()
            .into_iter()
            .fold(Self::new(), Self::with)
    }

    /// Add a schema, replacing any with the same name.
    #[must_use]
    pub fn with(mut self, schema: ResourceSchema) -> Self {
        self.register(schema);
        self
    }

    /// Add a schema, returning the one it replaced.
    pub fn register(&mut self, schema: ResourceSchema) -> Option<ResourceSchema> {
        self.schemas.insert(schema.type_name, schema)
    }

    /// Look up a schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] if no schema has that name.
    pub fn get(&self, type_name: &str) -> Result<&ResourceSchema> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| Error::UnknownResource(type_name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schemas.keys().copied()
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_lists_every_resource() {
        let registry = ResourceRegistry::builtin();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "firewall_internetserviceextension",
                "firewall_vipgrp64",
                "firewallssh_localkey",
                "logfortianalyzer3_overridesetting",
                "logmemory_filter",
                "logsyslogd4_overridesetting",
                "systemreplacemsg_auth",
                "systemreplacemsg_fortiguardwf",
                "systemreplacemsg_mail",
                "virtualpatch_profile",
            ]
        );
    }

    #[test]
    fn unknown_resource_is_an_error() {
        let err = ResourceRegistry::builtin().get("firewall_bogus").unwrap_err();
        assert_eq!(err, Error::UnknownResource("firewall_bogus".to_string()));
        assert!(ResourceRegistry::new().is_empty());
    }

    #[test]
    fn every_attribute_has_a_unique_wire_key() {
        let registry = ResourceRegistry::builtin();
        for name in registry.names() {
            let schema = registry.get(name).unwrap();
            let mut keys: Vec<_> = schema
                .remote_attributes()
                .map(|attr| attr.wire_key.as_str())
                .collect();
            let total = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), total, "{name} has duplicate wire keys");
        }
    }
}
