//! Run-scoped custom type registry.
//!
//! Templates can declare their own type domains at render time
//! (`registerCustomType "swift"`), fill them (`setCustomType "swift" "string"
//! "String"`) and look property types up in them. Misses are never errors:
//! the original token comes back unchanged.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::schema::ModelProperty;

/// Type domain name -> (property type token -> replacement).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CustomTypeRegistry {
    domains: BTreeMap<String, BTreeMap<String, String>>,
}

/// Handle shared between a renderer and the helpers it registers.
pub type SharedCustomTypes = Arc<RwLock<CustomTypeRegistry>>;

impl CustomTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the domain if it does not exist yet. Existing entries are kept.
    pub fn register(&mut self, domain: &str) {
        self.domains.entry(domain.to_string()).or_default();
    }

    /// Sets a mapping in a registered domain.
    ///
    /// Returns `false` (and stores nothing) when the domain was never registered.
    pub fn set(&mut self, domain: &str, token: &str, replacement: &str) -> bool {
        match self.domains.get_mut(domain) {
            Some(table) => {
                table.insert(token.to_string(), replacement.to_string());
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, domain: &str) -> bool {
        self.domains.contains_key(domain)
    }

    pub fn lookup(&self, domain: &str, token: &str) -> Option<&str> {
        self.domains
            .get(domain)
            .and_then(|table| table.get(token))
            .map(String::as_str)
    }

    /// True when the domain maps the property's type token.
    pub fn is_custom_type(&self, domain: &str, property: &ModelProperty) -> bool {
        self.lookup(domain, &property.property_type).is_some()
    }

    /// The domain's replacement for the property's type, or the type itself.
    pub fn to_custom_type(&self, domain: &str, property: &ModelProperty) -> String {
        self.lookup(domain, &property.property_type)
            .unwrap_or(&property.property_type)
            .to_string()
    }

    pub fn clear(&mut self) {
        self.domains.clear();
    }

    pub fn into_shared(self) -> SharedCustomTypes {
        Arc::new(RwLock::new(self))
    }
}
