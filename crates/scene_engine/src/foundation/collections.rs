//! Specialized collection types

use std::collections::BTreeMap;

pub use slotmap::{new_key_type, Key, SlotMap};

/// Named resource registry with stable handles
///
/// Values live in a slot map so handles stay valid while other entries come
/// and go. A value may be reachable under several names; the name index is
/// ordered so reverse lookups are deterministic.
pub struct Registry<K: Key, T> {
    items: SlotMap<K, T>,
    names: BTreeMap<String, K>,
}

impl<K: Key, T> Registry<K, T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            names: BTreeMap::new(),
        }
    }

    /// Register a value under a name and return its handle
    ///
    /// An existing entry with the same name is replaced. The old value is
    /// dropped once no other name refers to it.
    pub fn add(&mut self, name: impl Into<String>, value: T) -> K {
        let name = name.into();
        if self.names.contains_key(&name) {
            self.remove(&name);
        }
        let handle = self.items.insert(value);
        self.names.insert(name, handle);
        handle
    }

    /// Register an additional name for an existing handle
    ///
    /// Returns false if the handle is stale.
    pub fn alias(&mut self, name: impl Into<String>, handle: K) -> bool {
        if !self.items.contains_key(handle) {
            return false;
        }
        let name = name.into();
        if self.names.get(&name).is_some_and(|&existing| existing != handle) {
            self.remove(&name);
        }
        self.names.insert(name, handle);
        true
    }

    /// Look up a handle by name
    pub fn find(&self, name: &str) -> Option<K> {
        self.names.get(name).copied()
    }

    /// Reverse lookup: the alphabetically first name bound to a handle
    pub fn query_name(&self, handle: K) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, &bound)| bound == handle)
            .map(|(name, _)| name.as_str())
    }

    /// Get a value by handle
    pub fn get(&self, handle: K) -> Option<&T> {
        self.items.get(handle)
    }

    /// Get a mutable value by handle
    pub fn get_mut(&mut self, handle: K) -> Option<&mut T> {
        self.items.get_mut(handle)
    }

    /// Get a value by name
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.find(name).and_then(|handle| self.items.get(handle))
    }

    /// Get a mutable value by name
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut T> {
        let handle = self.find(name)?;
        self.items.get_mut(handle)
    }

    /// Remove a name
    ///
    /// The value itself is removed and returned when this was its last name.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let handle = self.names.remove(name)?;
        if self.names.values().any(|&bound| bound == handle) {
            None
        } else {
            self.items.remove(handle)
        }
    }

    /// Whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry holds no values
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over `(name, handle)` pairs in name order
    pub fn names(&self) -> impl Iterator<Item = (&str, K)> {
        self.names.iter().map(|(name, &handle)| (name.as_str(), handle))
    }

    /// Iterate over all values with their handles
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.items.iter()
    }

    /// Iterate mutably over all values with their handles
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.items.iter_mut()
    }

    /// Drop every value and name
    pub fn clear(&mut self) {
        self.names.clear();
        self.items.clear();
    }
}

impl<K: Key, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    new_key_type! {
        struct TestKey;
    }

    #[test]
    fn test_add_and_find() {
        let mut registry: Registry<TestKey, u32> = Registry::new();
        let handle = registry.add("first", 1);

        assert_eq!(registry.find("first"), Some(handle));
        assert_eq!(registry.get(handle), Some(&1));
        assert_eq!(registry.get_by_name("missing"), None);
    }

    #[test]
    fn test_query_name_prefers_alphabetical_alias() {
        let mut registry: Registry<TestKey, u32> = Registry::new();
        let handle = registry.add("zeta", 7);
        assert!(registry.alias("alpha", handle));

        assert_eq!(registry.query_name(handle), Some("alpha"));
    }

    #[test]
    fn test_replacing_name_drops_old_value() {
        let mut registry: Registry<TestKey, u32> = Registry::new();
        let old = registry.add("thing", 1);
        let new = registry.add("thing", 2);

        assert_ne!(old, new);
        assert_eq!(registry.get(old), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_keeps_value_while_aliased() {
        let mut registry: Registry<TestKey, u32> = Registry::new();
        let handle = registry.add("a", 3);
        registry.alias("b", handle);

        assert_eq!(registry.remove("a"), None);
        assert_eq!(registry.get(handle), Some(&3));
        assert_eq!(registry.remove("b"), Some(3));
        assert!(registry.is_empty());
    }
}
