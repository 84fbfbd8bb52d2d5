use crate::path::NodePath;
use crate::store::Identity;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no identity registered for {0:?}")]
    NotFound(String),
    #[error("{0:?} registered twice")]
    Duplicate(String),
}

/// Identity and path of a node in the materialized-path table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathNode {
    pub id: Identity,
    pub path: NodePath,
}

/// Exact-match map from a composed node name (`Company3_Subsystem7`) to
/// what the store assigned for it.
///
/// Generators keep one resolver per parent frame and drop it once that
/// frame's children are inserted.
#[derive(Debug)]
pub struct KeyResolver<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for KeyResolver<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> KeyResolver<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, value: V) -> Result<(), ResolveError> {
        match self.entries.entry(name.into()) {
            Entry::Occupied(entry) => Err(ResolveError::Duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Result<&V, ResolveError> {
        self.entries
            .get(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyResolver<PathNode> {
    pub fn resolve_path(&self, name: &str) -> Result<&NodePath, ResolveError> {
        self.resolve(name).map(|node| &node.path)
    }
}

/// Joins name parts from the root down: `Company3_Subsystem7_WebId2`.
pub fn compose_key(parts: &[&str]) -> String {
    parts.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exactly_what_was_registered() {
        let mut resolver = KeyResolver::new();
        resolver.register("Company1", 2).unwrap();
        resolver.register("Company2", 3).unwrap();

        assert_eq!(resolver.resolve("Company1"), Ok(&2));
        assert_eq!(resolver.resolve("Company2"), Ok(&3));
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let resolver: KeyResolver<Identity> = KeyResolver::new();
        assert!(resolver.is_empty());
        assert_eq!(
            resolver.resolve("Company1_Subsystem1"),
            Err(ResolveError::NotFound("Company1_Subsystem1".to_string()))
        );
    }

    #[test]
    fn same_label_under_different_parents_does_not_collide() {
        let mut resolver = KeyResolver::new();
        resolver
            .register(compose_key(&["Company1", "Subsystem1"]), 10)
            .unwrap();
        resolver
            .register(compose_key(&["Company2", "Subsystem1"]), 11)
            .unwrap();

        assert_eq!(resolver.resolve("Company1_Subsystem1"), Ok(&10));
        assert_eq!(resolver.resolve("Company2_Subsystem1"), Ok(&11));
        assert_eq!(
            resolver.register("Company2_Subsystem1", 12),
            Err(ResolveError::Duplicate("Company2_Subsystem1".to_string()))
        );
    }

    #[test]
    fn resolves_paths() {
        let mut resolver = KeyResolver::new();
        let path = NodePath::root(1).child(2);
        resolver
            .register(
                "Company1",
                PathNode {
                    id: 2,
                    path: path.clone(),
                },
            )
            .unwrap();

        assert_eq!(resolver.resolve_path("Company1"), Ok(&path));
        assert!(resolver.resolve_path("Company2").is_err());
    }
}
