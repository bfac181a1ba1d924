//! Missing-resource index.
//!
//! Maps each resource name to the structures currently blocked by its
//! shortage, and keeps the reverse mapping so a structure's entries can be
//! replaced in one step. A structure is listed under a resource only while
//! its last evaluation stalled because that resource fell short; blockers
//! of any other kind never appear here. Empty sets are pruned so
//! `structures_missing` on a satisfied resource returns nothing.

use std::collections::{BTreeMap, BTreeSet};

use dominion_types::StructureId;

/// Resource -> blocked structures, with the reverse mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingResourceIndex {
    by_resource: BTreeMap<String, BTreeSet<StructureId>>,
    by_structure: BTreeMap<StructureId, BTreeSet<String>>,
}

impl MissingResourceIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the recorded causes of `structure`.
    ///
    /// Returns `true` if the index changed.
    pub fn set_causes(&mut self, structure: StructureId, causes: &BTreeSet<String>) -> bool {
        let previous = self.by_structure.get(&structure).cloned().unwrap_or_default();
        if &previous == causes {
            return false;
        }

        for resource in previous.difference(causes) {
            self.unlink(resource, structure);
        }
        for resource in causes.difference(&previous) {
            self.by_resource
                .entry(resource.clone())
                .or_default()
                .insert(structure);
        }

        if causes.is_empty() {
            self.by_structure.remove(&structure);
        } else {
            self.by_structure.insert(structure, causes.clone());
        }
        true
    }

    /// Drop every entry for `structure`. Returns `true` if any existed.
    pub fn remove_structure(&mut self, structure: StructureId) -> bool {
        let Some(resources) = self.by_structure.remove(&structure) else {
            return false;
        };
        for resource in &resources {
            self.unlink(resource, structure);
        }
        true
    }

    /// Drop entries for every structure `keep` rejects.
    ///
    /// Returns the number of structures swept.
    pub fn retain_structures<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(StructureId) -> bool,
    {
        let stale: Vec<StructureId> = self
            .by_structure
            .keys()
            .copied()
            .filter(|&id| !keep(id))
            .collect();
        for &id in &stale {
            self.remove_structure(id);
        }
        stale.len()
    }

    /// Structures currently blocked by a shortage of `resource`.
    pub fn structures_missing(&self, resource: &str) -> Option<&BTreeSet<StructureId>> {
        self.by_resource.get(resource)
    }

    /// Resources whose shortage currently blocks `structure`.
    pub fn missing_for(&self, structure: StructureId) -> Option<&BTreeSet<String>> {
        self.by_structure.get(&structure)
    }

    /// Whether `structure` is listed under `resource`.
    pub fn contains(&self, resource: &str, structure: StructureId) -> bool {
        self.by_resource
            .get(resource)
            .is_some_and(|set| set.contains(&structure))
    }

    /// Iterate over `(resource, blocked structures)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<StructureId>)> {
        self.by_resource.iter()
    }

    /// Names of all resources something is waiting on.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.by_resource.keys().map(String::as_str)
    }

    /// Whether nothing is blocked on a resource.
    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }

    fn unlink(&mut self, resource: &str, structure: StructureId) {
        if let Some(set) = self.by_resource.get_mut(resource) {
            set.remove(&structure);
            if set.is_empty() {
                self.by_resource.remove(resource);
            }
        }
    }
}
