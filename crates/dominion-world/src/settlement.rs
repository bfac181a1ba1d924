//! Settlements and the structures they hold.
//!
//! A [`Settlement`] owns its structures in construction order (standing
//! buildings and upgrades in progress side by side) plus the per-settlement
//! availability cache the oracle fills lazily. Ownership by a dominion is
//! tracked one level up; the settlement itself is owner-agnostic so it can
//! change hands without being rebuilt.

use std::cell::RefCell;

use dominion_types::{SettlementId, StructureId};

use crate::availability::AvailabilityCache;
use crate::catalog::Catalog;
use crate::error::WorldError;
use crate::structure::Structure;

/// A settlement and its buildings.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// Unique settlement ID.
    pub id: SettlementId,
    /// Display name.
    pub name: String,
    structures: Vec<Structure>,
    availability: RefCell<AvailabilityCache>,
}

impl Settlement {
    /// Create an empty settlement with a fresh ID.
    pub fn new(name: &str) -> Self {
        Self::with_id(SettlementId::new(), name)
    }

    /// Create an empty settlement with a known ID.
    pub fn with_id(id: SettlementId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            structures: Vec::new(),
            availability: RefCell::new(AvailabilityCache::default()),
        }
    }

    /// All structures in construction order.
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    /// Iterate mutably over all structures.
    pub fn structures_mut(&mut self) -> impl Iterator<Item = &mut Structure> {
        self.structures.iter_mut()
    }

    /// Look up a structure by ID.
    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    /// Look up a structure by ID for mutation.
    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == id)
    }

    /// Whether the settlement holds the structure.
    pub fn contains(&self, id: StructureId) -> bool {
        self.structures.iter().any(|s| s.id == id)
    }

    /// Place a structure and return its ID.
    pub fn add_structure(&mut self, structure: Structure) -> StructureId {
        let id = structure.id;
        self.structures.push(structure);
        id
    }

    /// Finish construction of a structure.
    ///
    /// Completing an upgrade removes the structure it replaces, which is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StructureNotFound`] if the structure is not in
    /// this settlement, or [`WorldError::AlreadyCompleted`] if it already
    /// stands.
    pub fn complete_structure(&mut self, id: StructureId) -> Result<Option<Structure>, WorldError> {
        let structure = self
            .structure_mut(id)
            .ok_or(WorldError::StructureNotFound(id))?;
        if structure.completed {
            return Err(WorldError::AlreadyCompleted(id));
        }
        let replaced = structure.replaces;
        structure.complete();

        Ok(replaced.and_then(|base| self.take(base)))
    }

    /// Remove a structure, along with any upgrade in progress that would
    /// have replaced it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StructureNotFound`] if the structure is not in
    /// this settlement.
    pub fn remove_structure(&mut self, id: StructureId) -> Result<Structure, WorldError> {
        let removed = self.take(id).ok_or(WorldError::StructureNotFound(id))?;
        self.structures.retain(|s| s.replaces != Some(id));
        Ok(removed)
    }

    /// Start building `upgrade` on top of a standing structure.
    ///
    /// The base keeps working until the upgrade completes.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownDefinition`] if `upgrade` is not in the
    /// catalog, [`WorldError::StructureNotFound`] if the base is not here,
    /// [`WorldError::UnderConstruction`] if the base is not finished, or
    /// [`WorldError::NotAnUpgrade`] if `upgrade` does not upgrade the base's
    /// definition.
    pub fn begin_upgrade(
        &mut self,
        catalog: &Catalog,
        base: StructureId,
        upgrade: &str,
    ) -> Result<StructureId, WorldError> {
        let definition = catalog.require_structure(upgrade)?;
        let current = self
            .structure(base)
            .ok_or(WorldError::StructureNotFound(base))?;
        if !current.completed {
            return Err(WorldError::UnderConstruction(base));
        }
        if definition.upgrade_of.as_deref() != Some(current.definition.as_str()) {
            return Err(WorldError::NotAnUpgrade {
                base: current.definition.clone(),
                upgrade: upgrade.to_owned(),
            });
        }
        Ok(self.add_structure(Structure::upgrade(definition, base)))
    }

    /// Find a structure of `definition` or any upgrade variant of it,
    /// preferring one that has been completed.
    pub fn find_variant(&self, catalog: &Catalog, definition: &str) -> Option<&Structure> {
        let mut candidates = self
            .structures
            .iter()
            .filter(|s| catalog.is_variant_of(&s.definition, definition));
        let first = candidates.next()?;
        if first.completed {
            return Some(first);
        }
        candidates.find(|s| s.completed).or(Some(first))
    }

    /// The settlement's availability cache.
    pub const fn availability_cache(&self) -> &RefCell<AvailabilityCache> {
        &self.availability
    }

    fn take(&mut self, id: StructureId) -> Option<Structure> {
        let index = self.structures.iter().position(|s| s.id == id)?;
        Some(self.structures.remove(index))
    }
}
