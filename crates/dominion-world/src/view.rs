//! Read-only view of one dominion's holdings.
//!
//! The evaluator and the availability oracle never touch the dominion
//! struct that owns the data. They borrow a [`DominionView`] instead, which
//! bundles everything a graph walk reads: the catalog, the dominion's
//! settlements, its unlocked upgrades and importers, and the realm
//! conditions supplied by collaborating subsystems.

use std::collections::BTreeSet;

use dominion_types::{DominionId, Importer, Requirement, SettlementId, StructureDefinition};

use crate::catalog::Catalog;
use crate::conditions::RealmConditions;
use crate::settlement::Settlement;

/// Borrowed snapshot of a dominion for one evaluation.
#[derive(Clone, Copy)]
pub struct DominionView<'a> {
    /// The dominion being evaluated.
    pub dominion: DominionId,
    /// Content definitions.
    pub catalog: &'a Catalog,
    /// Settlements the dominion owns.
    pub settlements: &'a [Settlement],
    /// Upgrade definitions the dominion may build.
    pub unlocked_upgrades: &'a BTreeSet<String>,
    /// Trade links delivering resources to the dominion.
    pub importers: &'a [Importer],
    /// Occupation, disorder, religion and citadel predicates.
    pub conditions: &'a dyn RealmConditions,
}

impl core::fmt::Debug for DominionView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DominionView")
            .field("dominion", &self.dominion)
            .field("settlements", &self.settlements.len())
            .field("unlocked_upgrades", &self.unlocked_upgrades)
            .field("importers", &self.importers.len())
            .finish_non_exhaustive()
    }
}

impl<'a> DominionView<'a> {
    /// Look up a settlement by ID.
    pub fn settlement(&self, id: SettlementId) -> Option<&'a Settlement> {
        self.settlements.iter().find(|s| s.id == id)
    }

    /// Whether the dominion may build `definition`.
    ///
    /// Base definitions are always allowed; upgrades need an unlock.
    pub fn is_unlocked(&self, definition: &StructureDefinition) -> bool {
        !definition.is_upgrade() || self.unlocked_upgrades.contains(&definition.id)
    }

    /// Number of active importers delivering `resource`.
    pub fn active_imports(&self, resource: &str) -> usize {
        self.importers
            .iter()
            .filter(|i| i.active && i.resource == resource)
            .count()
    }

    /// Check a non-resource requirement against the realm predicates.
    ///
    /// Resource requirements are reported as satisfied here; they are
    /// decided by the producer registry or the availability oracle.
    pub fn predicate_holds(&self, settlement: SettlementId, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::Religion { tag } => self.conditions.has_religion_tag(self.dominion, tag),
            Requirement::Citadel => self.conditions.has_citadel(settlement),
            Requirement::Resource { .. } | Requirement::Unrecognized => true,
        }
    }

    /// Whether a transient blocker (occupation or disorder) applies.
    pub fn is_disrupted(&self, settlement: SettlementId) -> bool {
        self.conditions.is_occupied(settlement) || self.conditions.is_in_disorder(settlement)
    }
}
