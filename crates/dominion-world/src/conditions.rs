//! Realm conditions supplied by collaborating subsystems.
//!
//! Occupation, disorder, religion tags and citadels are decided elsewhere.
//! The engine reads them through [`RealmConditions`] as plain predicates.
//! Whoever changes one of them must ask for a recalculation afterwards;
//! the engine does not watch for changes.

use std::collections::{BTreeMap, BTreeSet};

use dominion_types::{DominionId, SettlementId};

/// Boolean predicates the evaluator consumes.
pub trait RealmConditions {
    /// Whether an enemy currently occupies the settlement.
    fn is_occupied(&self, settlement: SettlementId) -> bool;

    /// Whether the settlement is in disorder.
    fn is_in_disorder(&self, settlement: SettlementId) -> bool;

    /// Whether the dominion holds a religion tag.
    fn has_religion_tag(&self, dominion: DominionId, tag: &str) -> bool;

    /// Whether the settlement has a citadel.
    fn has_citadel(&self, settlement: SettlementId) -> bool;
}

/// Set-backed [`RealmConditions`] for tests, scenarios and tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticConditions {
    /// Occupied settlements.
    pub occupied: BTreeSet<SettlementId>,
    /// Settlements in disorder.
    pub in_disorder: BTreeSet<SettlementId>,
    /// Religion tags held per dominion.
    pub religion_tags: BTreeMap<DominionId, BTreeSet<String>>,
    /// Settlements that have a citadel.
    pub citadels: BTreeSet<SettlementId>,
}

impl StaticConditions {
    /// Create conditions where nothing is occupied, disordered or held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark or clear occupation of a settlement.
    pub fn set_occupied(&mut self, settlement: SettlementId, occupied: bool) {
        if occupied {
            self.occupied.insert(settlement);
        } else {
            self.occupied.remove(&settlement);
        }
    }

    /// Mark or clear disorder in a settlement.
    pub fn set_disorder(&mut self, settlement: SettlementId, in_disorder: bool) {
        if in_disorder {
            self.in_disorder.insert(settlement);
        } else {
            self.in_disorder.remove(&settlement);
        }
    }

    /// Grant a religion tag to a dominion.
    pub fn grant_religion_tag(&mut self, dominion: DominionId, tag: &str) {
        self.religion_tags
            .entry(dominion)
            .or_default()
            .insert(tag.to_owned());
    }

    /// Revoke a religion tag from a dominion.
    pub fn revoke_religion_tag(&mut self, dominion: DominionId, tag: &str) {
        if let Some(tags) = self.religion_tags.get_mut(&dominion) {
            tags.remove(tag);
        }
    }

    /// Give or take away a settlement's citadel.
    pub fn set_citadel(&mut self, settlement: SettlementId, present: bool) {
        if present {
            self.citadels.insert(settlement);
        } else {
            self.citadels.remove(&settlement);
        }
    }
}

impl RealmConditions for StaticConditions {
    fn is_occupied(&self, settlement: SettlementId) -> bool {
        self.occupied.contains(&settlement)
    }

    fn is_in_disorder(&self, settlement: SettlementId) -> bool {
        self.in_disorder.contains(&settlement)
    }

    fn has_religion_tag(&self, dominion: DominionId, tag: &str) -> bool {
        self.religion_tags
            .get(&dominion)
            .is_some_and(|tags| tags.contains(tag))
    }

    fn has_citadel(&self, settlement: SettlementId) -> bool {
        self.citadels.contains(&settlement)
    }
}
