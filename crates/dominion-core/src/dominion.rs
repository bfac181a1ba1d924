//! The dominion: a political entity and the orchestration of its holdings.
//!
//! A [`Dominion`] owns settlements, the upgrades it has unlocked, its trade
//! importers, the missing-resource index and the dominion-scope
//! availability cache. [`Dominion::full_recalculation`] ties the world
//! crate's pieces together:
//!
//! 1. evaluate every structure against a fresh pass context,
//! 2. finalize verdicts into persisted state (removing or reverting
//!    abandoned upgrades when the policy says so),
//! 3. repeat while finalization reverted upgrades, up to a bound,
//! 4. sweep and update the missing-resource index,
//! 5. bump the availability version if the built set changed.

use std::cell::RefCell;
use std::collections::BTreeSet;

use dominion_types::{
    DominionId, Importer, ImporterId, SettlementId, StructureId, StructureState, Verdict,
};
use dominion_world::{
    AvailabilityCache, AvailabilityOracle, Catalog, DominionView, MissingResourceIndex,
    PassOutcome, RealmConditions, Settlement, Structure, StructureEvaluator,
};
use tracing::{debug, warn};

use crate::notify::StateTransition;

/// How finalization treats abandoned structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalcPolicy {
    /// Destroy unfinished abandoned upgrades and revert finished ones.
    pub remove_abandoned: bool,
    /// Bound on extra passes after reverts.
    pub max_followup_passes: u32,
}

impl Default for RecalcPolicy {
    fn default() -> Self {
        Self {
            remove_abandoned: true,
            max_followup_passes: 8,
        }
    }
}

/// What one full recalculation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcReport {
    /// Evaluation passes run (one plus follow-ups).
    pub passes: u32,
    /// Persisted state changes, in the order applied.
    pub transitions: Vec<StateTransition>,
    /// Unfinished upgrades destroyed.
    pub removed: Vec<StructureId>,
    /// Finished upgrades reverted to their base.
    pub reverted: Vec<StructureId>,
    /// Whether the missing-resource index changed.
    pub missing_changed: bool,
    /// Whether the availability version was bumped.
    pub availability_invalidated: bool,
    /// Cyclic reads detected across all passes.
    pub cycles: u32,
}

impl RecalcReport {
    /// Whether any structure changed state or was removed.
    pub fn structures_changed(&self) -> bool {
        !self.transitions.is_empty() || !self.removed.is_empty() || !self.reverted.is_empty()
    }
}

/// A political entity and everything it owns.
#[derive(Debug, Clone)]
pub struct Dominion {
    /// Unique dominion ID.
    pub id: DominionId,
    /// Display name.
    pub name: String,
    settlements: Vec<Settlement>,
    unlocked_upgrades: BTreeSet<String>,
    importers: Vec<Importer>,
    missing: MissingResourceIndex,
    availability_version: u64,
    availability: RefCell<AvailabilityCache>,
    recalculations: u64,
}

impl Dominion {
    /// Create a dominion with a fresh ID and no holdings.
    pub fn new(name: &str) -> Self {
        Self::with_id(DominionId::new(), name)
    }

    /// Create a dominion with a known ID and no holdings.
    pub fn with_id(id: DominionId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            settlements: Vec::new(),
            unlocked_upgrades: BTreeSet::new(),
            importers: Vec::new(),
            missing: MissingResourceIndex::new(),
            availability_version: 0,
            availability: RefCell::new(AvailabilityCache::default()),
            recalculations: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Holdings
    // -----------------------------------------------------------------------

    /// Owned settlements.
    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    /// Look up an owned settlement.
    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.id == id)
    }

    /// Look up an owned settlement for mutation.
    pub fn settlement_mut(&mut self, id: SettlementId) -> Option<&mut Settlement> {
        self.settlements.iter_mut().find(|s| s.id == id)
    }

    /// Take ownership of a settlement.
    ///
    /// Its availability cache is cleared since records from the previous
    /// owner carry that owner's versions.
    pub fn add_settlement(&mut self, settlement: Settlement) -> SettlementId {
        settlement.availability_cache().borrow_mut().clear();
        let id = settlement.id;
        self.settlements.push(settlement);
        id
    }

    /// Give up a settlement.
    pub fn take_settlement(&mut self, id: SettlementId) -> Option<Settlement> {
        let index = self.settlements.iter().position(|s| s.id == id)?;
        Some(self.settlements.remove(index))
    }

    /// Find a structure anywhere in the dominion.
    pub fn structure(&self, id: StructureId) -> Option<(&Settlement, &Structure)> {
        self.settlements
            .iter()
            .find_map(|s| s.structure(id).map(|structure| (s, structure)))
    }

    /// Iterate over every structure the dominion owns.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.settlements.iter().flat_map(Settlement::structures)
    }

    /// Allow building an upgrade definition. Returns `false` if it was
    /// already unlocked.
    pub fn unlock_upgrade(&mut self, definition: &str) -> bool {
        self.unlocked_upgrades.insert(definition.to_owned())
    }

    /// Unlocked upgrade definitions.
    pub const fn unlocked_upgrades(&self) -> &BTreeSet<String> {
        &self.unlocked_upgrades
    }

    /// Add a trade importer.
    pub fn add_importer(&mut self, importer: Importer) -> ImporterId {
        let id = importer.id;
        self.importers.push(importer);
        id
    }

    /// Remove a trade importer.
    pub fn remove_importer(&mut self, id: ImporterId) -> Option<Importer> {
        let index = self.importers.iter().position(|i| i.id == id)?;
        Some(self.importers.remove(index))
    }

    /// Switch an importer on or off. Returns `false` if it does not exist.
    pub fn set_importer_active(&mut self, id: ImporterId, active: bool) -> bool {
        self.importers
            .iter_mut()
            .find(|i| i.id == id)
            .map(|i| i.active = active)
            .is_some()
    }

    /// Trade importers.
    pub fn importers(&self) -> &[Importer] {
        &self.importers
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    /// The missing-resource index as of the last recalculation.
    pub const fn missing_resources(&self) -> &MissingResourceIndex {
        &self.missing
    }

    /// Current availability version.
    pub const fn availability_version(&self) -> u64 {
        self.availability_version
    }

    /// Mark every cached availability answer stale. Returns the new version.
    pub fn invalidate_availability(&mut self) -> u64 {
        self.availability_version = self.availability_version.saturating_add(1);
        self.availability_version
    }

    /// Number of full recalculations run.
    pub const fn recalculation_count(&self) -> u64 {
        self.recalculations
    }

    /// Borrow the dominion for evaluation.
    pub fn view<'a>(
        &'a self,
        catalog: &'a Catalog,
        conditions: &'a dyn RealmConditions,
    ) -> DominionView<'a> {
        DominionView {
            dominion: self.id,
            catalog,
            settlements: &self.settlements,
            unlocked_upgrades: &self.unlocked_upgrades,
            importers: &self.importers,
            conditions,
        }
    }

    /// An availability oracle reading this dominion's caches.
    pub fn oracle<'a>(
        &'a self,
        catalog: &'a Catalog,
        conditions: &'a dyn RealmConditions,
    ) -> AvailabilityOracle<'a> {
        AvailabilityOracle::new(
            self.view(catalog, conditions),
            self.availability_version,
            &self.availability,
        )
    }

    // -----------------------------------------------------------------------
    // Full recalculation
    // -----------------------------------------------------------------------

    /// Re-evaluate every structure and apply the results.
    pub fn full_recalculation(
        &mut self,
        catalog: &Catalog,
        conditions: &dyn RealmConditions,
        policy: &RecalcPolicy,
    ) -> RecalcReport {
        self.recalculations = self.recalculations.saturating_add(1);
        let built_before = self.built_set();
        let mut report = RecalcReport::default();

        let outcome = loop {
            let outcome = StructureEvaluator::new(self.view(catalog, conditions)).evaluate_all();
            report.passes = report.passes.saturating_add(1);
            report.cycles = report.cycles.saturating_add(outcome.cycles);

            let reverted = self.finalize(catalog, &outcome, policy, &mut report);
            if reverted == 0 {
                break outcome;
            }
            if report.passes > policy.max_followup_passes {
                warn!(
                    dominion = %self.id,
                    passes = report.passes,
                    "upgrade reverts did not settle within the follow-up bound"
                );
                break outcome;
            }
        };

        report.missing_changed = self.update_missing_index(&outcome);

        if self.built_set() != built_before {
            self.invalidate_availability();
            report.availability_invalidated = true;
        }

        debug!(
            dominion = %self.id,
            structures = outcome.resolutions.len(),
            changed = report.transitions.len(),
            removed = report.removed.len(),
            reverted = report.reverted.len(),
            passes = report.passes,
            "full recalculation finished"
        );
        report
    }

    /// Apply verdicts to persisted state. Returns the number of upgrades
    /// reverted, which calls for a follow-up pass.
    fn finalize(
        &mut self,
        catalog: &Catalog,
        outcome: &PassOutcome,
        policy: &RecalcPolicy,
        report: &mut RecalcReport,
    ) -> usize {
        let mut reverted = 0_usize;

        for settlement in &mut self.settlements {
            let settlement_id = settlement.id;
            let mut destroy = Vec::new();

            for structure in settlement.structures_mut() {
                let Some(resolution) = outcome.resolutions.get(&structure.id) else {
                    continue;
                };
                let definition = catalog.structure(&structure.definition);
                let level = definition.map_or(structure.applied_level, |d| d.level);
                let target = StructureState::from(resolution.verdict);
                let mut record = |from: StructureState, to: StructureState| {
                    report.transitions.push(StateTransition {
                        structure: structure.id,
                        settlement: settlement_id,
                        from,
                        to,
                    });
                };

                let upgrade_base = definition
                    .and_then(|d| d.upgrade_of.as_deref())
                    .filter(|_| {
                        resolution.verdict == Verdict::Abandoned && policy.remove_abandoned
                    });
                if let Some(base_id) = upgrade_base {
                    if !structure.completed {
                        destroy.push(structure.id);
                        continue;
                    }
                    if let Some(base) = catalog.structure(base_id) {
                        if structure.state != StructureState::Abandoned {
                            record(structure.state, StructureState::Abandoned);
                        }
                        structure.revert_to(base);
                        report.reverted.push(structure.id);
                        reverted = reverted.saturating_add(1);
                        continue;
                    }
                    warn!(
                        structure = %structure.id,
                        definition = %structure.definition,
                        base = base_id,
                        "abandoned upgrade has no base definition to revert to"
                    );
                }

                let magnitude_changed = structure.applied_level != level
                    || structure.bonus_active != resolution.bonus_active;
                if target == StructureState::Working
                    && structure.state == StructureState::Working
                    && magnitude_changed
                {
                    record(StructureState::Working, StructureState::TemporaryDeactivated);
                    record(StructureState::TemporaryDeactivated, StructureState::Working);
                } else if target != structure.state {
                    record(structure.state, target);
                    structure.state = target;
                }
                structure.applied_level = level;
                structure.bonus_active = resolution.bonus_active;
            }

            for id in destroy {
                if settlement.remove_structure(id).is_ok() {
                    report.removed.push(id);
                }
            }
        }
        reverted
    }

    /// Sweep departed structures and record the latest causes. Returns
    /// `true` if the index changed.
    fn update_missing_index(&mut self, outcome: &PassOutcome) -> bool {
        let owned: BTreeSet<StructureId> = self.structures().map(|s| s.id).collect();
        let mut changed = self
            .missing
            .retain_structures(|id| owned.contains(&id))
            > 0;

        let empty = BTreeSet::new();
        for id in owned {
            let causes = outcome
                .resolutions
                .get(&id)
                .filter(|r| r.verdict.is_blocked())
                .map_or(&empty, |r| &r.missing_resources);
            changed |= self.missing.set_causes(id, causes);
        }
        changed
    }

    /// Standing structures, for detecting built-set changes.
    fn built_set(&self) -> BTreeSet<(StructureId, String)> {
        self.structures()
            .filter(|s| s.completed)
            .map(|s| (s.id, s.definition.clone()))
            .collect()
    }
}
