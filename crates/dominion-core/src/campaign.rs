//! The campaign: every dominion, the shared catalog, and the batch.
//!
//! [`Campaign`] is the entry point for mutations. Each mutation bumps the
//! affected dominion's availability version and asks for a recalculation;
//! outside a batch that recalculation runs at once, inside one it waits for
//! the outermost [`BatchScope`] to drop.

use std::collections::BTreeMap;
use std::rc::Rc;

use dominion_types::{DominionId, Importer, ImporterId, Scope, SettlementId, StructureId};
use dominion_world::{
    AvailabilityRecord, Catalog, PrerequisiteStatus, RealmConditions, Settlement,
    StaticConditions, Structure, Target, WorldError,
};
use tracing::{debug, info, warn};

use crate::arbiter::{EliminationArbiter, EndGameArbiter, EndGameOutcome};
use crate::batch::{
    BatchCoordinator, BatchHost, BatchScope, Disposition, PendingValidation, RecalcRequest,
};
use crate::config::EngineConfig;
use crate::dominion::{Dominion, RecalcPolicy, RecalcReport};
use crate::error::CampaignError;
use crate::notify::{ChangeNotification, Outbox};

/// How the game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conclusion {
    /// The winning dominion.
    pub winner: DominionId,
    /// The losing dominion.
    pub loser: DominionId,
    /// Name of the arbiter that decided.
    pub arbiter: String,
    /// Why the game ended.
    pub reason: String,
}

/// All dominions of one game and the machinery that keeps them settled.
#[derive(Debug)]
pub struct Campaign<C: RealmConditions = StaticConditions> {
    catalog: Catalog,
    conditions: C,
    config: EngineConfig,
    dominions: BTreeMap<DominionId, Dominion>,
    owners: BTreeMap<SettlementId, DominionId>,
    batch: BatchCoordinator,
    outbox: Outbox,
    conclusion: Option<Conclusion>,
}

impl<C: RealmConditions> Campaign<C> {
    /// Create an empty campaign. Catalog problems are logged, not fatal.
    pub fn new(catalog: Catalog, conditions: C, config: EngineConfig) -> Self {
        for finding in catalog.validate() {
            warn!(%finding, "catalog validation");
        }
        Self {
            catalog,
            conditions,
            config,
            dominions: BTreeMap::new(),
            owners: BTreeMap::new(),
            batch: BatchCoordinator::new(),
            outbox: Outbox::new(),
            conclusion: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The shared definition catalog.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The external game conditions.
    pub const fn conditions(&self) -> &C {
        &self.conditions
    }

    /// The external game conditions, for mutation.
    ///
    /// The engine does not watch conditions; call
    /// [`Campaign::conditions_changed`] afterwards, or use
    /// [`Campaign::update_conditions`].
    pub const fn conditions_mut(&mut self) -> &mut C {
        &mut self.conditions
    }

    /// The engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All dominions, by ID.
    pub const fn dominions(&self) -> &BTreeMap<DominionId, Dominion> {
        &self.dominions
    }

    /// Look up a dominion.
    pub fn dominion(&self, id: DominionId) -> Option<&Dominion> {
        self.dominions.get(&id)
    }

    /// Look up a dominion by display name.
    pub fn dominion_named(&self, name: &str) -> Option<&Dominion> {
        self.dominions.values().find(|d| d.name == name)
    }

    /// The dominion that owns a settlement.
    pub fn owner_of(&self, settlement: SettlementId) -> Option<DominionId> {
        self.owners.get(&settlement).copied()
    }

    /// Look up a settlement in whichever dominion owns it.
    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        let owner = self.owners.get(&id)?;
        self.dominions.get(owner)?.settlement(id)
    }

    /// Look up a structure anywhere in the campaign.
    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.dominions
            .values()
            .find_map(|d| d.structure(id).map(|(_, s)| s))
    }

    /// The batch coordinator.
    pub const fn batch_state(&self) -> &BatchCoordinator {
        &self.batch
    }

    /// How the game ended, if it has.
    pub const fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    /// Notifications published since the last drain.
    pub fn pending_notifications(&self) -> &[ChangeNotification] {
        self.outbox.pending()
    }

    /// Take every pending notification.
    pub fn drain_notifications(&mut self) -> Vec<ChangeNotification> {
        self.outbox.drain()
    }

    // -----------------------------------------------------------------------
    // Batching
    // -----------------------------------------------------------------------

    /// Open (or nest into) a batch. Recalculations and end-game validations
    /// requested through the returned scope run once when the outermost
    /// scope drops.
    pub fn batch(&mut self, reason: &str) -> BatchScope<'_, Self> {
        BatchScope::acquire(self, reason)
    }

    /// Recalculate every dominion, coalesced into one batch.
    pub fn recalculate_all(&mut self) {
        let ids: Vec<DominionId> = self.dominions.keys().copied().collect();
        let mut scope = self.batch("recalculate all");
        for id in ids {
            scope.schedule(id, &RecalcRequest::default());
        }
    }

    /// Ask for a full recalculation of a dominion.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion.
    pub fn request_recalculation(
        &mut self,
        dominion: DominionId,
        request: RecalcRequest,
    ) -> Result<Disposition, CampaignError> {
        self.require_dominion(dominion)?;
        Ok(self.schedule(dominion, &request))
    }

    /// Ask an arbiter whether the game ended between two dominions.
    ///
    /// Inside a batch the check waits until every recalculation has run.
    pub fn request_end_game_validation(
        &mut self,
        winner: DominionId,
        loser: DominionId,
        arbiter: Rc<dyn EndGameArbiter>,
    ) -> Disposition {
        let disposition = self
            .batch
            .request_validation(winner, loser, Rc::clone(&arbiter));
        if disposition == Disposition::RunNow {
            self.run_validation(&PendingValidation {
                winner,
                loser,
                arbiter,
            });
        }
        disposition
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Found a new dominion.
    pub fn add_dominion(&mut self, name: &str) -> DominionId {
        let dominion = Dominion::new(name);
        let id = dominion.id;
        self.dominions.insert(id, dominion);
        debug!(%id, name, "dominion added");
        id
    }

    /// Found a settlement in a dominion.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion.
    pub fn add_settlement(
        &mut self,
        dominion: DominionId,
        name: &str,
    ) -> Result<SettlementId, CampaignError> {
        let id = self
            .dominion_mut(dominion)?
            .add_settlement(Settlement::new(name));
        self.owners.insert(id, dominion);
        self.mutated(dominion, Some(id));
        Ok(id)
    }

    /// Place a structure in a settlement, either planned or already built.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::SettlementNotFound`] for an unknown
    /// settlement, or [`CampaignError::World`] for an unknown definition.
    pub fn add_structure(
        &mut self,
        settlement: SettlementId,
        definition: &str,
        completed: bool,
    ) -> Result<StructureId, CampaignError> {
        let def = self.catalog.require_structure(definition)?;
        let structure = if completed {
            Structure::completed(def)
        } else {
            Structure::planned(def)
        };
        let (dominion, target) = self.settlement_mut(settlement)?;
        let id = target.add_structure(structure);
        self.mutated(dominion, Some(settlement));
        Ok(id)
    }

    /// Finish construction of a structure. A finished upgrade replaces its
    /// base, which is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::World`] if the structure does not exist or
    /// is already completed.
    pub fn complete_structure(
        &mut self,
        structure: StructureId,
    ) -> Result<Option<Structure>, CampaignError> {
        let (dominion, settlement) = self.locate(structure)?;
        let replaced = self
            .settlement_mut(settlement)?
            .1
            .complete_structure(structure)?;
        self.mutated(dominion, Some(settlement));
        Ok(replaced)
    }

    /// Demolish a structure.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::World`] if the structure does not exist.
    pub fn remove_structure(&mut self, structure: StructureId) -> Result<Structure, CampaignError> {
        let (dominion, settlement) = self.locate(structure)?;
        let removed = self
            .settlement_mut(settlement)?
            .1
            .remove_structure(structure)?;
        self.mutated(dominion, Some(settlement));
        Ok(removed)
    }

    /// Start building `upgrade` on top of a finished structure.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::World`] if the base does not exist, is not
    /// finished, or `upgrade` is not one of its upgrades.
    pub fn begin_upgrade(
        &mut self,
        base: StructureId,
        upgrade: &str,
    ) -> Result<StructureId, CampaignError> {
        let (dominion, settlement) = self.locate(base)?;
        let catalog = &self.catalog;
        let id = self
            .dominions
            .get_mut(&dominion)
            .and_then(|d| d.settlement_mut(settlement))
            .ok_or(CampaignError::SettlementNotFound(settlement))?
            .begin_upgrade(catalog, base, upgrade)?;
        self.mutated(dominion, Some(settlement));
        Ok(id)
    }

    /// Allow a dominion to build an upgrade definition. Returns `false` if
    /// it was already unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::NotAnUpgradeDefinition`] for a definition
    /// that upgrades nothing, [`CampaignError::World`] for an unknown one.
    pub fn unlock_upgrade(
        &mut self,
        dominion: DominionId,
        definition: &str,
    ) -> Result<bool, CampaignError> {
        if !self.catalog.require_structure(definition)?.is_upgrade() {
            return Err(CampaignError::NotAnUpgradeDefinition(definition.to_owned()));
        }
        let unlocked = self.dominion_mut(dominion)?.unlock_upgrade(definition);
        if unlocked {
            self.mutated(dominion, None);
        }
        Ok(unlocked)
    }

    /// Open a trade import of one unit of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion.
    pub fn add_importer(
        &mut self,
        dominion: DominionId,
        resource: &str,
    ) -> Result<ImporterId, CampaignError> {
        let id = self
            .dominion_mut(dominion)?
            .add_importer(Importer::new(resource));
        self.mutated(dominion, None);
        Ok(id)
    }

    /// Switch a trade import on or off.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::ImporterNotFound`] if the dominion has no
    /// such importer.
    pub fn set_importer_active(
        &mut self,
        dominion: DominionId,
        importer: ImporterId,
        active: bool,
    ) -> Result<(), CampaignError> {
        if !self
            .dominion_mut(dominion)?
            .set_importer_active(importer, active)
        {
            return Err(CampaignError::ImporterNotFound { dominion, importer });
        }
        self.mutated(dominion, None);
        Ok(())
    }

    /// Close a trade import.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::ImporterNotFound`] if the dominion has no
    /// such importer.
    pub fn remove_importer(
        &mut self,
        dominion: DominionId,
        importer: ImporterId,
    ) -> Result<Importer, CampaignError> {
        let removed = self
            .dominion_mut(dominion)?
            .remove_importer(importer)
            .ok_or(CampaignError::ImporterNotFound { dominion, importer })?;
        self.mutated(dominion, None);
        Ok(removed)
    }

    /// Hand a settlement to another dominion.
    ///
    /// Both dominions are recalculated once the transfer settles, then the
    /// elimination arbiter checks whether the previous owner is out.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::SettlementNotFound`] for an unknown
    /// settlement, [`CampaignError::DominionNotFound`] for an unknown
    /// recipient, or [`CampaignError::SameOwner`] if the recipient already
    /// owns it.
    pub fn transfer_settlement(
        &mut self,
        settlement: SettlementId,
        to: DominionId,
    ) -> Result<(), CampaignError> {
        let from = self
            .owner_of(settlement)
            .ok_or(CampaignError::SettlementNotFound(settlement))?;
        self.require_dominion(to)?;
        if from == to {
            return Err(CampaignError::SameOwner {
                settlement,
                dominion: to,
            });
        }

        let mut scope = self.batch("settlement transfer");
        let moved = scope
            .dominion_mut(from)?
            .take_settlement(settlement)
            .ok_or(CampaignError::SettlementNotFound(settlement))?;
        scope.dominion_mut(to)?.add_settlement(moved);
        scope.owners.insert(settlement, to);
        info!(%settlement, %from, %to, "settlement transferred");

        scope.mutated(from, None);
        scope.mutated(to, Some(settlement));
        scope.request_end_game_validation(to, from, Rc::new(EliminationArbiter));
        Ok(())
    }

    /// Change conditions and recalculate the affected dominion.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion.
    pub fn update_conditions<F>(
        &mut self,
        dominion: DominionId,
        update: F,
    ) -> Result<(), CampaignError>
    where
        F: FnOnce(&mut C),
    {
        self.require_dominion(dominion)?;
        update(&mut self.conditions);
        self.conditions_changed(dominion)
    }

    /// Report that external conditions affecting a dominion changed.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion.
    pub fn conditions_changed(&mut self, dominion: DominionId) -> Result<(), CampaignError> {
        self.require_dominion(dominion)?;
        self.mutated(dominion, None);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// How reachable a resource or structure is for a dominion.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion,
    /// or [`CampaignError::SettlementNotFound`] if a settlement scope names
    /// a settlement the dominion does not own.
    pub fn availability(
        &self,
        dominion: DominionId,
        scope: Scope,
        target: &Target,
    ) -> Result<AvailabilityRecord, CampaignError> {
        let owner = self.require_dominion(dominion)?;
        owner
            .oracle(&self.catalog, &self.conditions)
            .query(scope, target)
            .ok_or_else(|| match scope {
                Scope::Settlement(id) => CampaignError::SettlementNotFound(id),
                Scope::Dominion => CampaignError::DominionNotFound(dominion),
            })
    }

    /// Per-prerequisite availability of a structure definition.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignError::DominionNotFound`] for an unknown dominion,
    /// or [`CampaignError::SettlementNotFound`] if a settlement scope names
    /// a settlement the dominion does not own.
    pub fn requirement_breakdown(
        &self,
        dominion: DominionId,
        scope: Scope,
        definition: &str,
    ) -> Result<Vec<PrerequisiteStatus>, CampaignError> {
        let owner = self.require_dominion(dominion)?;
        if let Scope::Settlement(id) = scope {
            if owner.settlement(id).is_none() {
                return Err(CampaignError::SettlementNotFound(id));
            }
        }
        Ok(owner
            .oracle(&self.catalog, &self.conditions)
            .requirement_breakdown(scope, definition))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require_dominion(&self, id: DominionId) -> Result<&Dominion, CampaignError> {
        self.dominions
            .get(&id)
            .ok_or(CampaignError::DominionNotFound(id))
    }

    fn dominion_mut(&mut self, id: DominionId) -> Result<&mut Dominion, CampaignError> {
        self.dominions
            .get_mut(&id)
            .ok_or(CampaignError::DominionNotFound(id))
    }

    fn settlement_mut(
        &mut self,
        id: SettlementId,
    ) -> Result<(DominionId, &mut Settlement), CampaignError> {
        let owner = self
            .owner_of(id)
            .ok_or(CampaignError::SettlementNotFound(id))?;
        let settlement = self
            .dominions
            .get_mut(&owner)
            .and_then(|d| d.settlement_mut(id))
            .ok_or(CampaignError::SettlementNotFound(id))?;
        Ok((owner, settlement))
    }

    fn locate(&self, structure: StructureId) -> Result<(DominionId, SettlementId), CampaignError> {
        self.dominions
            .values()
            .find_map(|d| d.structure(structure).map(|(s, _)| (d.id, s.id)))
            .ok_or(CampaignError::World(WorldError::StructureNotFound(structure)))
    }

    /// Invalidate cached answers for a dominion and ask for a recalculation.
    fn mutated(&mut self, dominion: DominionId, origin: Option<SettlementId>) {
        let Some(owner) = self.dominions.get_mut(&dominion) else {
            return;
        };
        let version = owner.invalidate_availability();
        self.outbox
            .publish(ChangeNotification::AvailabilityInvalidated { dominion, version });
        if let Some(settlement) = origin {
            self.outbox
                .publish(ChangeNotification::RebellionRiskRefresh { settlement });
        }
        self.schedule(dominion, &RecalcRequest::default());
    }

    /// Hand a request to the coordinator and run it if it cannot wait.
    fn schedule(&mut self, dominion: DominionId, request: &RecalcRequest) -> Disposition {
        let disposition = self.batch.request_recalculation(dominion, request);
        if disposition == Disposition::RunNow {
            self.run_recalculation(dominion, request);
        }
        disposition
    }

    fn run_recalculation(&mut self, dominion: DominionId, request: &RecalcRequest) {
        let policy = RecalcPolicy {
            remove_abandoned: request
                .remove_abandoned
                .unwrap_or(self.config.recalculation.remove_abandoned),
            max_followup_passes: self.config.recalculation.max_followup_passes,
        };
        let Some(owner) = self.dominions.get_mut(&dominion) else {
            warn!(%dominion, "recalculation requested for a dominion that no longer exists");
            return;
        };
        let report = owner.full_recalculation(&self.catalog, &self.conditions, &policy);
        let version = owner.availability_version();
        self.publish_report(dominion, version, request.origin, report);
    }

    fn publish_report(
        &mut self,
        dominion: DominionId,
        version: u64,
        origin: Option<SettlementId>,
        report: RecalcReport,
    ) {
        let mut touched: Vec<SettlementId> =
            report.transitions.iter().map(|t| t.settlement).collect();
        touched.extend(origin);
        touched.sort_unstable();
        touched.dedup();

        if report.structures_changed() {
            self.outbox.publish(ChangeNotification::StructuresChanged {
                dominion,
                transitions: report.transitions,
                removed: report.removed,
                reverted: report.reverted,
            });
        }
        if report.missing_changed {
            self.outbox
                .publish(ChangeNotification::MissingResourcesChanged { dominion });
        }
        if report.availability_invalidated {
            self.outbox
                .publish(ChangeNotification::AvailabilityInvalidated { dominion, version });
        }
        for settlement in touched {
            self.outbox
                .publish(ChangeNotification::RebellionRiskRefresh { settlement });
        }
    }

    /// Run one validation. Returns `true` if the game is over.
    fn run_validation(&mut self, validation: &PendingValidation) -> bool {
        if self.conclusion.is_some() {
            debug!(
                arbiter = validation.arbiter.name(),
                "game already concluded, skipping validation"
            );
            return true;
        }
        match validation
            .arbiter
            .validate(validation.winner, validation.loser, &self.dominions)
        {
            EndGameOutcome::Continue => false,
            EndGameOutcome::Concluded { reason } => {
                info!(
                    winner = %validation.winner,
                    loser = %validation.loser,
                    arbiter = validation.arbiter.name(),
                    %reason,
                    "game concluded"
                );
                self.outbox.publish(ChangeNotification::GameConcluded {
                    winner: validation.winner,
                    loser: validation.loser,
                    reason: reason.clone(),
                });
                self.conclusion = Some(Conclusion {
                    winner: validation.winner,
                    loser: validation.loser,
                    arbiter: validation.arbiter.name().to_owned(),
                    reason,
                });
                true
            }
        }
    }
}

impl<C: RealmConditions> BatchHost for Campaign<C> {
    fn coordinator(&mut self) -> &mut BatchCoordinator {
        &mut self.batch
    }

    fn flush_batch(&mut self) {
        let max_rounds = self.config.batch.max_flush_rounds.max(1);
        let mut rounds = 0_u32;
        while self.batch.has_pending() {
            if rounds >= max_rounds {
                let leftover = self.batch.take_pending();
                warn!(
                    rounds,
                    recalculations = leftover.recalculations.len(),
                    validations = leftover.validations.len(),
                    "batch flush did not settle, dropping leftover requests"
                );
                break;
            }
            rounds = rounds.saturating_add(1);
            let pending = self.batch.take_pending();
            debug!(
                round = rounds,
                recalculations = pending.recalculations.len(),
                validations = pending.validations.len(),
                "flushing batch"
            );
            for dominion in pending.recalculations {
                self.run_recalculation(dominion, &RecalcRequest::default());
            }
            for validation in &pending.validations {
                if self.run_validation(validation) {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{
        Availability, Requirement, ResourceYield, StructureDefinition, StructureState,
    };

    use super::*;

    fn catalog() -> Catalog {
        let mut mine = StructureDefinition::new("iron_mine");
        mine.produces.push(ResourceYield::new("iron", 1));
        let mut smithy = StructureDefinition::new("smithy");
        smithy.bonus_requires.push(Requirement::resource("iron", 1));
        Catalog::new(vec![mine, smithy], Vec::new())
    }

    fn campaign() -> Campaign {
        Campaign::new(catalog(), StaticConditions::new(), EngineConfig::default())
    }

    #[test]
    fn mutation_outside_batch_recalculates_immediately() {
        let mut campaign = campaign();
        let aldmark = campaign.add_dominion("Aldmark");
        let harrowgate = campaign.add_settlement(aldmark, "Harrowgate").unwrap();
        let before = campaign.dominion(aldmark).unwrap().recalculation_count();

        let mine = campaign.add_structure(harrowgate, "iron_mine", true).unwrap();
        assert_eq!(campaign.structure(mine).unwrap().state, StructureState::Working);
        assert_eq!(
            campaign.dominion(aldmark).unwrap().recalculation_count(),
            before + 1
        );
    }

    #[test]
    fn mutations_inside_batch_recalculate_once() {
        let mut campaign = campaign();
        let aldmark = campaign.add_dominion("Aldmark");
        let harrowgate = campaign.add_settlement(aldmark, "Harrowgate").unwrap();
        let before = campaign.dominion(aldmark).unwrap().recalculation_count();
        {
            let mut scope = campaign.batch("test");
            scope.add_structure(harrowgate, "iron_mine", true).unwrap();
            scope.add_structure(harrowgate, "smithy", true).unwrap();
            scope.add_importer(aldmark, "salt").unwrap();
            assert_eq!(scope.dominion(aldmark).unwrap().recalculation_count(), before);
        }
        assert_eq!(
            campaign.dominion(aldmark).unwrap().recalculation_count(),
            before + 1
        );
        assert_eq!(campaign.batch_state().depth(), 0);
    }

    #[test]
    fn unlocking_requires_an_upgrade_definition() {
        let mut campaign = campaign();
        let aldmark = campaign.add_dominion("Aldmark");
        assert!(matches!(
            campaign.unlock_upgrade(aldmark, "smithy"),
            Err(CampaignError::NotAnUpgradeDefinition(_))
        ));
        assert!(matches!(
            campaign.unlock_upgrade(aldmark, "nothing"),
            Err(CampaignError::World(WorldError::UnknownDefinition(_)))
        ));
    }

    #[test]
    fn importer_errors_name_the_importer() {
        let mut campaign = campaign();
        let aldmark = campaign.add_dominion("Aldmark");
        let importer = ImporterId::new();
        assert!(matches!(
            campaign.remove_importer(aldmark, importer),
            Err(CampaignError::ImporterNotFound { .. })
        ));
    }

    #[test]
    fn availability_query_rejects_foreign_settlement() {
        let mut campaign = campaign();
        let aldmark = campaign.add_dominion("Aldmark");
        let veyra = campaign.add_dominion("Veyra");
        let eastmarch = campaign.add_settlement(veyra, "Eastmarch").unwrap();
        let target = Target::Resource(String::from("iron"));

        assert!(matches!(
            campaign.availability(aldmark, Scope::Settlement(eastmarch), &target),
            Err(CampaignError::SettlementNotFound(_))
        ));
        let record = campaign
            .availability(veyra, Scope::Settlement(eastmarch), &target)
            .unwrap();
        assert_eq!(record.availability, Availability::DirectlyObtainable);
    }

    #[test]
    fn transfer_to_same_owner_is_rejected() {
        let mut campaign = campaign();
        let aldmark = campaign.add_dominion("Aldmark");
        let harrowgate = campaign.add_settlement(aldmark, "Harrowgate").unwrap();
        assert!(matches!(
            campaign.transfer_settlement(harrowgate, aldmark),
            Err(CampaignError::SameOwner { .. })
        ));
    }
}
