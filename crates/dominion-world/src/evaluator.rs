//! Structure state evaluator.
//!
//! Decides, for every structure a dominion owns, whether it is `Working`,
//! `Stalled` or `Abandoned` this pass. Evaluation of one structure may ask
//! the producer registry how much of a resource is available, which in
//! turn evaluates the producers of that resource. Two structures that each
//! need what the other makes therefore recurse into each other; both the
//! per-structure slots and the per-resource memo detect that and resolve
//! the cyclic read from the previous round instead of looping.
//!
//! A pass runs in rounds. The first round has nothing to go on, so a
//! cyclic read is `Abandoned` or contributes zero. Each later round seeds
//! cyclic reads with what the round before settled on, and the pass stops
//! once a round reproduces its seeds. Every structure reads all of its
//! inputs whatever they turn out to be, so each round walks the same
//! graph and only ever improves on the last. The result is the least
//! consistent assignment: it does not depend on the order structures are
//! visited in, and support that only runs in a circle never counts.
//!
//! All round-scoped state lives in a [`PassContext`] owned by the
//! evaluator. [`StructureEvaluator::evaluate_all`] consumes the evaluator,
//! so slots and memos are dropped on every exit path and never leak into
//! the next pass.
//!
//! Evaluation never writes structure state. The dominion's finalization
//! step applies the returned [`PassOutcome`].

use std::collections::{BTreeMap, BTreeSet};

use dominion_types::{Requirement, SettlementId, StructureDefinition, StructureId, Verdict};
use tracing::{debug, error, warn};

use crate::registry::{Memo, ProducerRegistry};
use crate::settlement::Settlement;
use crate::structure::Structure;
use crate::view::DominionView;

// ---------------------------------------------------------------------------
// Pass context
// ---------------------------------------------------------------------------

/// Evaluation slot of one structure within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Calculating,
    Resolved(Verdict),
}

/// What the previous round settled on. Cyclic reads resolve to these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Seeds {
    verdicts: BTreeMap<StructureId, Verdict>,
    amounts: BTreeMap<String, u32>,
}

/// Scratch state for one round of a full recalculation.
#[derive(Debug)]
pub struct PassContext {
    round: u32,
    seeds: Seeds,
    slots: BTreeMap<StructureId, Slot>,
    /// Structure -> (settlement index, structure index) in the view.
    locations: BTreeMap<StructureId, (usize, usize)>,
    registry: ProducerRegistry,
    causes: BTreeMap<StructureId, BTreeSet<String>>,
    bonuses: BTreeSet<StructureId>,
    cycles: u32,
}

impl PassContext {
    /// Build a fresh context for the first round: empty slots, no seeds
    /// and a newly collected registry.
    pub fn new(view: &DominionView<'_>) -> Self {
        Self::seeded(view, Seeds::default(), 0)
    }

    fn seeded(view: &DominionView<'_>, seeds: Seeds, round: u32) -> Self {
        let mut locations = BTreeMap::new();
        for (si, settlement) in view.settlements.iter().enumerate() {
            for (i, structure) in settlement.structures().iter().enumerate() {
                locations.insert(structure.id, (si, i));
            }
        }
        Self {
            round,
            seeds,
            slots: BTreeMap::new(),
            locations,
            registry: ProducerRegistry::build(view),
            causes: BTreeMap::new(),
            bonuses: BTreeSet::new(),
            cycles: 0,
        }
    }

    /// The registry built for this round.
    pub const fn registry(&self) -> &ProducerRegistry {
        &self.registry
    }

    /// Zero-based round number.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Turn a finished round into its outcome, handing back the seeds it
    /// was run with.
    fn finish(self, cycles: u32) -> (PassOutcome, Seeds) {
        let Self {
            round,
            seeds,
            slots,
            registry,
            mut causes,
            bonuses,
            ..
        } = self;

        let resolutions = slots
            .into_iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Resolved(verdict) => Some((
                    id,
                    Resolution {
                        verdict,
                        missing_resources: causes.remove(&id).unwrap_or_default(),
                        bonus_active: verdict == Verdict::Working && bonuses.contains(&id),
                    },
                )),
                Slot::Calculating => None,
            })
            .collect();

        let outcome = PassOutcome {
            resolutions,
            amounts: registry.resolved_amounts(),
            cycles,
            rounds: round.saturating_add(1),
        };
        (outcome, seeds)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The evaluator's decision for one structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved verdict.
    pub verdict: Verdict,
    /// Resources whose shortage stalled the structure. Empty unless the
    /// structure stalled on resource checks.
    pub missing_resources: BTreeSet<String>,
    /// Whether the conditional bonus holds. Only ever set when working.
    pub bonus_active: bool,
}

/// Everything one pass decided.
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// Per-structure decisions, for every structure in the view.
    pub resolutions: BTreeMap<StructureId, Resolution>,
    /// Resource amounts resolved while evaluating.
    pub amounts: BTreeMap<String, u32>,
    /// Number of cyclic reads detected in the first round.
    pub cycles: u32,
    /// Number of rounds the pass took to settle.
    pub rounds: u32,
}

impl PassOutcome {
    /// The verdict for a structure, if it was evaluated.
    pub fn verdict(&self, id: StructureId) -> Option<Verdict> {
        self.resolutions.get(&id).map(|r| r.verdict)
    }

    fn seeds(&self) -> Seeds {
        Seeds {
            verdicts: self
                .resolutions
                .iter()
                .map(|(id, r)| (*id, r.verdict))
                .collect(),
            amounts: self.amounts.clone(),
        }
    }
}

/// Outcome of the resource checks at the stall stage.
#[derive(Debug, Default)]
struct ResourceCheck {
    stalled: bool,
    missing: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Memoized, cycle-safe evaluator for one dominion and one pass.
#[derive(Debug)]
pub struct StructureEvaluator<'a> {
    view: DominionView<'a>,
    ctx: PassContext,
}

impl<'a> StructureEvaluator<'a> {
    /// Start a pass over `view`.
    pub fn new(view: DominionView<'a>) -> Self {
        let ctx = PassContext::new(&view);
        Self { view, ctx }
    }

    /// The context of the current round, for inspection.
    pub const fn context(&self) -> &PassContext {
        &self.ctx
    }

    /// Evaluate every structure, round after round, until a round
    /// reproduces the seeds it started from, and hand back the decisions.
    pub fn evaluate_all(self) -> PassOutcome {
        let Self { view, mut ctx } = self;
        let settlements: &'a [Settlement] = view.settlements;
        let structures = settlements
            .iter()
            .map(|s| s.structures().len())
            .fold(0_usize, usize::saturating_add);
        // A verdict can only improve twice, and amounts follow the verdicts
        // of the round before.
        let max_rounds = u32::try_from(structures)
            .unwrap_or(u32::MAX)
            .saturating_mul(2)
            .saturating_add(3);
        let mut first_round_cycles = None;

        loop {
            let mut round = Self { view, ctx };
            for structure in settlements.iter().flat_map(Settlement::structures) {
                round.evaluate(structure.id);
            }

            let finished = round.ctx;
            let number = finished.round;
            let cycles = *first_round_cycles.get_or_insert(finished.cycles);
            let (outcome, used) = finished.finish(cycles);
            let settled = outcome.seeds();
            if settled == used {
                if number > 0 {
                    debug!(dominion = %view.dominion, rounds = outcome.rounds, "pass settled");
                }
                return outcome;
            }
            if outcome.rounds >= max_rounds {
                warn!(
                    dominion = %view.dominion,
                    rounds = outcome.rounds,
                    "pass did not settle, keeping the last round"
                );
                return outcome;
            }
            ctx = PassContext::seeded(&view, settled, number.saturating_add(1));
        }
    }

    /// Resolve one structure, memoized for the rest of the round.
    pub fn evaluate(&mut self, id: StructureId) -> Verdict {
        match self.ctx.slots.get(&id).copied() {
            Some(Slot::Resolved(verdict)) => return verdict,
            Some(Slot::Calculating) => {
                let seeded = self.ctx.seeds.verdicts.get(&id).copied();
                if self.ctx.round == 0 {
                    self.ctx.cycles = self.ctx.cycles.saturating_add(1);
                    error!(
                        dominion = %self.view.dominion,
                        structure = %id,
                        "cyclic dependency while evaluating structure, resolving as abandoned"
                    );
                }
                return seeded.unwrap_or(Verdict::Abandoned);
            }
            None => {}
        }

        let Some((settlement, structure)) = self.locate(id) else {
            warn!(
                dominion = %self.view.dominion,
                structure = %id,
                "structure not owned by dominion"
            );
            return Verdict::Abandoned;
        };

        self.ctx.slots.insert(id, Slot::Calculating);
        let verdict = self.resolve(settlement, structure);
        self.ctx.slots.insert(id, Slot::Resolved(verdict));
        verdict
    }

    /// Units of `resource` available to the dominion this round.
    ///
    /// Reading a resource whose amount is still being summed breaks the
    /// cycle with the amount the previous round settled on, zero in the
    /// first round.
    pub fn amount_available(&mut self, resource: &str) -> u32 {
        match self.ctx.registry.memo(resource) {
            Memo::Resolved(amount) => return amount,
            Memo::Calculating => {
                let seeded = self.ctx.seeds.amounts.get(resource).copied();
                if self.ctx.round == 0 {
                    self.ctx.cycles = self.ctx.cycles.saturating_add(1);
                    error!(
                        dominion = %self.view.dominion,
                        resource,
                        "cyclic dependency while summing producers"
                    );
                    debug!(resource, "producer cycle contributes nothing");
                }
                return seeded.unwrap_or(0);
            }
            Memo::Unset => {}
        }

        self.ctx.registry.mark_calculating(resource);
        let (producers, fixed) = self
            .ctx
            .registry
            .entry(resource)
            .map_or((Vec::new(), 0), |e| (e.producers.clone(), e.fixed_amount()));

        let mut total = fixed;
        for (producer, amount) in producers {
            if self.evaluate(producer) == Verdict::Working {
                total = total.saturating_add(amount);
            }
        }
        self.ctx.registry.resolve(resource, total);
        total
    }

    fn locate(&self, id: StructureId) -> Option<(&'a Settlement, &'a Structure)> {
        let settlements: &'a [Settlement] = self.view.settlements;
        let &(si, i) = self.ctx.locations.get(&id)?;
        let settlement = settlements.get(si)?;
        let structure = settlement.structures().get(i)?;
        Some((settlement, structure))
    }

    /// Read every input of the structure, then decide in order: lock,
    /// prerequisites, disruption, resources.
    fn resolve(&mut self, settlement: &'a Settlement, structure: &'a Structure) -> Verdict {
        let catalog = self.view.catalog;
        let Some(def) = catalog.structure(&structure.definition) else {
            error!(
                structure = %structure.id,
                definition = %structure.definition,
                "structure definition missing from catalog, resolving as abandoned"
            );
            return Verdict::Abandoned;
        };

        let prerequisites = self.prerequisites(settlement, def);
        let check = self.check_resources(settlement.id, def);
        let bonus = self.requirements_met(settlement.id, &def.bonus_requires);

        if !self.view.is_unlocked(def) {
            return Verdict::Abandoned;
        }
        if prerequisites != Verdict::Working {
            return prerequisites;
        }
        if self.view.is_disrupted(settlement.id) {
            return Verdict::Stalled;
        }
        if check.stalled {
            if !check.missing.is_empty() {
                self.ctx.causes.insert(structure.id, check.missing);
            }
            return Verdict::Stalled;
        }

        if bonus {
            self.ctx.bonuses.insert(structure.id);
        }
        Verdict::Working
    }

    /// District parents plus the structural reading of the AND and OR
    /// lists. Resource requirements count as satisfiable here.
    fn prerequisites(
        &mut self,
        settlement: &'a Settlement,
        def: &'a StructureDefinition,
    ) -> Verdict {
        let catalog = self.view.catalog;
        let mut verdict = Verdict::Working;

        for membership in &def.districts {
            if let Some(parent) = membership
                .district
                .as_deref()
                .and_then(|d| catalog.district_parent(d))
            {
                // The best standing variant of the parent counts.
                let mut parent_verdict: Option<Verdict> = None;
                for candidate in settlement
                    .structures()
                    .iter()
                    .filter(|s| catalog.is_variant_of(&s.definition, parent))
                {
                    let candidate_verdict = if candidate.completed {
                        self.evaluate(candidate.id)
                    } else {
                        Verdict::Stalled
                    };
                    parent_verdict = Some(
                        parent_verdict.map_or(candidate_verdict, |v| v.best(candidate_verdict)),
                    );
                }
                verdict = verdict.worst(parent_verdict.unwrap_or(Verdict::Abandoned));
            }

            let and_holds = membership
                .requires
                .iter()
                .all(|r| self.view.predicate_holds(settlement.id, r));
            let or_holds = membership.requires_or.is_empty()
                || membership
                    .requires_or
                    .iter()
                    .any(|r| self.view.predicate_holds(settlement.id, r));
            if !and_holds || !or_holds {
                verdict = Verdict::Abandoned;
            }
        }
        verdict
    }

    fn check_resources(
        &mut self,
        settlement: SettlementId,
        def: &'a StructureDefinition,
    ) -> ResourceCheck {
        let mut check = ResourceCheck::default();

        for membership in &def.districts {
            for requirement in &membership.requires {
                if let Requirement::Resource { name, min_amount } = requirement {
                    if self.amount_available(name) < *min_amount {
                        check.stalled = true;
                        check.missing.insert(name.clone());
                    }
                }
            }

            if membership.requires_or.is_empty() {
                continue;
            }
            let mut shortfalls = BTreeSet::new();
            let mut satisfied = false;
            for requirement in &membership.requires_or {
                let holds = match requirement {
                    Requirement::Resource { name, min_amount } => {
                        let holds = self.amount_available(name) >= *min_amount;
                        if !holds {
                            shortfalls.insert(name.clone());
                        }
                        holds
                    }
                    other => self.view.predicate_holds(settlement, other),
                };
                satisfied |= holds;
            }
            if !satisfied {
                check.stalled = true;
                check.missing.extend(shortfalls);
            }
        }
        check
    }

    fn requirements_met(
        &mut self,
        settlement: SettlementId,
        requirements: &'a [Requirement],
    ) -> bool {
        let mut met = true;
        for requirement in requirements {
            met &= match requirement {
                Requirement::Resource { name, min_amount } => {
                    self.amount_available(name) >= *min_amount
                }
                other => self.view.predicate_holds(settlement, other),
            };
        }
        met
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{
        DistrictDefinition, DistrictMembership, DominionId, Importer, ResourceYield,
    };

    use super::*;
    use crate::catalog::Catalog;
    use crate::conditions::StaticConditions;

    struct Fixture {
        dominion: DominionId,
        catalog: Catalog,
        settlements: Vec<Settlement>,
        unlocked: BTreeSet<String>,
        importers: Vec<Importer>,
        conditions: StaticConditions,
    }

    impl Fixture {
        fn new(structures: Vec<StructureDefinition>, districts: Vec<DistrictDefinition>) -> Self {
            Self {
                dominion: DominionId::new(),
                catalog: Catalog::new(structures, districts),
                settlements: vec![Settlement::new("Harrowgate")],
                unlocked: BTreeSet::new(),
                importers: Vec::new(),
                conditions: StaticConditions::new(),
            }
        }

        fn build(&mut self, definition: &str) -> StructureId {
            let def = self.catalog.structure(definition).unwrap().clone();
            self.settlements[0].add_structure(Structure::completed(&def))
        }

        fn plan(&mut self, definition: &str) -> StructureId {
            let def = self.catalog.structure(definition).unwrap().clone();
            self.settlements[0].add_structure(Structure::planned(&def))
        }

        fn view(&self) -> DominionView<'_> {
            DominionView {
                dominion: self.dominion,
                catalog: &self.catalog,
                settlements: &self.settlements,
                unlocked_upgrades: &self.unlocked,
                importers: &self.importers,
                conditions: &self.conditions,
            }
        }

        fn run(&self) -> PassOutcome {
            StructureEvaluator::new(self.view()).evaluate_all()
        }
    }

    fn requiring(id: &str, requires: Vec<Requirement>) -> StructureDefinition {
        let mut def = StructureDefinition::new(id);
        def.districts.push(DistrictMembership {
            district: None,
            requires,
            requires_or: Vec::new(),
        });
        def
    }

    fn producing(mut def: StructureDefinition, resource: &str, amount: u32) -> StructureDefinition {
        def.produces.push(ResourceYield::new(resource, amount));
        def
    }

    #[test]
    fn missing_resource_stalls_with_cause() {
        let mut fx = Fixture::new(
            vec![
                requiring("armory", vec![Requirement::resource("iron", 1)]),
                producing(StructureDefinition::new("iron_mine"), "iron", 1),
            ],
            Vec::new(),
        );
        let armory = fx.build("armory");

        let outcome = fx.run();
        let resolution = outcome.resolutions.get(&armory).unwrap();
        assert_eq!(resolution.verdict, Verdict::Stalled);
        assert!(resolution.missing_resources.contains("iron"));

        fx.build("iron_mine");
        let outcome = fx.run();
        let resolution = outcome.resolutions.get(&armory).unwrap();
        assert_eq!(resolution.verdict, Verdict::Working);
        assert!(resolution.missing_resources.is_empty());
        assert_eq!(outcome.amounts.get("iron"), Some(&1));
    }

    #[test]
    fn min_amount_is_a_threshold() {
        let mut fx = Fixture::new(
            vec![
                requiring("foundry", vec![Requirement::resource("iron", 3)]),
                producing(StructureDefinition::new("iron_mine"), "iron", 2),
            ],
            Vec::new(),
        );
        let foundry = fx.build("foundry");
        fx.build("iron_mine");
        assert_eq!(fx.run().verdict(foundry), Some(Verdict::Stalled));

        fx.importers.push(Importer::new("iron"));
        assert_eq!(fx.run().verdict(foundry), Some(Verdict::Working));
    }

    #[test]
    fn occupation_stalls_without_resource_cause() {
        let mut fx = Fixture::new(
            vec![
                requiring("armory", vec![Requirement::resource("iron", 1)]),
                producing(StructureDefinition::new("iron_mine"), "iron", 1),
            ],
            Vec::new(),
        );
        let armory = fx.build("armory");
        fx.build("iron_mine");
        let settlement = fx.settlements[0].id;
        fx.conditions.set_occupied(settlement, true);

        let outcome = fx.run();
        let resolution = outcome.resolutions.get(&armory).unwrap();
        assert_eq!(resolution.verdict, Verdict::Stalled);
        assert!(resolution.missing_resources.is_empty());
    }

    #[test]
    fn locked_upgrade_is_abandoned() {
        let mut great = StructureDefinition::new("great_hall");
        great.upgrade_of = Some(String::from("hall"));
        let mut fx = Fixture::new(vec![StructureDefinition::new("hall"), great], Vec::new());
        let upgrade = fx.build("great_hall");

        assert_eq!(fx.run().verdict(upgrade), Some(Verdict::Abandoned));
        fx.unlocked.insert(String::from("great_hall"));
        assert_eq!(fx.run().verdict(upgrade), Some(Verdict::Working));
    }

    #[test]
    fn mutual_requirements_do_not_support_each_other() {
        let mut fx = Fixture::new(
            vec![
                producing(requiring("a", vec![Requirement::resource("r1", 1)]), "r2", 1),
                producing(requiring("b", vec![Requirement::resource("r2", 1)]), "r1", 1),
            ],
            Vec::new(),
        );
        let a = fx.build("a");
        let b = fx.build("b");

        let outcome = fx.run();
        for id in [a, b] {
            let verdict = outcome.verdict(id).unwrap();
            assert!(verdict.is_blocked(), "{verdict:?} from circular support");
        }
        assert!(outcome.cycles > 0);
    }

    #[test]
    fn outside_supply_settles_a_cycle_in_any_order() {
        let definitions = || {
            vec![
                producing(requiring("a", vec![Requirement::resource("r1", 1)]), "r2", 1),
                producing(requiring("b", vec![Requirement::resource("r2", 1)]), "r1", 1),
                producing(StructureDefinition::new("c"), "r1", 1),
            ]
        };

        let mut results = Vec::new();
        for order in [["a", "b", "c"], ["b", "a", "c"], ["c", "b", "a"]] {
            let mut fx = Fixture::new(definitions(), Vec::new());
            let built: Vec<(StructureId, &str)> =
                order.iter().map(|d| (fx.build(d), *d)).collect();
            let outcome = fx.run();
            let verdicts: BTreeMap<&str, Verdict> = built
                .iter()
                .map(|(id, d)| (*d, outcome.verdict(*id).unwrap()))
                .collect();
            for (id, _) in &built {
                let resolution = outcome.resolutions.get(id).unwrap();
                assert!(resolution.missing_resources.is_empty());
            }
            results.push((verdicts, outcome.amounts));
        }

        for (verdicts, amounts) in &results {
            assert!(
                verdicts.values().all(|v| *v == Verdict::Working),
                "{verdicts:?}"
            );
            assert_eq!(amounts.get("r1"), Some(&2));
            assert_eq!(amounts.get("r2"), Some(&1));
        }
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }

    #[test]
    fn self_feeding_producer_stalls() {
        let mut fx = Fixture::new(
            vec![producing(
                requiring("charcoal_kiln", vec![Requirement::resource("charcoal", 1)]),
                "charcoal",
                2,
            )],
            Vec::new(),
        );
        let kiln = fx.build("charcoal_kiln");
        let outcome = fx.run();
        assert_eq!(outcome.verdict(kiln), Some(Verdict::Stalled));
        assert_eq!(outcome.amounts.get("charcoal"), Some(&0));
    }

    #[test]
    fn district_parent_chain() {
        let mut chapel = StructureDefinition::new("chapel");
        chapel.districts.push(DistrictMembership {
            district: Some(String::from("temple_quarter")),
            ..DistrictMembership::default()
        });
        let mut fx = Fixture::new(
            vec![chapel, StructureDefinition::new("temple")],
            vec![DistrictDefinition {
                id: String::from("temple_quarter"),
                parent: Some(String::from("temple")),
            }],
        );
        let chapel = fx.build("chapel");
        assert_eq!(fx.run().verdict(chapel), Some(Verdict::Abandoned), "parent missing");

        let temple = fx.plan("temple");
        assert_eq!(fx.run().verdict(chapel), Some(Verdict::Stalled), "parent unbuilt");

        fx.settlements[0].complete_structure(temple).unwrap();
        assert_eq!(fx.run().verdict(chapel), Some(Verdict::Working));
    }

    #[test]
    fn religion_and_citadel_abandon() {
        let mut fx = Fixture::new(
            vec![
                requiring("cathedral", vec![Requirement::religion("orthodox")]),
                requiring("bastion", vec![Requirement::Citadel]),
                requiring("guildhall", vec![Requirement::Unrecognized]),
            ],
            Vec::new(),
        );
        let cathedral = fx.build("cathedral");
        let bastion = fx.build("bastion");
        let guildhall = fx.build("guildhall");

        let outcome = fx.run();
        assert_eq!(outcome.verdict(cathedral), Some(Verdict::Abandoned));
        assert_eq!(outcome.verdict(bastion), Some(Verdict::Abandoned));
        assert_eq!(outcome.verdict(guildhall), Some(Verdict::Working));
        assert!(outcome.resolutions.get(&cathedral).unwrap().missing_resources.is_empty());

        fx.conditions.grant_religion_tag(fx.dominion, "orthodox");
        fx.conditions.set_citadel(fx.settlements[0].id, true);
        let outcome = fx.run();
        assert_eq!(outcome.verdict(cathedral), Some(Verdict::Working));
        assert_eq!(outcome.verdict(bastion), Some(Verdict::Working));
    }

    #[test]
    fn or_list_needs_one_alternative() {
        let mut tannery = StructureDefinition::new("tannery");
        tannery.districts.push(DistrictMembership {
            district: None,
            requires: Vec::new(),
            requires_or: vec![Requirement::resource("hides", 1), Requirement::resource("bark", 1)],
        });
        let mut fx = Fixture::new(
            vec![tannery, producing(StructureDefinition::new("sawmill"), "bark", 1)],
            Vec::new(),
        );
        let tannery = fx.build("tannery");

        let outcome = fx.run();
        let resolution = outcome.resolutions.get(&tannery).unwrap();
        assert_eq!(resolution.verdict, Verdict::Stalled);
        let expected: BTreeSet<String> = [String::from("bark"), String::from("hides")].into();
        assert_eq!(resolution.missing_resources, expected);

        fx.build("sawmill");
        assert_eq!(fx.run().verdict(tannery), Some(Verdict::Working));
    }

    #[test]
    fn completion_yield_ignores_producer_state() {
        let mut quarry = requiring("quarry", vec![Requirement::religion("old_gods")]);
        quarry.produces_on_completion.push(ResourceYield::new("stone", 1));
        let mut fx = Fixture::new(
            vec![quarry, requiring("mason", vec![Requirement::resource("stone", 1)])],
            Vec::new(),
        );
        let quarry = fx.build("quarry");
        let mason = fx.build("mason");

        let outcome = fx.run();
        assert_eq!(outcome.verdict(quarry), Some(Verdict::Abandoned));
        assert_eq!(outcome.verdict(mason), Some(Verdict::Working));
    }

    #[test]
    fn bonus_follows_bonus_requirements() {
        let mut market = StructureDefinition::new("market");
        market.bonus_requires.push(Requirement::resource("spice", 1));
        let mut fx = Fixture::new(vec![market], Vec::new());
        let market = fx.build("market");

        let outcome = fx.run();
        let resolution = outcome.resolutions.get(&market).unwrap();
        assert_eq!(resolution.verdict, Verdict::Working);
        assert!(!resolution.bonus_active);

        fx.importers.push(Importer::new("spice"));
        assert!(fx.run().resolutions.get(&market).unwrap().bonus_active);
    }

    #[test]
    fn unknown_definition_is_abandoned() {
        let mut fx = Fixture::new(vec![StructureDefinition::new("hall")], Vec::new());
        let mut ghost = Structure::completed(&StructureDefinition::new("hall"));
        ghost.definition = String::from("ghost_tower");
        let ghost = fx.settlements[0].add_structure(ghost);
        assert_eq!(fx.run().verdict(ghost), Some(Verdict::Abandoned));
    }

    #[test]
    fn every_structure_is_resolved() {
        let mut fx = Fixture::new(
            vec![
                producing(requiring("a", vec![Requirement::resource("r1", 1)]), "r2", 1),
                producing(requiring("b", vec![Requirement::resource("r2", 1)]), "r1", 1),
                StructureDefinition::new("hall"),
            ],
            Vec::new(),
        );
        let ids = [fx.build("a"), fx.build("b"), fx.build("hall"), fx.plan("hall")];
        let outcome = fx.run();
        assert_eq!(outcome.resolutions.len(), ids.len());
    }
}
