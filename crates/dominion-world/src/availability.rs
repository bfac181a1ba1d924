//! Resource-availability oracle.
//!
//! Answers "could this resource or structure ever become available?" for
//! advisory consumers. The graph is the one the evaluator walks (district
//! parents, AND lists, OR lists, producers) but the semantics differ:
//!
//! - transient blockers (occupation, disorder) are ignored,
//! - AND lists aggregate to the worst [`Availability`] of their members,
//!   OR lists to the best,
//! - every answer carries two tracks: `availability`, which may lean on
//!   other settlements and importers, and `own_availability`, which only
//!   uses what the settlement itself could build.
//!
//! Results are cached per settlement and per dominion. Every record is
//! stamped with the dominion's availability version; a record from an older
//! version reads as unknown and is recomputed.
//!
//! A target read while it is still being computed is a cycle. Such a read
//! resolves to `Impossible` in the first round of a query and to the
//! previous round's answer after that; a query repeats its rounds until
//! one reproduces the answers it was seeded with, and only then are its
//! records cached. Every target reads all of its prerequisites, so the
//! settled answers are the same whichever target was asked first.
//!
//! The oracle never reads or writes structure state.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use dominion_types::{
    Availability, ImporterId, Requirement, Scope, SettlementId, StructureDefinition, StructureId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::settlement::Settlement;
use crate::view::DominionView;

// ---------------------------------------------------------------------------
// Records and cache
// ---------------------------------------------------------------------------

/// What an availability query is about.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    /// A named resource.
    Resource(String),
    /// A structure definition.
    Structure(String),
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProducerRef {
    /// A standing structure.
    Structure(StructureId),
    /// A definition that could be built.
    Definition(String),
    /// An active importer.
    Importer(ImporterId),
    /// Another settlement of the dominion.
    Settlement(SettlementId),
}

/// A resolved availability answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    /// Reachability using anything the dominion has.
    pub availability: Availability,
    /// Reachability using only the settlement's own production.
    pub own_availability: Availability,
    /// The producers the answer relies on.
    pub producer_refs: Vec<ProducerRef>,
    /// Availability version the record was computed at.
    pub version: u64,
}

impl AvailabilityRecord {
    const fn impossible(version: u64) -> Self {
        Self {
            availability: Availability::Impossible,
            own_availability: Availability::Impossible,
            producer_refs: Vec::new(),
            version,
        }
    }

    const fn tracks(&self) -> Tracks {
        Tracks {
            full: self.availability,
            own: self.own_availability,
        }
    }
}

/// Settled availability records for one scope.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityCache {
    records: BTreeMap<Target, AvailabilityRecord>,
}

impl AvailabilityCache {
    /// Read `target` as seen at `version`. `None` if it was never settled
    /// or was settled at another version.
    pub fn lookup(&self, target: &Target, version: u64) -> Option<AvailabilityRecord> {
        self.records
            .get(target)
            .filter(|record| record.version == version)
            .cloned()
    }

    fn store(&mut self, target: Target, record: AvailabilityRecord) {
        self.records.insert(target, record);
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of cached targets, stale ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// One prerequisite of a structure definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prerequisite {
    /// The base the definition upgrades.
    UpgradeBase {
        /// Base definition ID.
        definition: String,
    },
    /// The parent structure of a district the definition belongs to.
    DistrictParent {
        /// District ID.
        district: String,
        /// Parent definition ID.
        definition: String,
    },
    /// An entry of an AND list.
    Required {
        /// The requirement.
        requirement: Requirement,
    },
    /// An entry of an OR list.
    Alternative {
        /// The requirement.
        requirement: Requirement,
    },
}

/// A prerequisite with its availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteStatus {
    /// What is required.
    pub prerequisite: Prerequisite,
    /// Reachability using anything the dominion has.
    pub availability: Availability,
    /// Reachability using only the settlement's own production.
    pub own_availability: Availability,
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// The two availability tracks computed side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tracks {
    full: Availability,
    own: Availability,
}

impl Tracks {
    const fn both(value: Availability) -> Self {
        Self {
            full: value,
            own: value,
        }
    }

    fn worst(self, other: Self) -> Self {
        Self {
            full: self.full.worst(other.full),
            own: self.own.worst(other.own),
        }
    }

    fn best(self, other: Self) -> Self {
        Self {
            full: self.full.best(other.full),
            own: self.own.best(other.own),
        }
    }

    const fn one_step_further(self) -> Self {
        Self {
            full: self.full.one_step_further(),
            own: self.own.one_step_further(),
        }
    }
}

/// A target within the scope whose cache holds it.
type Key = (Scope, Target);

/// An answer computed during a round, with the cache it settles into.
#[derive(Debug)]
struct Computed<'a> {
    cache: &'a RefCell<AvailabilityCache>,
    record: AvailabilityRecord,
}

/// Scratch state of one round of a top-level query.
#[derive(Debug, Default)]
struct Round<'a> {
    number: u32,
    /// Answers cyclic reads resolve to, from the previous round.
    seeds: BTreeMap<Key, Tracks>,
    calculating: BTreeSet<Key>,
    computed: BTreeMap<Key, Computed<'a>>,
    cyclic: bool,
}

impl Round<'_> {
    fn tracks(&self) -> BTreeMap<Key, Tracks> {
        self.computed
            .iter()
            .map(|(key, c)| (key.clone(), c.record.tracks()))
            .collect()
    }
}

/// Cached, cycle-safe reachability queries for one dominion.
#[derive(Debug)]
pub struct AvailabilityOracle<'a> {
    view: DominionView<'a>,
    version: u64,
    dominion_cache: &'a RefCell<AvailabilityCache>,
    round: RefCell<Option<Round<'a>>>,
}

impl<'a> AvailabilityOracle<'a> {
    /// Create an oracle reading caches at `version`.
    pub const fn new(
        view: DominionView<'a>,
        version: u64,
        dominion_cache: &'a RefCell<AvailabilityCache>,
    ) -> Self {
        Self {
            view,
            version,
            dominion_cache,
            round: RefCell::new(None),
        }
    }

    /// Answer a query in a scope. `None` if the settlement is not owned by
    /// the dominion.
    pub fn query(&self, scope: Scope, target: &Target) -> Option<AvailabilityRecord> {
        match (scope, target) {
            (Scope::Settlement(id), Target::Resource(name)) => {
                self.view.settlement(id).map(|s| self.resource(s, name))
            }
            (Scope::Settlement(id), Target::Structure(def)) => {
                self.view.settlement(id).map(|s| self.structure(s, def))
            }
            (Scope::Dominion, Target::Resource(name)) => Some(self.dominion_resource(name)),
            (Scope::Dominion, Target::Structure(def)) => Some(self.dominion_structure(def)),
        }
    }

    /// Availability of a resource in a settlement.
    pub fn resource(&self, settlement: &'a Settlement, resource: &str) -> AvailabilityRecord {
        let target = Target::Resource(resource.to_owned());
        let scope = Scope::Settlement(settlement.id);
        self.memoized(settlement.availability_cache(), scope, &target, &|| {
            let catalog = self.view.catalog;
            let standing: Vec<ProducerRef> = settlement
                .structures()
                .iter()
                .filter(|s| s.completed)
                .filter(|s| {
                    catalog.structure(&s.definition).is_some_and(|d| {
                        d.produces_resource(resource) || d.produces_on_completion_resource(resource)
                    })
                })
                .map(|s| ProducerRef::Structure(s.id))
                .collect();
            if !standing.is_empty() {
                return (Tracks::both(Availability::Available), standing);
            }

            let mut local = Tracks::both(Availability::Impossible);
            let mut refs = Vec::new();
            for producer in catalog.producers_of(resource) {
                let tracks = self.structure(settlement, &producer.id).tracks();
                if tracks.full != Availability::Impossible {
                    refs.push(ProducerRef::Definition(producer.id.clone()));
                }
                local = local.best(tracks);
            }

            let dominion = self.dominion_resource(resource);
            if dominion.availability < local.full {
                refs.clone_from(&dominion.producer_refs);
            }
            let tracks = Tracks {
                full: local.full.best(dominion.availability),
                own: local.own,
            };
            (tracks, refs)
        })
    }

    /// Availability of a structure definition in a settlement.
    pub fn structure(&self, settlement: &'a Settlement, definition: &str) -> AvailabilityRecord {
        let target = Target::Structure(definition.to_owned());
        let scope = Scope::Settlement(settlement.id);
        self.memoized(settlement.availability_cache(), scope, &target, &|| {
            let catalog = self.view.catalog;
            if let Some(standing) = settlement
                .find_variant(catalog, definition)
                .filter(|s| s.completed)
            {
                return (
                    Tracks::both(Availability::Available),
                    vec![ProducerRef::Structure(standing.id)],
                );
            }
            let Some(def) = catalog.structure(definition) else {
                return (Tracks::both(Availability::Impossible), Vec::new());
            };

            let (_, aggregate) = self.walk(settlement, def);
            let mut tracks = aggregate.one_step_further();
            if !self.view.is_unlocked(def) {
                tracks = tracks.worst(Tracks::both(Availability::IndirectlyObtainable));
            }
            (tracks, vec![ProducerRef::Definition(def.id.clone())])
        })
    }

    /// Availability of a resource anywhere in the dominion.
    pub fn dominion_resource(&self, resource: &str) -> AvailabilityRecord {
        let target = Target::Resource(resource.to_owned());
        self.memoized(self.dominion_cache, Scope::Dominion, &target, &|| {
            let imports: Vec<ProducerRef> = self
                .view
                .importers
                .iter()
                .filter(|i| i.active && i.resource == resource)
                .map(|i| ProducerRef::Importer(i.id))
                .collect();
            if !imports.is_empty() {
                return (Tracks::both(Availability::Available), imports);
            }

            let catalog = self.view.catalog;
            let settlements: &'a [Settlement] = self.view.settlements;
            let standing: Vec<ProducerRef> = settlements
                .iter()
                .flat_map(Settlement::structures)
                .filter(|s| s.completed)
                .filter(|s| {
                    catalog.structure(&s.definition).is_some_and(|d| {
                        d.produces_resource(resource) || d.produces_on_completion_resource(resource)
                    })
                })
                .map(|s| ProducerRef::Structure(s.id))
                .collect();
            if !standing.is_empty() {
                return (Tracks::both(Availability::Available), standing);
            }

            let mut best = Tracks::both(Availability::Impossible);
            let mut refs = Vec::new();
            for settlement in settlements {
                for producer in catalog.producers_of(resource) {
                    let tracks = self.structure(settlement, &producer.id).tracks();
                    if tracks.full < best.full {
                        refs = vec![ProducerRef::Settlement(settlement.id)];
                    }
                    best = best.best(tracks);
                }
            }
            (best, refs)
        })
    }

    /// Availability of a structure definition anywhere in the dominion.
    pub fn dominion_structure(&self, definition: &str) -> AvailabilityRecord {
        let target = Target::Structure(definition.to_owned());
        self.memoized(self.dominion_cache, Scope::Dominion, &target, &|| {
            let settlements: &'a [Settlement] = self.view.settlements;
            let mut best = Tracks::both(Availability::Impossible);
            let mut refs = Vec::new();
            for settlement in settlements {
                let tracks = self.structure(settlement, definition).tracks();
                if tracks.full < best.full {
                    refs = vec![ProducerRef::Settlement(settlement.id)];
                }
                best = best.best(tracks);
            }
            (best, refs)
        })
    }

    /// Every prerequisite of `definition` with its availability, for
    /// explaining what stands between the player and the structure.
    ///
    /// In the dominion scope each entry takes its best value across
    /// settlements.
    pub fn requirement_breakdown(
        &self,
        scope: Scope,
        definition: &str,
    ) -> Vec<PrerequisiteStatus> {
        let Some(def) = self.view.catalog.structure(definition) else {
            return Vec::new();
        };
        let settlements: &'a [Settlement] = self.view.settlements;

        let merged = self.settled(|| {
            let mut merged: Option<Vec<(Prerequisite, Tracks)>> = None;
            for settlement in settlements {
                if let Scope::Settlement(id) = scope {
                    if settlement.id != id {
                        continue;
                    }
                }
                let (entries, _) = self.walk(settlement, def);
                merged = Some(match merged {
                    None => entries,
                    Some(previous) => previous
                        .into_iter()
                        .zip(entries)
                        .map(|((p, a), (_, b))| (p, a.best(b)))
                        .collect(),
                });
            }
            merged
        });

        merged
            .unwrap_or_default()
            .into_iter()
            .map(|(prerequisite, t)| PrerequisiteStatus {
                prerequisite,
                availability: t.full,
                own_availability: t.own,
            })
            .collect()
    }

    /// Walk the prerequisites of `def` in a settlement.
    ///
    /// Returns every prerequisite with its own tracks, plus the aggregate:
    /// the worst of the upgrade base, district parents and AND entries,
    /// combined with the best alternative of each OR list.
    fn walk(
        &self,
        settlement: &'a Settlement,
        def: &'a StructureDefinition,
    ) -> (Vec<(Prerequisite, Tracks)>, Tracks) {
        let catalog = self.view.catalog;
        let mut entries = Vec::new();
        let mut aggregate = Tracks::both(Availability::Available);

        if let Some(base) = &def.upgrade_of {
            let tracks = self.structure(settlement, base).tracks();
            aggregate = aggregate.worst(tracks);
            entries.push((
                Prerequisite::UpgradeBase {
                    definition: base.clone(),
                },
                tracks,
            ));
        }

        for membership in &def.districts {
            if let Some(district) = membership.district.as_deref() {
                if let Some(parent) = catalog.district_parent(district) {
                    let tracks = self.structure(settlement, parent).tracks();
                    aggregate = aggregate.worst(tracks);
                    entries.push((
                        Prerequisite::DistrictParent {
                            district: district.to_owned(),
                            definition: parent.to_owned(),
                        },
                        tracks,
                    ));
                }
            }

            for requirement in &membership.requires {
                let tracks = self.requirement(settlement, requirement);
                aggregate = aggregate.worst(tracks);
                entries.push((
                    Prerequisite::Required {
                        requirement: requirement.clone(),
                    },
                    tracks,
                ));
            }

            if membership.requires_or.is_empty() {
                continue;
            }
            let mut best = Tracks::both(Availability::Impossible);
            for requirement in &membership.requires_or {
                let tracks = self.requirement(settlement, requirement);
                best = best.best(tracks);
                entries.push((
                    Prerequisite::Alternative {
                        requirement: requirement.clone(),
                    },
                    tracks,
                ));
            }
            aggregate = aggregate.worst(best);
        }
        (entries, aggregate)
    }

    fn requirement(&self, settlement: &'a Settlement, requirement: &Requirement) -> Tracks {
        match requirement {
            Requirement::Resource { name, .. } => self.resource(settlement, name).tracks(),
            Requirement::Religion { .. } | Requirement::Citadel => {
                if self.view.predicate_holds(settlement.id, requirement) {
                    Tracks::both(Availability::Available)
                } else {
                    Tracks::both(Availability::Impossible)
                }
            }
            Requirement::Unrecognized => Tracks::both(Availability::Available),
        }
    }

    /// Answer `target` from the cache, from the current round, or by
    /// computing it. Outside a round the computation runs as a query of
    /// its own.
    fn memoized(
        &self,
        cache: &'a RefCell<AvailabilityCache>,
        scope: Scope,
        target: &Target,
        compute: &dyn Fn() -> (Tracks, Vec<ProducerRef>),
    ) -> AvailabilityRecord {
        if let Some(record) = cache.borrow().lookup(target, self.version) {
            return record;
        }
        let in_round = self.round.borrow().is_some();
        if !in_round {
            return self.settled(|| self.memoized(cache, scope, target, compute));
        }

        let key = (scope, target.clone());
        {
            let mut guard = self.round.borrow_mut();
            let Some(round) = guard.as_mut() else {
                return AvailabilityRecord::impossible(self.version);
            };
            if let Some(computed) = round.computed.get(&key) {
                return computed.record.clone();
            }
            if !round.calculating.insert(key.clone()) {
                if round.number == 0 {
                    error!(
                        dominion = %self.view.dominion,
                        ?target,
                        "cyclic dependency while computing availability, resolving as impossible"
                    );
                }
                round.cyclic = true;
                let seeded = round
                    .seeds
                    .get(&key)
                    .copied()
                    .unwrap_or(Tracks::both(Availability::Impossible));
                return AvailabilityRecord {
                    availability: seeded.full,
                    own_availability: seeded.own,
                    producer_refs: Vec::new(),
                    version: self.version,
                };
            }
        }

        let (tracks, producer_refs) = compute();
        let record = AvailabilityRecord {
            availability: tracks.full,
            own_availability: tracks.own,
            producer_refs,
            version: self.version,
        };
        if let Some(round) = self.round.borrow_mut().as_mut() {
            round.calculating.remove(&key);
            round.computed.insert(
                key,
                Computed {
                    cache,
                    record: record.clone(),
                },
            );
        }
        record
    }

    /// Run a top-level query in rounds until a round reproduces the
    /// answers it was seeded with, then cache every answer of that round.
    /// Nested calls run inside the current round.
    fn settled<R>(&self, query: impl Fn() -> R) -> R {
        let in_round = self.round.borrow().is_some();
        if in_round {
            return query();
        }

        let mut seeds = BTreeMap::new();
        let mut number = 0_u32;
        loop {
            *self.round.borrow_mut() = Some(Round {
                number,
                seeds,
                ..Round::default()
            });
            let result = query();
            let finished = self.round.borrow_mut().take();
            let Some(round) = finished else {
                return result;
            };

            let answers = round.tracks();
            if !round.cyclic || answers == round.seeds {
                if number > 0 {
                    debug!(
                        dominion = %self.view.dominion,
                        rounds = number.saturating_add(1),
                        "availability query settled"
                    );
                }
                for ((_, target), computed) in round.computed {
                    computed.cache.borrow_mut().store(target, computed.record);
                }
                return result;
            }

            // Each round can only improve an answer, and there are four
            // levels per track.
            let bound = u32::try_from(answers.len())
                .unwrap_or(u32::MAX)
                .saturating_mul(6)
                .saturating_add(2);
            if number >= bound {
                warn!(
                    dominion = %self.view.dominion,
                    rounds = number.saturating_add(1),
                    "availability query did not settle, leaving it uncached"
                );
                return result;
            }
            seeds = answers;
            number = number.saturating_add(1);
        }
    }
}
