//! Campaign-level scenarios.
//!
//! Drives [`Campaign`] through the public mutation API and checks the
//! settled state: structure states, the missing-resource index, batching,
//! settlement transfer with end-game validation, and advisory queries.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeMap;

use dominion_core::{Campaign, ChangeNotification, EngineConfig, RecalcRequest};
use dominion_types::{
    Availability, DistrictMembership, DominionId, Requirement, ResourceYield, Scope, SettlementId,
    StructureDefinition, StructureId, StructureState,
};
use dominion_world::{Catalog, MissingResourceIndex, StaticConditions, Target};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn def(id: &str, requires: &[(&str, u32)], produces: &[(&str, u32)]) -> StructureDefinition {
    let mut def = StructureDefinition::new(id);
    def.produces = produces
        .iter()
        .map(|(r, n)| ResourceYield::new(r, *n))
        .collect();
    if !requires.is_empty() {
        def.districts.push(DistrictMembership {
            district: None,
            requires: requires
                .iter()
                .map(|(r, n)| Requirement::resource(r, *n))
                .collect(),
            requires_or: Vec::new(),
        });
    }
    def
}

fn catalog() -> Catalog {
    let mut great_smithy = def("great_smithy", &[("iron", 1)], &[("tools", 2)]);
    great_smithy.level = 2;
    great_smithy.upgrade_of = Some(String::from("smithy"));

    let mut foundry = def("foundry", &[("iron", 1), ("salt", 1)], &[]);
    if let Some(membership) = foundry.districts.first_mut() {
        membership.requires_or = vec![
            Requirement::resource("copper", 1),
            Requirement::resource("tin", 1),
        ];
    }

    Catalog::new(
        vec![
            def("iron_mine", &[], &[("iron", 1)]),
            def("salt_pan", &[], &[("salt", 1)]),
            def("smithy", &[("iron", 1)], &[("tools", 1)]),
            great_smithy,
            foundry,
            def("kiln", &[("coal", 1)], &[("charcoal", 1)]),
            def("charcoal_burner", &[("charcoal", 1)], &[("coal", 1)]),
        ],
        Vec::new(),
    )
}

fn campaign_with(config: EngineConfig) -> Campaign {
    Campaign::new(catalog(), StaticConditions::new(), config)
}

fn campaign() -> Campaign {
    campaign_with(EngineConfig::default())
}

fn realm(campaign: &mut Campaign, name: &str, settlement: &str) -> (DominionId, SettlementId) {
    let dominion = campaign.add_dominion(name);
    let settlement = campaign.add_settlement(dominion, settlement).unwrap();
    (dominion, settlement)
}

fn state(campaign: &Campaign, id: StructureId) -> StructureState {
    campaign.structure(id).unwrap().state
}

fn index(campaign: &Campaign, dominion: DominionId) -> &MissingResourceIndex {
    campaign.dominion(dominion).unwrap().missing_resources()
}

type Snapshot = (Vec<(StructureId, StructureState, String, u32, bool)>, MissingResourceIndex);

fn snapshot(campaign: &Campaign, dominion: DominionId) -> Snapshot {
    let owner = campaign.dominion(dominion).unwrap();
    let structures = owner
        .structures()
        .map(|s| {
            (
                s.id,
                s.state,
                s.definition.clone(),
                s.applied_level,
                s.bonus_active,
            )
        })
        .collect();
    (structures, owner.missing_resources().clone())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn missing_iron_stalls_until_a_mine_is_built() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");

    let smithy = campaign.add_structure(harrowgate, "smithy", true).unwrap();
    assert_eq!(state(&campaign, smithy), StructureState::Stalled);
    assert!(index(&campaign, aldmark).contains("iron", smithy));

    campaign.add_structure(harrowgate, "iron_mine", true).unwrap();
    assert_eq!(state(&campaign, smithy), StructureState::Working);
    assert!(index(&campaign, aldmark).structures_missing("iron").is_none());
}

#[test]
fn occupation_stalls_without_indexing() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    campaign.add_structure(harrowgate, "iron_mine", true).unwrap();
    let smithy = campaign.add_structure(harrowgate, "smithy", true).unwrap();
    assert_eq!(state(&campaign, smithy), StructureState::Working);

    campaign
        .update_conditions(aldmark, |c| c.set_occupied(harrowgate, true))
        .unwrap();
    assert_eq!(state(&campaign, smithy), StructureState::Stalled);
    assert!(index(&campaign, aldmark).missing_for(smithy).is_none());
    assert!(index(&campaign, aldmark).is_empty());

    campaign
        .update_conditions(aldmark, |c| c.set_occupied(harrowgate, false))
        .unwrap();
    assert_eq!(state(&campaign, smithy), StructureState::Working);
}

#[test]
fn locked_upgrade_is_abandoned_regardless_of_requirements() {
    let mut config = EngineConfig::default();
    config.recalculation.remove_abandoned = false;
    let mut campaign = campaign_with(config);
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    campaign.add_structure(harrowgate, "iron_mine", true).unwrap();

    let upgrade = campaign.add_structure(harrowgate, "great_smithy", true).unwrap();
    assert_eq!(state(&campaign, upgrade), StructureState::Abandoned);
    assert!(index(&campaign, aldmark).missing_for(upgrade).is_none());

    assert!(campaign.unlock_upgrade(aldmark, "great_smithy").unwrap());
    assert_eq!(state(&campaign, upgrade), StructureState::Working);
    assert!(!campaign.unlock_upgrade(aldmark, "great_smithy").unwrap());
}

#[test]
fn finished_upgrade_reverts_when_abandoned() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    campaign.add_structure(harrowgate, "iron_mine", true).unwrap();
    let smithy = campaign.add_structure(harrowgate, "smithy", true).unwrap();
    campaign.unlock_upgrade(aldmark, "great_smithy").unwrap();

    let upgrade = campaign.begin_upgrade(smithy, "great_smithy").unwrap();
    let replaced = campaign.complete_structure(upgrade).unwrap();
    assert_eq!(replaced.map(|s| s.id), Some(smithy));
    assert_eq!(campaign.structure(upgrade).unwrap().applied_level, 2);
    campaign.drain_notifications();

    // A dominion that never unlocked the upgrade takes the settlement.
    let veyra = campaign.add_dominion("Veyra");
    campaign.add_settlement(veyra, "Eastmarch").unwrap();
    campaign.transfer_settlement(harrowgate, veyra).unwrap();

    let reverted = campaign.structure(upgrade).unwrap();
    assert_eq!(reverted.definition, "smithy");
    assert_eq!(reverted.applied_level, 1);
    assert_eq!(reverted.state, StructureState::Working);

    let notifications = campaign.drain_notifications();
    assert!(notifications.iter().any(|n| matches!(
        n,
        ChangeNotification::StructuresChanged { dominion, reverted, .. }
            if *dominion == veyra && reverted.contains(&upgrade)
    )));
}

#[test]
fn unfinished_locked_upgrade_is_destroyed() {
    let mut campaign = campaign();
    let (_, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let smithy = campaign.add_structure(harrowgate, "smithy", true).unwrap();

    let upgrade = campaign.begin_upgrade(smithy, "great_smithy").unwrap();
    assert!(campaign.structure(upgrade).is_none());
    assert!(campaign.structure(smithy).is_some());
}

#[test]
fn circular_support_never_works() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let kiln = campaign.add_structure(harrowgate, "kiln", true).unwrap();
    let burner = campaign
        .add_structure(harrowgate, "charcoal_burner", true)
        .unwrap();

    for id in [kiln, burner] {
        assert!(matches!(
            state(&campaign, id),
            StructureState::Stalled | StructureState::Abandoned
        ));
    }

    let before = snapshot(&campaign, aldmark);
    campaign
        .request_recalculation(aldmark, RecalcRequest::default())
        .unwrap();
    assert_eq!(snapshot(&campaign, aldmark), before);
}

#[test]
fn recalculation_is_idempotent() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let eastmarch = campaign.add_settlement(aldmark, "Eastmarch").unwrap();
    {
        let mut batch = campaign.batch("setup");
        for name in ["iron_mine", "smithy", "foundry", "kiln"] {
            batch.add_structure(harrowgate, name, true).unwrap();
        }
        for name in ["salt_pan", "foundry", "charcoal_burner"] {
            batch.add_structure(eastmarch, name, true).unwrap();
        }
        batch.add_importer(aldmark, "tin").unwrap();
    }

    let first = snapshot(&campaign, aldmark);
    campaign
        .request_recalculation(aldmark, RecalcRequest::default())
        .unwrap();
    assert_eq!(snapshot(&campaign, aldmark), first);
}

#[test]
fn nested_requests_recalculate_each_dominion_once() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let (veyra, _) = realm(&mut campaign, "Veyra", "Eastmarch");
    let count = |c: &Campaign, d| c.dominion(d).unwrap().recalculation_count();
    let (a0, v0) = (count(&campaign, aldmark), count(&campaign, veyra));

    {
        let mut outer = campaign.batch("outer");
        outer.add_structure(harrowgate, "iron_mine", true).unwrap();
        outer
            .request_recalculation(aldmark, RecalcRequest::default())
            .unwrap();
        {
            let mut inner = outer.batch("inner");
            inner.add_structure(harrowgate, "smithy", true).unwrap();
            inner
                .request_recalculation(veyra, RecalcRequest::default())
                .unwrap();
            inner
                .request_recalculation(aldmark, RecalcRequest::default())
                .unwrap();
        }
        assert_eq!(count(&*outer, aldmark), a0);
    }

    assert_eq!(count(&campaign, aldmark), a0 + 1);
    assert_eq!(count(&campaign, veyra), v0 + 1);
}

#[test]
fn settlement_specific_request_inside_batch_runs_immediately() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let before = campaign.dominion(aldmark).unwrap().recalculation_count();

    let mut batch = campaign.batch("construction");
    let request = RecalcRequest {
        origin: Some(harrowgate),
        remove_abandoned: None,
    };
    batch.request_recalculation(aldmark, request).unwrap();
    assert_eq!(
        batch.dominion(aldmark).unwrap().recalculation_count(),
        before + 1
    );
    drop(batch);
    let refreshes = campaign
        .pending_notifications()
        .iter()
        .filter(|n| {
            matches!(
                n,
                ChangeNotification::RebellionRiskRefresh { settlement } if *settlement == harrowgate
            )
        })
        .count();
    assert_eq!(refreshes, 1);
}

#[test]
fn transfer_moves_index_entries_and_eliminates_loser() {
    let mut campaign = campaign();
    let (aldmark, _) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let (veyra, eastmarch) = realm(&mut campaign, "Veyra", "Eastmarch");
    let smithy = campaign.add_structure(eastmarch, "smithy", true).unwrap();
    assert!(index(&campaign, veyra).contains("iron", smithy));
    campaign.drain_notifications();

    campaign.transfer_settlement(eastmarch, aldmark).unwrap();

    assert_eq!(campaign.owner_of(eastmarch), Some(aldmark));
    assert!(index(&campaign, veyra).is_empty());
    assert!(index(&campaign, aldmark).contains("iron", smithy));

    let conclusion = campaign.conclusion().unwrap();
    assert_eq!(conclusion.winner, aldmark);
    assert_eq!(conclusion.loser, veyra);
    assert_eq!(conclusion.reason, "Aldmark eliminated Veyra");
    assert_eq!(conclusion.arbiter, "elimination");

    let concluded = campaign
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, ChangeNotification::GameConcluded { .. }))
        .count();
    assert_eq!(concluded, 1);
}

#[test]
fn transient_loss_inside_batch_does_not_conclude() {
    let mut campaign = campaign();
    let (aldmark, _) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let (veyra, eastmarch) = realm(&mut campaign, "Veyra", "Eastmarch");
    {
        let mut batch = campaign.batch("border skirmish");
        batch.transfer_settlement(eastmarch, aldmark).unwrap();
        batch.transfer_settlement(eastmarch, veyra).unwrap();
        assert!(batch.conclusion().is_none());
    }
    assert!(campaign.conclusion().is_none());
    assert_eq!(campaign.owner_of(eastmarch), Some(veyra));
}

#[test]
fn only_first_conclusive_validation_counts() {
    let mut campaign = campaign();
    let (aldmark, _) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let veyra = campaign.add_dominion("Veyra");
    let eastmarch = campaign.add_settlement(veyra, "Eastmarch").unwrap();
    let westmarch = campaign.add_settlement(veyra, "Westmarch").unwrap();
    campaign.drain_notifications();
    {
        let mut batch = campaign.batch("conquest");
        batch.transfer_settlement(eastmarch, aldmark).unwrap();
        batch.transfer_settlement(westmarch, aldmark).unwrap();
    }
    let concluded = campaign
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, ChangeNotification::GameConcluded { .. }))
        .count();
    assert_eq!(concluded, 1);
    assert_eq!(campaign.conclusion().unwrap().loser, veyra);
}

#[test]
fn one_notification_per_aspect_per_flush() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    campaign.drain_notifications();
    {
        let mut batch = campaign.batch("bulk construction");
        for _ in 0..4 {
            batch.add_structure(harrowgate, "smithy", true).unwrap();
        }
        batch.add_structure(harrowgate, "salt_pan", true).unwrap();
    }

    let notifications = campaign.drain_notifications();
    let mut per_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for n in &notifications {
        let kind = match n {
            ChangeNotification::StructuresChanged { dominion, .. } => {
                assert_eq!(*dominion, aldmark);
                "structures"
            }
            ChangeNotification::MissingResourcesChanged { .. } => "missing",
            ChangeNotification::AvailabilityInvalidated { .. } => "availability",
            ChangeNotification::RebellionRiskRefresh { .. } => "rebellion",
            ChangeNotification::GameConcluded { .. } => "concluded",
        };
        *per_kind.entry(kind).or_default() += 1;
    }
    assert!(per_kind.values().all(|&n| n == 1), "{per_kind:?}");
    assert_eq!(per_kind.get("structures"), Some(&1));
    assert_eq!(per_kind.get("missing"), Some(&1));
}

// ---------------------------------------------------------------------------
// Advisory queries
// ---------------------------------------------------------------------------

#[test]
fn composite_availability_respects_and_or_lattice() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    campaign.add_structure(harrowgate, "iron_mine", true).unwrap();
    campaign.add_importer(aldmark, "tin").unwrap();

    let scope = Scope::Settlement(harrowgate);
    let composite = campaign
        .availability(aldmark, scope, &Target::Structure(String::from("foundry")))
        .unwrap();
    let breakdown = campaign
        .requirement_breakdown(aldmark, scope, "foundry")
        .unwrap();
    assert_eq!(breakdown.len(), 4);

    let worst_required = breakdown
        .iter()
        .filter(|p| matches!(p.prerequisite, dominion_world::Prerequisite::Required { .. }))
        .map(|p| p.availability)
        .max()
        .unwrap();
    let best_alternative = breakdown
        .iter()
        .filter(|p| matches!(p.prerequisite, dominion_world::Prerequisite::Alternative { .. }))
        .map(|p| p.availability)
        .min()
        .unwrap();

    assert_eq!(worst_required, Availability::DirectlyObtainable);
    assert_eq!(best_alternative, Availability::Available);
    assert!(composite.availability >= worst_required);
    assert_eq!(composite.availability, Availability::IndirectlyObtainable);
    assert!(composite.availability <= composite.own_availability);
}

#[test]
fn availability_cache_follows_mutations() {
    let mut campaign = campaign();
    let (aldmark, harrowgate) = realm(&mut campaign, "Aldmark", "Harrowgate");
    let iron = Target::Resource(String::from("iron"));

    let before = campaign
        .availability(aldmark, Scope::Dominion, &iron)
        .unwrap();
    assert_eq!(before.availability, Availability::DirectlyObtainable);

    campaign.add_structure(harrowgate, "iron_mine", true).unwrap();
    let after = campaign
        .availability(aldmark, Scope::Dominion, &iron)
        .unwrap();
    assert_eq!(after.availability, Availability::Available);
    assert!(after.version > before.version);
}
