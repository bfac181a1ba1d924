//! Scenario runner for the Dominion structure dependency engine.
//!
//! Loads a scenario, settles it, and reports what the engine decided:
//! structure states, the missing-resource index, the configured
//! availability queries, and the change notifications a replication layer
//! would receive.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `dominion-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the scenario and settle the starting state in one batch
//! 4. Apply the scripted transfers in a second batch
//! 5. Report states, shortages, queries, and notifications

mod error;
mod scenario;

use std::path::Path;

use dominion_core::config::QueryConfig;
use dominion_core::{Campaign, EngineConfig};
use dominion_types::Scope;
use dominion_world::Target;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::scenario::{Scenario, SettlementNames};

/// Application entry point for the scenario runner.
///
/// # Errors
///
/// Returns an error if the configuration or scenario cannot be loaded, or
/// the scenario refers to something it never declares.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("dominion-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        scenario = %config.scenario.path.display(),
        remove_abandoned = config.recalculation.remove_abandoned,
        max_followup_passes = config.recalculation.max_followup_passes,
        max_flush_rounds = config.batch.max_flush_rounds,
        "Configuration loaded"
    );

    // 3. Load and settle the scenario.
    let scenario = Scenario::from_file(&config.scenario.path)?;
    let (mut campaign, names) = scenario.build(config.clone())?;
    report_structures(&campaign, "initial");

    // 4. Scripted transfers.
    scenario.apply_transfers(&mut campaign, &names)?;
    if !scenario.transfers.is_empty() {
        report_structures(&campaign, "after transfers");
    }

    // 5. Shortages, queries, notifications.
    report_missing(&campaign);
    for query in &config.scenario.queries {
        run_query(&campaign, &names, query)?;
    }

    let notifications = campaign.drain_notifications();
    info!(count = notifications.len(), "Change notifications");
    for notification in &notifications {
        let json = serde_json::to_string(notification)?;
        debug!(notification = %json, "notification");
    }

    match campaign.conclusion() {
        Some(conclusion) => info!(
            winner = %conclusion.winner,
            loser = %conclusion.loser,
            arbiter = %conclusion.arbiter,
            reason = %conclusion.reason,
            "Game concluded"
        ),
        None => info!("Game continues"),
    }

    info!("dominion-engine finished");
    Ok(())
}

/// Load configuration from `dominion-config.yaml`.
///
/// Returns the configuration and whether it came from the file.
fn load_config() -> Result<(EngineConfig, bool), EngineError> {
    let config_path = Path::new("dominion-config.yaml");
    if config_path.exists() {
        Ok((EngineConfig::from_file(config_path)?, true))
    } else {
        Ok((EngineConfig::parse("")?, false))
    }
}

/// Log every structure's settled state.
fn report_structures(campaign: &Campaign, stage: &str) {
    for dominion in campaign.dominions().values() {
        for settlement in dominion.settlements() {
            for structure in settlement.structures() {
                info!(
                    stage,
                    dominion = %dominion.name,
                    settlement = %settlement.name,
                    definition = %structure.definition,
                    state = ?structure.state,
                    level = structure.applied_level,
                    bonus = structure.bonus_active,
                    completed = structure.completed,
                    "structure"
                );
            }
        }
    }
}

/// Log each dominion's missing-resource index.
fn report_missing(campaign: &Campaign) {
    for dominion in campaign.dominions().values() {
        let index = dominion.missing_resources();
        if index.is_empty() {
            info!(dominion = %dominion.name, "No resource shortages");
            continue;
        }
        for (resource, structures) in index.iter() {
            info!(
                dominion = %dominion.name,
                resource = %resource,
                blocked = structures.len(),
                "Resource shortage"
            );
        }
    }
}

/// Answer one configured availability query.
fn run_query(
    campaign: &Campaign,
    names: &SettlementNames,
    query: &QueryConfig,
) -> Result<(), EngineError> {
    let dominion = campaign
        .dominion_named(&query.dominion)
        .map(|d| d.id)
        .ok_or_else(|| EngineError::UnknownDominion {
            name: query.dominion.clone(),
        })?;
    let scope = match &query.settlement {
        Some(name) => Scope::Settlement(names.get(name).copied().ok_or_else(|| {
            EngineError::UnknownSettlement { name: name.clone() }
        })?),
        None => Scope::Dominion,
    };
    let target = match (&query.resource, &query.structure) {
        (Some(resource), _) => Target::Resource(resource.clone()),
        (None, Some(structure)) => Target::Structure(structure.clone()),
        (None, None) => {
            warn!(dominion = %query.dominion, "query names neither a resource nor a structure");
            return Ok(());
        }
    };

    let record = match campaign.availability(dominion, scope, &target) {
        Ok(record) => record,
        Err(e) => {
            warn!(dominion = %query.dominion, ?target, error = %e, "query skipped");
            return Ok(());
        }
    };
    info!(
        dominion = %query.dominion,
        settlement = query.settlement.as_deref().unwrap_or("*"),
        ?target,
        availability = ?record.availability,
        own_availability = ?record.own_availability,
        producers = record.producer_refs.len(),
        "Availability"
    );

    if let Target::Structure(definition) = &target {
        for status in campaign.requirement_breakdown(dominion, scope, definition)? {
            debug!(
                definition = %definition,
                prerequisite = ?status.prerequisite,
                availability = ?status.availability,
                own_availability = ?status.own_availability,
                "prerequisite"
            );
        }
    }
    Ok(())
}
