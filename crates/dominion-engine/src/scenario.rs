//! Scenario files: content, starting holdings, and scripted events.
//!
//! A scenario is a YAML document with three sections:
//!
//! - `catalog`: structure and district definitions,
//! - `dominions`: each dominion's religion tags, unlocked upgrades, trade
//!   importers and settlements (with their conditions and structures),
//! - `transfers`: settlements changing hands after the initial settle.
//!
//! Everything is addressed by name; [`Scenario::build`] resolves names to
//! IDs and loads the starting state inside a single batch.

use std::collections::BTreeMap;
use std::path::Path;

use dominion_core::{Campaign, EngineConfig};
use dominion_types::SettlementId;
use dominion_world::{Catalog, CatalogData, StaticConditions};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Model
// -----------------------------------------------------------------------

/// A complete scenario file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    /// Content definitions.
    #[serde(default)]
    pub catalog: CatalogData,

    /// Starting dominions.
    #[serde(default)]
    pub dominions: Vec<DominionSetup>,

    /// Settlement transfers applied after the starting state settles.
    #[serde(default)]
    pub transfers: Vec<TransferSetup>,
}

/// Starting state of one dominion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DominionSetup {
    /// Display name, unique within the scenario.
    pub name: String,

    /// Religion tags the dominion holds.
    #[serde(default)]
    pub religion_tags: Vec<String>,

    /// Upgrade definitions the dominion may build.
    #[serde(default)]
    pub unlocked_upgrades: Vec<String>,

    /// Resources imported by trade, one unit per entry.
    #[serde(default)]
    pub importers: Vec<String>,

    /// Owned settlements.
    #[serde(default)]
    pub settlements: Vec<SettlementSetup>,
}

/// Starting state of one settlement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettlementSetup {
    /// Display name, unique within the scenario.
    pub name: String,

    /// Whether an enemy occupies the settlement.
    #[serde(default)]
    pub occupied: bool,

    /// Whether the settlement is in disorder.
    #[serde(default)]
    pub in_disorder: bool,

    /// Whether the settlement has a citadel.
    #[serde(default)]
    pub citadel: bool,

    /// Structures standing or under construction.
    #[serde(default)]
    pub structures: Vec<StructureSetup>,
}

/// One structure in a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructureSetup {
    /// Definition ID.
    pub definition: String,

    /// Whether construction has finished.
    #[serde(default = "default_completed")]
    pub completed: bool,
}

/// A settlement changing hands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferSetup {
    /// Settlement name.
    pub settlement: String,

    /// Name of the receiving dominion.
    pub to: String,
}

const fn default_completed() -> bool {
    true
}

// -----------------------------------------------------------------------
// Loading
// -----------------------------------------------------------------------

/// Settlement names resolved to IDs.
pub type SettlementNames = BTreeMap<String, SettlementId>;

impl Scenario {
    /// Load a scenario from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read, or
    /// [`EngineError::Yaml`] if it does not match the scenario model.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a scenario from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Yaml`] if the string does not match the
    /// scenario model.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Create the campaign and load the starting state in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Campaign`] if a structure names an unknown
    /// definition or an unlocked upgrade is not an upgrade.
    pub fn build(
        &self,
        config: EngineConfig,
    ) -> Result<(Campaign, SettlementNames), EngineError> {
        let catalog = Catalog::from(self.catalog.clone());
        let mut campaign = Campaign::new(catalog, StaticConditions::new(), config);
        let mut names = SettlementNames::new();
        {
            let mut batch = campaign.batch("scenario load");
            for setup in &self.dominions {
                let dominion = batch.add_dominion(&setup.name);
                for tag in &setup.religion_tags {
                    batch.conditions_mut().grant_religion_tag(dominion, tag);
                }
                for upgrade in &setup.unlocked_upgrades {
                    batch.unlock_upgrade(dominion, upgrade)?;
                }
                for resource in &setup.importers {
                    batch.add_importer(dominion, resource)?;
                }
                for settlement in &setup.settlements {
                    let id = batch.add_settlement(dominion, &settlement.name)?;
                    let conditions = batch.conditions_mut();
                    conditions.set_occupied(id, settlement.occupied);
                    conditions.set_disorder(id, settlement.in_disorder);
                    conditions.set_citadel(id, settlement.citadel);
                    for structure in &settlement.structures {
                        batch.add_structure(id, &structure.definition, structure.completed)?;
                    }
                    if names.insert(settlement.name.clone(), id).is_some() {
                        warn!(name = %settlement.name, "duplicate settlement name in scenario");
                    }
                }
                batch.conditions_changed(dominion)?;
            }
        }
        info!(
            dominions = self.dominions.len(),
            settlements = names.len(),
            definitions = campaign.catalog().len(),
            "scenario loaded"
        );
        Ok((campaign, names))
    }

    /// Apply the scripted transfers inside one batch.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSettlement`] or
    /// [`EngineError::UnknownDominion`] for names the scenario never
    /// declared, or [`EngineError::Campaign`] if a transfer is rejected.
    pub fn apply_transfers(
        &self,
        campaign: &mut Campaign,
        names: &SettlementNames,
    ) -> Result<(), EngineError> {
        if self.transfers.is_empty() {
            return Ok(());
        }
        let mut batch = campaign.batch("scripted transfers");
        for transfer in &self.transfers {
            let settlement = names.get(&transfer.settlement).copied().ok_or_else(|| {
                EngineError::UnknownSettlement {
                    name: transfer.settlement.clone(),
                }
            })?;
            let to = batch
                .dominion_named(&transfer.to)
                .map(|d| d.id)
                .ok_or_else(|| EngineError::UnknownDominion {
                    name: transfer.to.clone(),
                })?;
            batch.transfer_settlement(settlement, to)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use dominion_types::StructureState;

    use super::*;

    const SHIPPED: &str = include_str!("../../../scenarios/border_march.yaml");

    const SMALL: &str = r"
catalog:
  structures:
    - id: iron_mine
      produces:
        - resource: iron
          amount: 1
    - id: smithy
      districts:
        - requires:
            - kind: resource
              name: iron
dominions:
  - name: Aldmark
    settlements:
      - name: Harrowgate
        structures:
          - definition: smithy
  - name: Veyra
    settlements:
      - name: Eastmarch
        structures:
          - definition: iron_mine
transfers:
  - settlement: Eastmarch
    to: Aldmark
";

    #[test]
    fn small_scenario_builds_and_settles() {
        let scenario = Scenario::parse(SMALL).unwrap();
        let (mut campaign, names) = scenario.build(EngineConfig::default()).unwrap();
        let aldmark = campaign.dominion_named("Aldmark").unwrap();
        let smithy = aldmark.structures().next().unwrap().id;
        assert_eq!(
            campaign.structure(smithy).unwrap().state,
            StructureState::Stalled
        );

        scenario.apply_transfers(&mut campaign, &names).unwrap();
        assert_eq!(
            campaign.structure(smithy).unwrap().state,
            StructureState::Working
        );
        assert_eq!(campaign.conclusion().unwrap().reason, "Aldmark eliminated Veyra");
    }

    #[test]
    fn unknown_transfer_target_is_reported() {
        let mut scenario = Scenario::parse(SMALL).unwrap();
        scenario.transfers[0].to = String::from("Nowhere");
        let (mut campaign, names) = scenario.build(EngineConfig::default()).unwrap();
        assert!(matches!(
            scenario.apply_transfers(&mut campaign, &names),
            Err(EngineError::UnknownDominion { .. })
        ));
    }

    #[test]
    fn shipped_scenario_is_valid() {
        let scenario = Scenario::parse(SHIPPED).unwrap();
        let catalog = Catalog::from(scenario.catalog.clone());
        assert!(catalog.validate().is_empty(), "{:?}", catalog.validate());
        let (mut campaign, names) = scenario.build(EngineConfig::default()).unwrap();
        scenario.apply_transfers(&mut campaign, &names).unwrap();
        assert_eq!(campaign.dominions().len(), scenario.dominions.len());
    }
}
