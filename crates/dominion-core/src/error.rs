//! Error types for the `dominion-core` crate.

use dominion_types::{DominionId, ImporterId, SettlementId};
use dominion_world::WorldError;

/// Errors returned by campaign mutations and lookups.
///
/// Recalculation itself never fails; these only report bad identifiers
/// passed in by callers.
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    /// The dominion does not exist.
    #[error("dominion not found: {0}")]
    DominionNotFound(DominionId),

    /// The settlement is not owned by any dominion.
    #[error("settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    /// The importer does not belong to the dominion.
    #[error("importer {importer} not found in dominion {dominion}")]
    ImporterNotFound {
        /// The dominion searched.
        dominion: DominionId,
        /// The missing importer.
        importer: ImporterId,
    },

    /// A settlement was transferred to the dominion that already owns it.
    #[error("settlement {settlement} already belongs to dominion {dominion}")]
    SameOwner {
        /// The settlement being transferred.
        settlement: SettlementId,
        /// Its current and requested owner.
        dominion: DominionId,
    },

    /// Only upgrade definitions can be unlocked.
    #[error("{0} is not an upgrade definition")]
    NotAnUpgradeDefinition(String),

    /// A settlement or catalog operation failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),
}
