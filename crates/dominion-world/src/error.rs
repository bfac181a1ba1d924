//! Error types for the `dominion-world` crate.
//!
//! Only mutation entry points that take identifiers from the caller are
//! fallible. Evaluation and availability queries recover locally and never
//! return errors.

use dominion_types::{SettlementId, StructureId};

/// Errors that can occur while mutating settlements or reading content.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A structure definition was not found in the catalog.
    #[error("unknown structure definition: {0}")]
    UnknownDefinition(String),

    /// A structure was not found in the settlement.
    #[error("structure not found: {0}")]
    StructureNotFound(StructureId),

    /// A settlement was not found.
    #[error("settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    /// The requested definition is not an upgrade of the structure's
    /// current definition.
    #[error("{upgrade} is not an upgrade of {base}")]
    NotAnUpgrade {
        /// The current definition of the structure being upgraded.
        base: String,
        /// The requested upgrade definition.
        upgrade: String,
    },

    /// Construction of the structure has already completed.
    #[error("structure {0} is already completed")]
    AlreadyCompleted(StructureId),

    /// An upgrade can only start from a completed structure.
    #[error("structure {0} is still under construction")]
    UnderConstruction(StructureId),
}
