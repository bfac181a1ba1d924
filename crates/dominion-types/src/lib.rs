//! Shared type definitions for the Dominion structure dependency engine.
//!
//! This crate is the single source of truth for the types used across the
//! workspace. UI-facing types (identifiers, states, availability) derive
//! `ts-rs` bindings for the advisory layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for runtime entities
//! - [`enums`] -- Structure states, evaluator verdicts, the availability
//!   lattice and query scopes
//! - [`structs`] -- Static content: structure and district definitions,
//!   requirements, yields, importers

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Availability, Scope, StructureState, Verdict};
pub use ids::{DominionId, ImporterId, SettlementId, StructureId};
pub use structs::{
    DistrictDefinition, DistrictMembership, Importer, Requirement, ResourceYield,
    StructureDefinition,
};
