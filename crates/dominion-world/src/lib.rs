//! Settlements, structures, and dependency resolution for Dominion.
//!
//! This crate holds the runtime model of a dominion's holdings and the two
//! graph evaluators that run over it: the structure state evaluator, which
//! decides what is working right now, and the availability oracle, which
//! decides what could ever be built.
//!
//! # Modules
//!
//! - [`availability`] -- [`AvailabilityOracle`]: two-track reachability
//!   over the availability lattice, versioned per-scope caches.
//! - [`catalog`] -- [`Catalog`] of structure and district definitions with
//!   producer lookup and content validation.
//! - [`conditions`] -- [`RealmConditions`] predicates supplied by the
//!   occupation and religion subsystems.
//! - [`error`] -- Error types for settlement mutations and lookups.
//! - [`evaluator`] -- [`StructureEvaluator`] and its per-pass
//!   [`PassContext`].
//! - [`missing`] -- [`MissingResourceIndex`] of structures blocked on a
//!   resource shortage.
//! - [`registry`] -- [`ProducerRegistry`], rebuilt every pass.
//! - [`settlement`] -- [`Settlement`]: ordered structures and the
//!   settlement availability cache.
//! - [`structure`] -- [`Structure`] instances and their persisted state.
//! - [`view`] -- [`DominionView`], the borrowed snapshot both evaluators
//!   read.

pub mod availability;
pub mod catalog;
pub mod conditions;
pub mod error;
pub mod evaluator;
pub mod missing;
pub mod registry;
pub mod settlement;
pub mod structure;
pub mod view;

pub use availability::{
    AvailabilityCache, AvailabilityOracle, AvailabilityRecord, Prerequisite,
    PrerequisiteStatus, ProducerRef, Target,
};
pub use catalog::{Catalog, CatalogData};
pub use conditions::{RealmConditions, StaticConditions};
pub use error::WorldError;
pub use evaluator::{PassContext, PassOutcome, Resolution, StructureEvaluator};
pub use missing::MissingResourceIndex;
pub use registry::{Memo, ProducerEntry, ProducerRegistry};
pub use settlement::Settlement;
pub use structure::Structure;
pub use view::DominionView;
