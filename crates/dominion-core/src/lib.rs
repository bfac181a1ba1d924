//! Dominion orchestration, batching, and recalculation.
//!
//! This crate drives the evaluators in `dominion-world` for a whole game:
//! it owns every dominion, turns mutations into recalculation requests,
//! coalesces those requests inside batches, and publishes what changed.
//!
//! # Modules
//!
//! - [`arbiter`] -- [`EndGameArbiter`] trait and [`EliminationArbiter`].
//! - [`batch`] -- [`BatchCoordinator`] and the [`BatchScope`] guard.
//! - [`campaign`] -- [`Campaign`]: the mutation and query entry point.
//! - [`config`] -- Configuration loading from `dominion-config.yaml` into
//!   strongly-typed structs.
//! - [`dominion`] -- [`Dominion`] and its full recalculation.
//! - [`error`] -- Error types for campaign mutations and lookups.
//! - [`notify`] -- [`ChangeNotification`]s coalesced in an [`Outbox`].

pub mod arbiter;
pub mod batch;
pub mod campaign;
pub mod config;
pub mod dominion;
pub mod error;
pub mod notify;

pub use arbiter::{EliminationArbiter, EndGameArbiter, EndGameOutcome};
pub use batch::{
    BatchCoordinator, BatchHost, BatchScope, Disposition, PendingBatch, PendingValidation,
    RecalcRequest,
};
pub use campaign::{Campaign, Conclusion};
pub use config::{ConfigError, EngineConfig};
pub use dominion::{Dominion, RecalcPolicy, RecalcReport};
pub use error::CampaignError;
pub use notify::{ChangeNotification, Outbox, StateTransition};
