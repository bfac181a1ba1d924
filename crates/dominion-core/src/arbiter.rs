//! End-game arbiters.
//!
//! When a settlement changes hands the loser may have been eliminated.
//! That check must not run mid-cascade, so it is queued as a validation
//! request and performed by an [`EndGameArbiter`] once the batch has
//! settled every recalculation.

use std::collections::BTreeMap;

use dominion_types::DominionId;

use crate::dominion::Dominion;

/// Result of an end-game validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndGameOutcome {
    /// The game goes on.
    Continue,
    /// The game is over.
    Concluded {
        /// Human-readable reason.
        reason: String,
    },
}

/// Decides whether a change between two dominions ended the game.
pub trait EndGameArbiter {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Inspect the settled campaign state.
    fn validate(
        &self,
        winner: DominionId,
        loser: DominionId,
        dominions: &BTreeMap<DominionId, Dominion>,
    ) -> EndGameOutcome;
}

/// Concludes the game when the loser holds no settlements.
#[derive(Debug, Clone, Copy, Default)]
pub struct EliminationArbiter;

impl EndGameArbiter for EliminationArbiter {
    fn name(&self) -> &str {
        "elimination"
    }

    fn validate(
        &self,
        winner: DominionId,
        loser: DominionId,
        dominions: &BTreeMap<DominionId, Dominion>,
    ) -> EndGameOutcome {
        let eliminated = dominions
            .get(&loser)
            .is_none_or(|d| d.settlements().is_empty());
        if !eliminated {
            return EndGameOutcome::Continue;
        }
        let name = |id: DominionId| {
            dominions
                .get(&id)
                .map_or_else(|| id.to_string(), |d| d.name.clone())
        };
        EndGameOutcome::Concluded {
            reason: format!("{} eliminated {}", name(winner), name(loser)),
        }
    }
}
