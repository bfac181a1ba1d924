//! Batch coordinator: coalescing recalculations within one transaction.
//!
//! A single mutation such as a settlement changing owner cascades into
//! many structure and condition updates, each of which asks for a full
//! recalculation. Inside a batch those requests are recorded instead of
//! run, and the outermost [`BatchScope`] flushes them when it drops:
//!
//! - each distinct dominion is recalculated once, in first-request order,
//! - end-game validations then run in request order, stopping at the first
//!   one that concludes the game.
//!
//! Acquisition nests. Only the outermost release flushes, and the depth is
//! held at one while flushing so requests raised by the flush itself are
//! deferred into the next round rather than run re-entrantly.

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use dominion_types::{DominionId, SettlementId};
use tracing::{debug, warn};

use crate::arbiter::EndGameArbiter;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Parameters of a recalculation request.
///
/// The default request is the only kind that can be deferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalcRequest {
    /// Settlement whose change triggered the request, for a localized
    /// rebellion-risk refresh.
    pub origin: Option<SettlementId>,
    /// Override of the configured remove-on-abandon policy.
    pub remove_abandoned: Option<bool>,
}

impl RecalcRequest {
    /// Whether the request carries no caller-specific parameters.
    pub const fn is_default(&self) -> bool {
        self.origin.is_none() && self.remove_abandoned.is_none()
    }
}

/// What the caller must do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// No batch is open (or the request cannot wait): run it now.
    RunNow,
    /// Recorded; the batch flush will run it.
    Deferred,
}

/// A queued end-game validation.
#[derive(Clone)]
pub struct PendingValidation {
    /// The dominion that gained.
    pub winner: DominionId,
    /// The dominion that lost.
    pub loser: DominionId,
    /// Who decides.
    pub arbiter: Rc<dyn EndGameArbiter>,
}

impl core::fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingValidation")
            .field("winner", &self.winner)
            .field("loser", &self.loser)
            .field("arbiter", &self.arbiter.name())
            .finish()
    }
}

/// Work collected by one flush round.
#[derive(Debug, Default)]
pub struct PendingBatch {
    /// Dominions to recalculate, in first-request order.
    pub recalculations: Vec<DominionId>,
    /// Validations, in request order.
    pub validations: Vec<PendingValidation>,
}

impl PendingBatch {
    /// Whether the round has nothing to do.
    pub fn is_empty(&self) -> bool {
        self.recalculations.is_empty() && self.validations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Nesting depth and pending work of the current batch.
#[derive(Debug, Default)]
pub struct BatchCoordinator {
    depth: u32,
    pending_recalc: Vec<DominionId>,
    pending_validations: Vec<PendingValidation>,
    flushes: u64,
}

impl BatchCoordinator {
    /// Create a coordinator with no open batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth.
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether a batch is open.
    pub const fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Number of outermost releases that flushed.
    pub const fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// Open (or nest into) a batch.
    pub fn acquire(&mut self, reason: &str) {
        self.depth = self.depth.saturating_add(1);
        debug!(depth = self.depth, reason, "batch acquired");
    }

    /// Release one level.
    ///
    /// Returns `true` when this was the outermost level; the depth then
    /// stays at one until [`BatchCoordinator::finish_flush`] so the flush
    /// itself runs inside the batch.
    pub fn release(&mut self) -> bool {
        match self.depth {
            0 => {
                warn!("batch released without a matching acquire");
                false
            }
            1 => true,
            _ => {
                self.depth = self.depth.saturating_sub(1);
                false
            }
        }
    }

    /// Close the batch after the outermost flush.
    pub fn finish_flush(&mut self) {
        self.depth = 0;
        self.flushes = self.flushes.saturating_add(1);
    }

    /// Ask for a full recalculation of `dominion`.
    ///
    /// Inside a batch a default request is recorded once per dominion. A
    /// request with caller-specific parameters cannot be merged, so it is
    /// logged and run immediately.
    pub fn request_recalculation(
        &mut self,
        dominion: DominionId,
        request: &RecalcRequest,
    ) -> Disposition {
        if self.depth == 0 {
            return Disposition::RunNow;
        }
        if !request.is_default() {
            warn!(
                %dominion,
                ?request,
                depth = self.depth,
                "non-default recalculation requested inside an open batch, running immediately"
            );
            return Disposition::RunNow;
        }
        if !self.pending_recalc.contains(&dominion) {
            self.pending_recalc.push(dominion);
        }
        Disposition::Deferred
    }

    /// Ask for an end-game validation between two dominions.
    pub fn request_validation(
        &mut self,
        winner: DominionId,
        loser: DominionId,
        arbiter: Rc<dyn EndGameArbiter>,
    ) -> Disposition {
        if self.depth == 0 {
            return Disposition::RunNow;
        }
        self.pending_validations.push(PendingValidation {
            winner,
            loser,
            arbiter,
        });
        Disposition::Deferred
    }

    /// Take everything recorded so far.
    pub fn take_pending(&mut self) -> PendingBatch {
        PendingBatch {
            recalculations: std::mem::take(&mut self.pending_recalc),
            validations: std::mem::take(&mut self.pending_validations),
        }
    }

    /// Whether anything is waiting for the flush.
    pub fn has_pending(&self) -> bool {
        !self.pending_recalc.is_empty() || !self.pending_validations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scope guard
// ---------------------------------------------------------------------------

/// Something that owns a [`BatchCoordinator`] and knows how to flush it.
pub trait BatchHost {
    /// The coordinator.
    fn coordinator(&mut self) -> &mut BatchCoordinator;

    /// Run everything pending. Called with the batch still open.
    fn flush_batch(&mut self);
}

/// An open batch level. Dropping the outermost scope flushes.
///
/// Dereferences to the host so mutations can be issued through it.
pub struct BatchScope<'h, H: BatchHost> {
    host: &'h mut H,
}

impl<'h, H: BatchHost> BatchScope<'h, H> {
    /// Open (or nest into) a batch on `host`.
    pub fn acquire(host: &'h mut H, reason: &str) -> Self {
        host.coordinator().acquire(reason);
        Self { host }
    }
}

impl<H: BatchHost> Deref for BatchScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: BatchHost> DerefMut for BatchScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: BatchHost> Drop for BatchScope<'_, H> {
    fn drop(&mut self) {
        if self.host.coordinator().release() {
            self.host.flush_batch();
            self.host.coordinator().finish_flush();
        }
    }
}
