//! Enumeration types for the Dominion structure engine.
//!
//! Two orderings matter here:
//!
//! - [`Verdict`] orders evaluator outcomes by restrictiveness
//!   (`Working < Stalled < Abandoned`), so "the worst of" is `max`.
//! - [`Availability`] orders hypothetical reachability
//!   (`Available < DirectlyObtainable < IndirectlyObtainable < Impossible`),
//!   so an AND-list aggregates with `max` and an OR-list with `min`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::SettlementId;

// ---------------------------------------------------------------------------
// Persisted structure state
// ---------------------------------------------------------------------------

/// The persisted operating state of a structure.
///
/// Only finalization writes this value. The evaluator produces a
/// [`Verdict`], which finalization maps onto one of the first three
/// variants; [`StructureState::TemporaryDeactivated`] exists solely as the
/// intermediate step of a Working-to-Working pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum StructureState {
    /// All prerequisites hold and the structure yields its production.
    Working,
    /// Prerequisites are structurally present but something transient
    /// (resources, occupation, disorder, unfinished parent) blocks it.
    #[default]
    Stalled,
    /// A hard prerequisite is gone; the structure cannot work as built.
    Abandoned,
    /// Momentarily switched off so dependents observe a transition.
    TemporaryDeactivated,
}

impl core::fmt::Display for StructureState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Working => "working",
            Self::Stalled => "stalled",
            Self::Abandoned => "abandoned",
            Self::TemporaryDeactivated => "temporary_deactivated",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Evaluator verdict
// ---------------------------------------------------------------------------

/// The outcome of evaluating a structure within one recalculation pass.
///
/// Variants are declared from least to most restrictive, so the derived
/// [`Ord`] lets callers combine contributions with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The structure works.
    Working,
    /// The structure is blocked by something recoverable.
    Stalled,
    /// The structure lost a hard prerequisite.
    Abandoned,
}

impl Verdict {
    /// Return the more restrictive of two verdicts.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Return the less restrictive of two verdicts.
    #[must_use]
    pub fn best(self, other: Self) -> Self {
        self.min(other)
    }

    /// Whether the structure is blocked (stalled or abandoned).
    pub const fn is_blocked(self) -> bool {
        !matches!(self, Self::Working)
    }
}

impl From<Verdict> for StructureState {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Working => Self::Working,
            Verdict::Stalled => Self::Stalled,
            Verdict::Abandoned => Self::Abandoned,
        }
    }
}

// ---------------------------------------------------------------------------
// Availability lattice
// ---------------------------------------------------------------------------

/// Hypothetical reachability of a resource or structure.
///
/// Ignores transient blockers such as occupation and disorder. Declared
/// from best to worst so that [`Ord`] matches the aggregation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Present right now.
    Available,
    /// Obtainable with one step (everything it needs is already available).
    DirectlyObtainable,
    /// Obtainable, but only after other things are obtained first.
    IndirectlyObtainable,
    /// Not obtainable from the current state.
    Impossible,
}

impl Availability {
    /// AND aggregation: a composite is only as reachable as its worst member.
    ///
    /// An empty list imposes no constraint and yields [`Availability::Available`].
    pub fn all<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        items.into_iter().max().unwrap_or(Self::Available)
    }

    /// OR aggregation: a composite needs only its easiest alternative.
    ///
    /// An empty list imposes no constraint and yields [`Availability::Available`].
    pub fn any<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        items.into_iter().min().unwrap_or(Self::Available)
    }

    /// Return the worse of two availabilities.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// Return the better of two availabilities.
    #[must_use]
    pub fn best(self, other: Self) -> Self {
        self.min(other)
    }

    /// Availability of something whose prerequisites aggregate to `self`.
    ///
    /// Met prerequisites make the thing one step away; prerequisites that
    /// are themselves only obtainable push it to indirect.
    #[must_use]
    pub const fn one_step_further(self) -> Self {
        match self {
            Self::Available => Self::DirectlyObtainable,
            Self::DirectlyObtainable | Self::IndirectlyObtainable => Self::IndirectlyObtainable,
            Self::Impossible => Self::Impossible,
        }
    }
}

impl core::fmt::Display for Availability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Available => "available",
            Self::DirectlyObtainable => "directly_obtainable",
            Self::IndirectlyObtainable => "indirectly_obtainable",
            Self::Impossible => "impossible",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Availability scope
// ---------------------------------------------------------------------------

/// The scope an availability query is asked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// A single settlement of the dominion.
    Settlement(SettlementId),
    /// The dominion as a whole.
    Dominion,
}
