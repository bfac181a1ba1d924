//! Change notifications for the replication layer.
//!
//! Recalculations and mutations publish [`ChangeNotification`]s into an
//! [`Outbox`]. The outbox coalesces by aspect, so between two drains there
//! is at most one notification per aspect per dominion no matter how many
//! structures changed or how many recalculations ran.

use dominion_types::{DominionId, SettlementId, StructureId, StructureState};
use serde::{Deserialize, Serialize};

/// One persisted state change applied by finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The structure that changed.
    pub structure: StructureId,
    /// The settlement holding it.
    pub settlement: SettlementId,
    /// State before.
    pub from: StructureState,
    /// State after.
    pub to: StructureState,
}

/// A logically changed aspect of the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeNotification {
    /// Structure states changed, or structures were removed.
    StructuresChanged {
        /// The dominion whose structures changed.
        dominion: DominionId,
        /// Every transition, in the order applied.
        transitions: Vec<StateTransition>,
        /// Unfinished upgrades destroyed by finalization.
        removed: Vec<StructureId>,
        /// Finished upgrades reverted to their base definition.
        reverted: Vec<StructureId>,
    },
    /// The missing-resource index changed.
    MissingResourcesChanged {
        /// The dominion whose index changed.
        dominion: DominionId,
    },
    /// Cached availability answers are stale.
    AvailabilityInvalidated {
        /// The dominion whose caches are stale.
        dominion: DominionId,
        /// The new availability version.
        version: u64,
    },
    /// A settlement's rebellion risk should be recomputed.
    RebellionRiskRefresh {
        /// The settlement to refresh.
        settlement: SettlementId,
    },
    /// An end-game arbiter concluded the game.
    GameConcluded {
        /// The winning dominion.
        winner: DominionId,
        /// The losing dominion.
        loser: DominionId,
        /// Why the game ended.
        reason: String,
    },
}

/// Pending notifications, coalesced by aspect.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pending: Vec<ChangeNotification>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification, merging it into a pending one of the same
    /// aspect when possible.
    pub fn publish(&mut self, notification: ChangeNotification) {
        match notification {
            ChangeNotification::StructuresChanged {
                dominion,
                transitions,
                removed,
                reverted,
            } => {
                let existing = self.pending.iter_mut().find_map(|n| match n {
                    ChangeNotification::StructuresChanged {
                        dominion: d,
                        transitions,
                        removed,
                        reverted,
                    } if *d == dominion => Some((transitions, removed, reverted)),
                    _ => None,
                });
                if let Some((pending_transitions, pending_removed, pending_reverted)) = existing {
                    pending_transitions.extend(transitions);
                    pending_removed.extend(removed);
                    pending_reverted.extend(reverted);
                } else {
                    self.pending.push(ChangeNotification::StructuresChanged {
                        dominion,
                        transitions,
                        removed,
                        reverted,
                    });
                }
            }
            ChangeNotification::AvailabilityInvalidated { dominion, version } => {
                let existing = self.pending.iter_mut().find_map(|n| match n {
                    ChangeNotification::AvailabilityInvalidated {
                        dominion: d,
                        version,
                    } if *d == dominion => Some(version),
                    _ => None,
                });
                if let Some(pending_version) = existing {
                    *pending_version = version;
                } else {
                    self.pending
                        .push(ChangeNotification::AvailabilityInvalidated { dominion, version });
                }
            }
            other @ (ChangeNotification::MissingResourcesChanged { .. }
            | ChangeNotification::RebellionRiskRefresh { .. }) => {
                if !self.pending.contains(&other) {
                    self.pending.push(other);
                }
            }
            other @ ChangeNotification::GameConcluded { .. } => self.pending.push(other),
        }
    }

    /// Take every pending notification.
    pub fn drain(&mut self) -> Vec<ChangeNotification> {
        std::mem::take(&mut self.pending)
    }

    /// Pending notifications, oldest first.
    pub fn pending(&self) -> &[ChangeNotification] {
        &self.pending
    }

    /// Number of pending notifications.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
