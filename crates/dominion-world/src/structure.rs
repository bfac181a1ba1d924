//! Runtime structure instances.
//!
//! A [`Structure`] is one building inside a settlement. It references its
//! [`StructureDefinition`] by ID and carries the persisted state the
//! finalization step writes. Nothing here is pass-scoped: memoization and
//! cycle markers live in the evaluator's pass context, never on the
//! structure itself.

use dominion_types::{StructureDefinition, StructureId, StructureState};
use serde::{Deserialize, Serialize};

/// A building placed in a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Unique structure ID.
    pub id: StructureId,
    /// The definition currently in effect.
    pub definition: String,
    /// State written by the last finalization.
    pub state: StructureState,
    /// Whether construction has finished.
    pub completed: bool,
    /// Effective level applied by the last finalization.
    pub applied_level: u32,
    /// Whether the conditional bonus was applied by the last finalization.
    pub bonus_active: bool,
    /// For an upgrade under construction, the structure it will replace.
    pub replaces: Option<StructureId>,
}

impl Structure {
    /// A structure whose construction has just started.
    pub fn planned(definition: &StructureDefinition) -> Self {
        Self {
            id: StructureId::new(),
            definition: definition.id.clone(),
            state: StructureState::Stalled,
            completed: false,
            applied_level: definition.level,
            bonus_active: false,
            replaces: None,
        }
    }

    /// A structure that already stands.
    pub fn completed(definition: &StructureDefinition) -> Self {
        Self {
            completed: true,
            ..Self::planned(definition)
        }
    }

    /// An upgrade under construction that will replace `base`.
    pub fn upgrade(definition: &StructureDefinition, base: StructureId) -> Self {
        Self {
            replaces: Some(base),
            ..Self::planned(definition)
        }
    }

    /// Mark construction finished.
    pub const fn complete(&mut self) {
        self.completed = true;
        self.replaces = None;
    }

    /// Whether this is an upgrade that has not replaced its base yet.
    pub const fn is_pending_upgrade(&self) -> bool {
        self.replaces.is_some()
    }

    /// Roll an established upgrade back to its base definition.
    ///
    /// The state becomes `Abandoned` until the next pass evaluates the base.
    pub fn revert_to(&mut self, base: &StructureDefinition) {
        self.definition.clone_from(&base.id);
        self.state = StructureState::Abandoned;
        self.applied_level = base.level;
        self.bonus_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_structure_starts_stalled() {
        let def = StructureDefinition::new("granary");
        let structure = Structure::planned(&def);
        assert_eq!(structure.definition, "granary");
        assert_eq!(structure.state, StructureState::Stalled);
        assert!(!structure.completed);
        assert_eq!(structure.applied_level, 1);
    }

    #[test]
    fn completing_an_upgrade_clears_replacement() {
        let base = Structure::completed(&StructureDefinition::new("smithy"));
        let mut upgrade = Structure::upgrade(&StructureDefinition::new("great_smithy"), base.id);
        assert!(upgrade.is_pending_upgrade());

        upgrade.complete();
        assert!(upgrade.completed);
        assert!(!upgrade.is_pending_upgrade());
    }

    #[test]
    fn revert_restores_base_definition() {
        let mut great = StructureDefinition::new("great_smithy");
        great.level = 2;
        let mut structure = Structure::completed(&great);
        structure.state = StructureState::Working;
        structure.bonus_active = true;

        structure.revert_to(&StructureDefinition::new("smithy"));
        assert_eq!(structure.definition, "smithy");
        assert_eq!(structure.applied_level, 1);
        assert_eq!(structure.state, StructureState::Abandoned);
        assert!(!structure.bonus_active);
        assert!(structure.completed);
    }
}
