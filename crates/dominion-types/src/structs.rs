//! Static content types: structure definitions, districts, requirements.
//!
//! Definitions are loaded once from content data and shared immutably.
//! They are keyed by `snake_case` string IDs (e.g. `"iron_mine"`), the same
//! way content files refer to each other.

use serde::{Deserialize, Serialize};

use crate::ids::ImporterId;

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// A single prerequisite of a structure.
///
/// Only [`Requirement::Resource`] participates in the memoized recursion of
/// the evaluator; the other kinds are constant-time predicate checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// At least `min_amount` units of a resource must be available to the
    /// dominion.
    Resource {
        /// Resource name (e.g. `"iron"`).
        name: String,
        /// Minimum available amount.
        #[serde(default = "default_min_amount")]
        min_amount: u32,
    },
    /// The dominion must hold a religion tag.
    Religion {
        /// The tag supplied by the religion rule engine.
        tag: String,
    },
    /// The owning settlement must have a citadel.
    Citadel,
    /// A requirement kind this build does not know about.
    ///
    /// Always satisfied, so newer content does not block older engines.
    #[serde(other)]
    Unrecognized,
}

impl Requirement {
    /// Shorthand for a resource requirement.
    pub fn resource(name: &str, min_amount: u32) -> Self {
        Self::Resource {
            name: name.to_owned(),
            min_amount,
        }
    }

    /// Shorthand for a religion requirement.
    pub fn religion(tag: &str) -> Self {
        Self::Religion {
            tag: tag.to_owned(),
        }
    }

    /// The resource name, if this is a resource requirement.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            Self::Resource { name, .. } => Some(name.as_str()),
            Self::Religion { .. } | Self::Citadel | Self::Unrecognized => None,
        }
    }
}

const fn default_min_amount() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// An amount of a named resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceYield {
    /// Resource name.
    pub resource: String,
    /// Units produced.
    pub amount: u32,
}

impl ResourceYield {
    /// Create a yield of `amount` units of `resource`.
    pub fn new(resource: &str, amount: u32) -> Self {
        Self {
            resource: resource.to_owned(),
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Districts
// ---------------------------------------------------------------------------

/// A district: a grouping of structures sharing a parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictDefinition {
    /// Unique district ID.
    pub id: String,
    /// Structure definition that must stand before anything in the
    /// district can work. `None` for root districts.
    #[serde(default)]
    pub parent: Option<String>,
}

/// A structure's membership in one district, with the prerequisites that
/// apply while it sits in that district.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistrictMembership {
    /// The district, or `None` for settlement-wide prerequisites.
    #[serde(default)]
    pub district: Option<String>,
    /// AND-list: every entry must hold.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// OR-list: at least one entry must hold (an empty list holds).
    #[serde(default)]
    pub requires_or: Vec<Requirement>,
}

// ---------------------------------------------------------------------------
// Structure definitions
// ---------------------------------------------------------------------------

/// Immutable description of a buildable structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDefinition {
    /// Unique definition ID.
    pub id: String,
    /// Effective level; changes when an upgrade replaces its base.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Resources yielded while the structure is working.
    #[serde(default)]
    pub produces: Vec<ResourceYield>,
    /// Resources yielded as soon as construction completes, regardless of
    /// whether the structure is working.
    #[serde(default)]
    pub produces_on_completion: Vec<ResourceYield>,
    /// District memberships and their prerequisites.
    #[serde(default)]
    pub districts: Vec<DistrictMembership>,
    /// The base definition this is an upgrade variant of.
    #[serde(default)]
    pub upgrade_of: Option<String>,
    /// Resource requirements that switch on the conditional bonus.
    #[serde(default)]
    pub bonus_requires: Vec<Requirement>,
}

impl StructureDefinition {
    /// Create a definition with no production and no prerequisites.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            level: default_level(),
            produces: Vec::new(),
            produces_on_completion: Vec::new(),
            districts: Vec::new(),
            upgrade_of: None,
            bonus_requires: Vec::new(),
        }
    }

    /// Whether this definition is an upgrade variant of another.
    pub const fn is_upgrade(&self) -> bool {
        self.upgrade_of.is_some()
    }

    /// Every requirement across all district memberships, AND and OR lists.
    pub fn all_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.districts
            .iter()
            .flat_map(|m| m.requires.iter().chain(m.requires_or.iter()))
    }

    /// Whether the structure yields `resource` while working.
    pub fn produces_resource(&self, resource: &str) -> bool {
        self.produces.iter().any(|y| y.resource == resource)
    }

    /// Whether the structure yields `resource` on completion.
    pub fn produces_on_completion_resource(&self, resource: &str) -> bool {
        self.produces_on_completion.iter().any(|y| y.resource == resource)
    }
}

const fn default_level() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Importers
// ---------------------------------------------------------------------------

/// A trade link that delivers one unit of a resource to the dominion.
///
/// Trade economics live elsewhere; the engine only sees whether the link
/// is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Importer {
    /// Unique importer ID.
    #[serde(default)]
    pub id: ImporterId,
    /// Imported resource name.
    pub resource: String,
    /// Whether the link currently delivers.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Importer {
    /// Create an active importer for `resource`.
    pub fn new(resource: &str) -> Self {
        Self {
            id: ImporterId::new(),
            resource: resource.to_owned(),
            active: true,
        }
    }
}

const fn default_active() -> bool {
    true
}
