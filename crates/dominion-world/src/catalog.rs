//! Content catalog: structure and district definitions.
//!
//! The catalog is built once from content data and shared immutably by
//! every dominion. Besides lookup it answers the questions the engine asks
//! over and over:
//!
//! - which definitions yield a given resource ([`Catalog::producers_of`]),
//! - whether a definition is an upgrade variant of another
//!   ([`Catalog::is_variant_of`]),
//! - whether the content graph is sound ([`Catalog::validate`]).
//!
//! Validation findings are advisory. Malformed content still loads and the
//! evaluator resolves whatever it finds conservatively.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use dominion_types::{DistrictDefinition, Requirement, StructureDefinition};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Serialized shape of a content file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogData {
    /// District definitions.
    #[serde(default)]
    pub districts: Vec<DistrictDefinition>,
    /// Structure definitions.
    #[serde(default)]
    pub structures: Vec<StructureDefinition>,
}

/// Immutable lookup over all content definitions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    structures: BTreeMap<String, StructureDefinition>,
    districts: BTreeMap<String, DistrictDefinition>,
    /// Resource name -> definitions yielding it (working or on completion).
    producers: BTreeMap<String, BTreeSet<String>>,
}

// ---------------------------------------------------------------------------
// Catalog implementation
// ---------------------------------------------------------------------------

impl Catalog {
    /// Build a catalog from definitions.
    ///
    /// Duplicates are silently overwritten (last wins).
    pub fn new(structures: Vec<StructureDefinition>, districts: Vec<DistrictDefinition>) -> Self {
        let mut producers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for def in &structures {
            for yielded in def.produces.iter().chain(def.produces_on_completion.iter()) {
                producers
                    .entry(yielded.resource.clone())
                    .or_default()
                    .insert(def.id.clone());
            }
        }
        Self {
            structures: structures.into_iter().map(|d| (d.id.clone(), d)).collect(),
            districts: districts.into_iter().map(|d| (d.id.clone(), d)).collect(),
            producers,
        }
    }

    /// Look up a structure definition.
    pub fn structure(&self, id: &str) -> Option<&StructureDefinition> {
        self.structures.get(id)
    }

    /// Look up a structure definition, failing if it does not exist.
    pub fn require_structure(&self, id: &str) -> Result<&StructureDefinition, WorldError> {
        self.structures
            .get(id)
            .ok_or_else(|| WorldError::UnknownDefinition(id.to_owned()))
    }

    /// The parent structure definition of a district, if any.
    pub fn district_parent(&self, id: &str) -> Option<&str> {
        self.districts.get(id).and_then(|d| d.parent.as_deref())
    }

    /// Definitions that yield `resource`, either while working or on
    /// completion.
    pub fn producers_of<'a>(
        &'a self,
        resource: &str,
    ) -> impl Iterator<Item = &'a StructureDefinition> + 'a {
        self.producers
            .get(resource)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.structures.get(id))
    }

    /// The definition an upgrade replaces, if `id` is an upgrade.
    pub fn base_of(&self, id: &str) -> Option<&str> {
        self.structures
            .get(id)
            .and_then(|d| d.upgrade_of.as_deref())
    }

    /// Whether `id` is `base` or an upgrade (direct or transitive) of it.
    ///
    /// The walk is bounded by the catalog size so cyclic upgrade chains in
    /// malformed content terminate.
    pub fn is_variant_of(&self, id: &str, base: &str) -> bool {
        let mut current = Some(id);
        for _ in 0..=self.structures.len() {
            match current {
                Some(step) if step == base => return true,
                Some(step) => current = self.base_of(step),
                None => return false,
            }
        }
        false
    }

    /// Number of structure definitions.
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Whether the catalog holds no structure definitions.
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Check the content graph and report problems for designers.
    ///
    /// Reports dangling references, self-upgrades, unrecognized requirement
    /// kinds, resources nothing produces, and cycles through upgrade or
    /// district-parent edges. An empty list means the content is sound.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, def) in &self.structures {
            if let Some(base) = &def.upgrade_of {
                if base == id {
                    errors.push(format!("Structure '{id}' lists itself as its upgrade base"));
                } else if !self.structures.contains_key(base) {
                    errors.push(format!(
                        "Structure '{id}' upgrades '{base}' which does not exist in the catalog"
                    ));
                }
            }
            for membership in &def.districts {
                if let Some(district) = &membership.district {
                    if !self.districts.contains_key(district) {
                        errors.push(format!(
                            "Structure '{id}' belongs to district '{district}' which does not exist"
                        ));
                    }
                }
            }
            for requirement in def.all_requirements().chain(def.bonus_requires.iter()) {
                match requirement {
                    Requirement::Unrecognized => errors.push(format!(
                        "Structure '{id}' has a requirement of an unrecognized kind (treated as satisfied)"
                    )),
                    Requirement::Resource { name, .. } if !self.producers.contains_key(name) => {
                        errors.push(format!(
                            "Structure '{id}' requires resource '{name}' which no structure produces"
                        ));
                    }
                    Requirement::Resource { .. }
                    | Requirement::Religion { .. }
                    | Requirement::Citadel => {}
                }
            }
        }

        for (id, district) in &self.districts {
            if let Some(parent) = &district.parent {
                if !self.structures.contains_key(parent) {
                    errors.push(format!(
                        "District '{id}' has parent '{parent}' which does not exist in the catalog"
                    ));
                }
            }
        }

        if self.has_cycle() {
            errors.push(String::from(
                "Cycle detected in the upgrade/district-parent graph -- \
                 topological sort could not visit all structures",
            ));
        }

        errors
    }

    /// Kahn's algorithm over `prerequisite -> dependent` edges, where a
    /// structure depends on its upgrade base and on the parent of every
    /// district it belongs to.
    fn has_cycle(&self) -> bool {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (id, def) in &self.structures {
            in_degree.entry(id.as_str()).or_insert(0);
            adjacency.entry(id.as_str()).or_default();

            let parents = def
                .districts
                .iter()
                .filter_map(|m| m.district.as_deref())
                .filter_map(|d| self.district_parent(d));
            for prereq in def.upgrade_of.as_deref().into_iter().chain(parents) {
                if self.structures.contains_key(prereq) {
                    adjacency.entry(prereq).or_default().push(id.as_str());
                    let entry = in_degree.entry(id.as_str()).or_insert(0);
                    *entry = entry.saturating_add(1);
                }
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut visited_count: usize = 0;
        while let Some(node) = queue.pop_front() {
            visited_count = visited_count.saturating_add(1);
            if let Some(neighbors) = adjacency.get(node) {
                for &neighbor in neighbors {
                    if let Some(degree) = in_degree.get_mut(neighbor) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        visited_count != self.structures.len()
    }
}

impl From<CatalogData> for Catalog {
    fn from(data: CatalogData) -> Self {
        Self::new(data.structures, data.districts)
    }
}
