//! Producer registry: who can yield which resource during one pass.
//!
//! The registry is rebuilt from scratch at the start of every full
//! recalculation and dropped with the pass context at the end, so nothing
//! it memoizes outlives the pass. Each entry carries a tri-state memo
//! (`Unset -> Calculating -> Resolved`) that the evaluator drives while
//! summing amounts; see [`crate::evaluator`].

use std::collections::BTreeMap;

use dominion_types::{ImporterId, StructureId};

use crate::view::DominionView;

/// Memoization state of one resource's amount within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Memo {
    /// Not computed yet this pass.
    Unset,
    /// Being computed; reading it again means the graph loops.
    Calculating,
    /// Final amount for this pass.
    Resolved(u32),
}

/// Everything that can yield one resource.
#[derive(Debug, Clone)]
pub struct ProducerEntry {
    /// Completed structures that yield the resource while working.
    pub producers: Vec<(StructureId, u32)>,
    /// Completed structures that yield the resource unconditionally.
    pub completed_producers: Vec<(StructureId, u32)>,
    /// Active importers, one unit each.
    pub importers: Vec<ImporterId>,
    memo: Memo,
}

impl ProducerEntry {
    const fn new() -> Self {
        Self {
            producers: Vec::new(),
            completed_producers: Vec::new(),
            importers: Vec::new(),
            memo: Memo::Unset,
        }
    }

    /// The amount that does not depend on any evaluation: completion
    /// yields plus one unit per importer.
    pub fn fixed_amount(&self) -> u32 {
        let imported = u32::try_from(self.importers.len()).unwrap_or(u32::MAX);
        self.completed_producers
            .iter()
            .fold(imported, |total, &(_, amount)| total.saturating_add(amount))
    }
}

/// Per-pass mapping from resource name to its producers.
#[derive(Debug, Clone, Default)]
pub struct ProducerRegistry {
    entries: BTreeMap<String, ProducerEntry>,
}

impl ProducerRegistry {
    /// Collect producers from every completed structure and active importer
    /// of the dominion.
    ///
    /// Structures whose definition is missing from the catalog produce
    /// nothing.
    pub fn build(view: &DominionView<'_>) -> Self {
        let mut entries: BTreeMap<String, ProducerEntry> = BTreeMap::new();

        let standing = view
            .settlements
            .iter()
            .flat_map(|s| s.structures())
            .filter(|s| s.completed);
        for structure in standing {
            let Some(def) = view.catalog.structure(&structure.definition) else {
                continue;
            };
            for y in &def.produces {
                entries
                    .entry(y.resource.clone())
                    .or_insert_with(ProducerEntry::new)
                    .producers
                    .push((structure.id, y.amount));
            }
            for y in &def.produces_on_completion {
                entries
                    .entry(y.resource.clone())
                    .or_insert_with(ProducerEntry::new)
                    .completed_producers
                    .push((structure.id, y.amount));
            }
        }

        for importer in view.importers.iter().filter(|i| i.active) {
            entries
                .entry(importer.resource.clone())
                .or_insert_with(ProducerEntry::new)
                .importers
                .push(importer.id);
        }

        Self { entries }
    }

    /// The producers of `resource`, if any exist.
    pub fn entry(&self, resource: &str) -> Option<&ProducerEntry> {
        self.entries.get(resource)
    }

    /// Current memo state. A resource nobody produces is resolved at zero.
    pub fn memo(&self, resource: &str) -> Memo {
        self.entries
            .get(resource)
            .map_or(Memo::Resolved(0), |e| e.memo)
    }

    /// Move `resource` to `Calculating`.
    pub fn mark_calculating(&mut self, resource: &str) {
        if let Some(entry) = self.entries.get_mut(resource) {
            entry.memo = Memo::Calculating;
        }
    }

    /// Move `resource` to `Resolved`.
    pub fn resolve(&mut self, resource: &str, amount: u32) {
        if let Some(entry) = self.entries.get_mut(resource) {
            entry.memo = Memo::Resolved(amount);
        }
    }

    /// Resolved amounts, for reporting after the pass.
    pub fn resolved_amounts(&self) -> BTreeMap<String, u32> {
        self.entries
            .iter()
            .filter_map(|(name, e)| match e.memo {
                Memo::Resolved(amount) => Some((name.clone(), amount)),
                Memo::Unset | Memo::Calculating => None,
            })
            .collect()
    }

    /// Number of resources with at least one producer.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no resource has a producer.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
