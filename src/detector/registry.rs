//! First-seen registry of query identities and their repeat counts.

use crate::capture::{StackKey, StackSnapshot};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// "Same SQL from the same call stack"
///
/// Bound parameters are deliberately not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryIdentity {
    pub stack: StackKey,
    pub sql: String,
}

impl QueryIdentity {
    pub fn new(stack: StackKey, sql: impl Into<String>) -> Self {
        Self {
            stack,
            sql: sql.into(),
        }
    }
}

/// A distinct identity together with the stack it was first seen with
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    identity: Rc<QueryIdentity>,
    snapshot: StackSnapshot,
}

impl RegistryEntry {
    pub fn identity(&self) -> &QueryIdentity {
        &self.identity
    }

    pub fn sql(&self) -> &str {
        &self.identity.sql
    }

    pub fn snapshot(&self) -> &StackSnapshot {
        &self.snapshot
    }
}

/// What `observe` found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// New identity stored at this index
    First(usize),

    /// Known identity, now repeated `repeats` times after its first run
    Repeat { index: usize, repeats: u64 },
}

/// Registry of everything executed during one unit of work
///
/// Entries keep first-seen order. `repeats` only holds indices that were
/// observed at least twice.
#[derive(Debug, Default)]
pub struct DuplicateRegistry {
    entries: Vec<RegistryEntry>,
    by_identity: HashMap<Rc<QueryIdentity>, usize>,
    repeats: BTreeMap<usize, u64>,
}

impl DuplicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution
    ///
    /// **Public** - called by the detector after a query succeeds
    ///
    /// # Arguments
    /// * `identity` - Identity of the execution
    /// * `snapshot` - Stack it was issued from (dropped if already known)
    ///
    /// # Returns
    /// Whether the identity was new or a repeat
    pub fn observe(&mut self, identity: QueryIdentity, snapshot: StackSnapshot) -> Observation {
        if let Some(&index) = self.by_identity.get(&identity) {
            let repeats = self.repeats.entry(index).or_insert(0);
            *repeats += 1;
            return Observation::Repeat {
                index,
                repeats: *repeats,
            };
        }

        let index = self.entries.len();
        let identity = Rc::new(identity);
        self.by_identity.insert(Rc::clone(&identity), index);
        self.entries.push(RegistryEntry { identity, snapshot });

        Observation::First(index)
    }

    /// Number of distinct identities seen
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&RegistryEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Executions after the first, or `None` if the identity never repeated
    pub fn repeat_count(&self, index: usize) -> Option<u64> {
        self.repeats.get(&index).copied()
    }

    pub fn has_duplicates(&self) -> bool {
        !self.repeats.is_empty()
    }

    /// Duplicated entries with their repeat counts, in first-seen order
    pub fn duplicates(&self) -> impl Iterator<Item = (&RegistryEntry, u64)> + '_ {
        self.repeats
            .iter()
            .map(move |(&index, &repeats)| (&self.entries[index], repeats))
    }

    /// Number of distinct identities that repeated
    pub fn duplicate_count(&self) -> usize {
        self.repeats.len()
    }

    /// Executions across all duplicated identities, first runs included
    pub fn total_executions(&self) -> u64 {
        self.repeats.values().map(|repeats| repeats + 1).sum()
    }
}
