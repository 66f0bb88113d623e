//! Append-only store for the instances of one constraint kind.

use crate::constraints::{ConKind, Constraint, DedupKey};
use crate::error::ConvertError;
use crate::presolve::{NodeId, NodeRange};
use std::collections::HashMap;

/// Address of one stored constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConInfo {
    pub kind: ConKind,
    pub index: usize,
}

impl ConInfo {
    pub fn new(kind: ConKind, index: usize) -> Self {
        Self { kind, index }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    con: Constraint,
    bridged: bool,
}

/// Constraints of one kind, in insertion order.
///
/// Bridged (converted) entries stay in place and are skipped when the
/// model is pushed to the backend.
#[derive(Debug, Clone)]
pub struct ConstraintKeeper {
    kind: ConKind,
    entries: Vec<Entry>,
    map: Option<HashMap<DedupKey, usize>>,
    value_node: NodeId,
    cursor: usize,
}

impl ConstraintKeeper {
    pub fn new(kind: ConKind, value_node: NodeId) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            map: kind.has_map().then(HashMap::new),
            value_node,
            cursor: 0,
        }
    }

    pub fn kind(&self) -> ConKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value node this kind's constraints are linked through.
    pub fn value_node(&self) -> NodeId {
        self.value_node
    }

    pub fn select_value_node_range(&self, index: usize) -> NodeRange {
        NodeRange::single(self.value_node, index)
    }

    /// Append a constraint; does not touch the map.
    pub fn add(&mut self, con: Constraint) -> Result<usize, ConvertError> {
        if con.kind() != self.kind {
            return Err(ConvertError::Invariant {
                reason: format!(
                    "{} stored in the keeper for {}",
                    con.type_name(),
                    self.kind.type_name()
                ),
            });
        }
        self.entries.push(Entry {
            con,
            bridged: false,
        });
        Ok(self.entries.len() - 1)
    }

    pub fn get(&self, index: usize) -> Option<&Constraint> {
        self.entries.get(index).map(|e| &e.con)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Constraint> {
        self.entries.get_mut(index).map(|e| &mut e.con)
    }

    // ── Dedup map ───────────────────────────────────────────

    pub fn find(&self, key: &DedupKey) -> Option<usize> {
        self.map.as_ref().and_then(|m| m.get(key).copied())
    }

    /// Register stored entry `index` under its key.
    ///
    /// A duplicate key means the caller skipped the lookup, which is an
    /// internal error.
    pub fn map_insert(&mut self, index: usize) -> Result<(), ConvertError> {
        let Some(map) = self.map.as_mut() else {
            return Ok(());
        };
        let Some(key) = self.entries.get(index).and_then(|e| e.con.dedup_key()) else {
            return Err(ConvertError::Invariant {
                reason: format!("no dedup key for {} #{}", self.kind.type_name(), index),
            });
        };
        if map.contains_key(&key) {
            return Err(ConvertError::Invariant {
                reason: format!(
                    "Trying to map_insert() duplicated constraint: {}",
                    self.kind.type_name()
                ),
            });
        }
        map.insert(key, index);
        Ok(())
    }

    // ── Conversion bookkeeping ──────────────────────────────

    pub fn is_bridged(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.bridged)
    }

    pub(crate) fn mark_bridged(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.bridged = true;
        }
    }

    /// First entry not yet visited by the conversion loop.
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn advance_cursor(&mut self) {
        self.cursor += 1;
    }

    pub fn num_bridged(&self) -> usize {
        self.entries.iter().filter(|e| e.bridged).count()
    }

    /// Entries still to be pushed to the backend.
    pub fn iter_unbridged(&self) -> impl Iterator<Item = (usize, &Constraint)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.bridged)
            .map(|(i, e)| (i, &e.con))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.entries.iter().map(|e| &e.con)
    }
}
