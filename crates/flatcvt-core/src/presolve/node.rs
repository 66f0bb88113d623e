//! Value nodes and ranges of value slots.

/// Index of a [`ValueNode`] inside a presolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// What the slots of a node hold values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Var,
    Con,
    Obj,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Var => "var",
            ValueKind::Con => "con",
            ValueKind::Obj => "obj",
        }
    }
}

/// A growable vector of value slots, e.g. all variables of the flat model
/// or all stored constraints of one kind.
#[derive(Debug, Clone)]
pub struct ValueNode {
    name: String,
    kind: ValueKind,
    size: usize,
}

impl ValueNode {
    pub(crate) fn new(name: String, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            size: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn grow(&mut self, count: usize) -> (usize, usize) {
        let begin = self.size;
        self.size += count;
        (begin, self.size)
    }
}

/// Half-open range `[begin, end)` of slots in one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange {
    pub node: NodeId,
    pub begin: usize,
    pub end: usize,
}

impl NodeRange {
    pub fn new(node: NodeId, begin: usize, end: usize) -> Self {
        Self { node, begin, end }
    }

    pub fn single(node: NodeId, index: usize) -> Self {
        Self::new(node, index, index + 1)
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Absorb `other` if it continues this range in the same node.
    pub fn try_extend_by(&mut self, other: &NodeRange) -> bool {
        if self.node == other.node && self.end == other.begin {
            self.end = other.end;
            true
        } else {
            false
        }
    }
}
