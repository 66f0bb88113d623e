//! Typed links between node ranges.

use super::node::NodeRange;

/// How postsolve folds the values of several targets into one source slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    First,
    Average,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::First => "first",
            Aggregation::Average => "average",
        }
    }

    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::First => values[0],
            Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    /// Slot-by-slot identity between two equally long ranges.
    Copy { src: NodeRange, dst: NodeRange },
    /// One source slot distributed over several target ranges.
    OneToMany {
        src: NodeRange,
        dsts: Vec<NodeRange>,
        aggregation: Aggregation,
    },
}

impl Link {
    pub fn type_name(&self) -> &'static str {
        match self {
            Link::Copy { .. } => "copy",
            Link::OneToMany { .. } => "one_to_many",
        }
    }

    pub fn src(&self) -> &NodeRange {
        match self {
            Link::Copy { src, .. } | Link::OneToMany { src, .. } => src,
        }
    }

    pub fn targets(&self) -> &[NodeRange] {
        match self {
            Link::Copy { dst, .. } => std::slice::from_ref(dst),
            Link::OneToMany { dsts, .. } => dsts,
        }
    }

    /// Extend a copy link by a continuing pair of ranges.
    pub(crate) fn try_extend_by(&mut self, next: &Link) -> bool {
        match (self, next) {
            (
                Link::Copy { src, dst },
                Link::Copy {
                    src: next_src,
                    dst: next_dst,
                },
            ) => {
                if src.node == next_src.node
                    && src.end == next_src.begin
                    && dst.node == next_dst.node
                    && dst.end == next_dst.begin
                {
                    src.end = next_src.end;
                    dst.end = next_dst.end;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::presolve::node::NodeId;

    #[test]
    fn aggregation_rules() {
        let values = [1.0, 2.0, 6.0];
        assert_eq!(Aggregation::Sum.apply(&values), Some(9.0));
        assert_eq!(Aggregation::First.apply(&values), Some(1.0));
        assert_eq!(Aggregation::Average.apply(&values), Some(3.0));
        assert_eq!(Aggregation::Sum.apply(&[]), None);
    }

    #[test]
    fn copy_links_extend_when_both_sides_continue() {
        let (a, b) = (NodeId::new(0), NodeId::new(1));
        let mut link = Link::Copy {
            src: NodeRange::single(a, 0),
            dst: NodeRange::single(b, 4),
        };
        let next = Link::Copy {
            src: NodeRange::single(a, 1),
            dst: NodeRange::single(b, 5),
        };
        assert!(link.try_extend_by(&next));
        assert_eq!(link.src(), &NodeRange::new(a, 0, 2));
        let gap = Link::Copy {
            src: NodeRange::single(a, 2),
            dst: NodeRange::single(b, 9),
        };
        assert!(!link.try_extend_by(&gap));
    }
}
