//! Structural keys for functional-constraint deduplication.
//!
//! A key covers the function and its arguments only; the result variable
//! and the context are not part of it.

use flatcvt_expr::{AffineExpr, QuadExpr, VarId, canonical_bits};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Linear(AffineExpr),
    Quadratic(QuadExpr),
    Func { args: Vec<VarId>, params: Vec<u64> },
    CondLin { body: AffineExpr, rhs: u64 },
    CondQuad { body: QuadExpr, rhs: u64 },
    Pl { arg: VarId, data: Vec<u64> },
}

impl DedupKey {
    pub(crate) fn func(args: &[VarId], params: &[f64]) -> Self {
        DedupKey::Func {
            args: args.to_vec(),
            params: params.iter().map(|p| canonical_bits(*p)).collect(),
        }
    }
}
