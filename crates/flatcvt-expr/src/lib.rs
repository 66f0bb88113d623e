pub mod expr;
pub mod ids;

pub use expr::{
    AffineExpr, ComparisonSense, ExprError, LinTerms, QuadExpr, QuadTerms, affine_sum,
    canonical_bits,
};
pub use ids::VarId;
