//! Expression types for flat models.
//!
//! - `terms`     : LinTerms / QuadTerms: canonicalizable term lists
//! - `affine`    : AffineExpr: linear terms + constant
//! - `quadratic` : QuadExpr: affine part + quadratic terms
//! - `sense`     : ComparisonSense for algebraic constraints
//! - `builders`  : checked constructors from parallel arrays
//! - `error`     : Expression construction errors

pub mod affine;
pub mod builders;
pub mod error;
pub mod quadratic;
pub mod sense;
pub mod terms;

pub use affine::AffineExpr;
pub use builders::{affine_sum, linear_terms, quad_terms};
pub use error::ExprError;
pub use quadratic::QuadExpr;
pub use sense::ComparisonSense;
pub use terms::{LinTerms, QuadTerms};

/// Bit pattern of a float with `-0.0` folded onto `0.0`.
///
/// Structural equality and hashing of expressions go through this so that
/// dedup maps see `x + 0.0` and `x - 0.0` as the same key.
pub fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}
