//! Quadratic expression: affine part + quadratic terms.

use super::affine::AffineExpr;
use super::terms::{LinTerms, QuadTerms};
use crate::ids::VarId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QuadExpr {
    affine: AffineExpr,
    quad: QuadTerms,
}

impl QuadExpr {
    pub fn new(affine: AffineExpr, quad: QuadTerms) -> Self {
        Self { affine, quad }
    }

    pub fn from_affine(affine: AffineExpr) -> Self {
        Self {
            affine,
            quad: QuadTerms::new(),
        }
    }

    /// Single product term: coef * var1 * var2.
    pub fn product(var1: VarId, var2: VarId, coef: f64) -> Self {
        Self {
            affine: AffineExpr::default(),
            quad: QuadTerms::from_vec(vec![(var1, var2, coef)]),
        }
    }

    pub fn affine(&self) -> &AffineExpr {
        &self.affine
    }

    pub fn lin_terms(&self) -> &LinTerms {
        self.affine.terms()
    }

    pub fn quad_terms(&self) -> &QuadTerms {
        &self.quad
    }

    pub fn constant(&self) -> f64 {
        self.affine.constant()
    }

    pub fn set_constant(&mut self, constant: f64) {
        self.affine.set_constant(constant);
    }

    pub fn into_parts(self) -> (AffineExpr, QuadTerms) {
        (self.affine, self.quad)
    }

    /// Drop the (empty) quadratic part.
    pub fn into_affine(self) -> AffineExpr {
        self.affine
    }

    /// No quadratic term with a nonzero coefficient.
    pub fn is_affine(&self) -> bool {
        self.quad.iter().all(|(_, _, c)| c == 0.0)
    }

    pub fn is_constant(&self) -> bool {
        self.is_affine() && self.affine.is_constant()
    }

    pub fn as_variable(&self) -> Option<VarId> {
        if self.quad.is_empty() {
            self.affine.as_variable()
        } else {
            None
        }
    }

    pub fn add_quad_term(&mut self, var1: VarId, var2: VarId, coef: f64) {
        self.quad.push(var1, var2, coef);
    }

    pub fn normalize(&mut self) {
        self.affine.normalize();
        self.quad.normalize();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn scale(&self, by: f64) -> Self {
        Self {
            affine: self.affine.scale(by),
            quad: self.quad.scale(by),
        }
    }

    pub fn add(&self, other: &QuadExpr) -> Self {
        Self {
            affine: self.affine.add(&other.affine),
            quad: self.quad.add(&other.quad),
        }
    }

    pub fn without_constant(&self) -> Self {
        Self {
            affine: self.affine.without_constant(),
            quad: self.quad.clone(),
        }
    }
}

impl From<AffineExpr> for QuadExpr {
    fn from(affine: AffineExpr) -> Self {
        Self::from_affine(affine)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn x() -> VarId {
        VarId::new(0)
    }

    fn y() -> VarId {
        VarId::new(1)
    }

    #[test]
    fn cancelled_products_make_affine() {
        let mut e = QuadExpr::product(x(), y(), 1.0);
        e.add_quad_term(y(), x(), -1.0);
        e = e.add(&QuadExpr::from_affine(AffineExpr::var(x())));
        assert!(!e.is_affine());
        let e = e.normalized();
        assert!(e.is_affine());
        assert_eq!(e.clone().into_affine().as_variable(), Some(x()));
        assert_eq!(e.as_variable(), Some(x()));
    }

    #[test]
    fn structural_equality_ignores_pair_order() {
        let a = QuadExpr::product(x(), y(), 2.0).normalized();
        let b = QuadExpr::product(y(), x(), 2.0).normalized();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_only() {
        let mut e = QuadExpr::default();
        e.set_constant(4.0);
        assert!(e.is_constant());
        assert_eq!(e.constant(), 4.0);
    }
}
