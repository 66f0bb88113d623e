//! Affine expression: linear terms + constant.

use super::canonical_bits;
use super::terms::LinTerms;
use crate::ids::VarId;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Default)]
pub struct AffineExpr {
    terms: LinTerms,
    constant: f64,
}

impl AffineExpr {
    // ── Constructors ────────────────────────────────────────

    pub fn new(terms: LinTerms, constant: f64) -> Self {
        Self { terms, constant }
    }

    /// Just a constant, no variable terms.
    pub fn from_constant(constant: f64) -> Self {
        Self {
            constant,
            ..Default::default()
        }
    }

    /// Single term: coef * var.
    pub fn term(var: VarId, coef: f64) -> Self {
        if coef == 0.0 {
            return Self::default();
        }
        Self {
            terms: LinTerms::from_vec(vec![(var, coef)]),
            constant: 0.0,
        }
    }

    /// Single variable with coefficient 1.0.
    pub fn var(var: VarId) -> Self {
        Self::term(var, 1.0)
    }

    pub fn from_linear(terms: Vec<(VarId, f64)>) -> Self {
        Self {
            terms: LinTerms::from_vec(terms),
            constant: 0.0,
        }
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn terms(&self) -> &LinTerms {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn set_constant(&mut self, constant: f64) {
        self.constant = constant;
    }

    pub fn into_parts(self) -> (LinTerms, f64) {
        (self.terms, self.constant)
    }

    /// No variable terms with a nonzero coefficient.
    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|(_, c)| c == 0.0)
    }

    /// The variable this expression is identical to, if it is `1.0 * x + 0`.
    ///
    /// Expects a normalized expression.
    pub fn as_variable(&self) -> Option<VarId> {
        match self.terms.as_slice() {
            [(var, coef)] if *coef == 1.0 && self.constant == 0.0 => Some(*var),
            _ => None,
        }
    }

    // ── Operations ──────────────────────────────────────────

    pub fn normalize(&mut self) {
        self.terms.normalize();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn scale(&self, by: f64) -> Self {
        Self {
            terms: self.terms.scale(by),
            constant: self.constant * by,
        }
    }

    pub fn add(&self, other: &AffineExpr) -> Self {
        Self {
            terms: self.terms.add(&other.terms),
            constant: self.constant + other.constant,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push(var, coef);
    }

    pub fn add_constant(&self, value: f64) -> Self {
        Self {
            terms: self.terms.clone(),
            constant: self.constant + value,
        }
    }

    /// Copy with constant set to zero.
    pub fn without_constant(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            constant: 0.0,
        }
    }
}

impl PartialEq for AffineExpr {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms && canonical_bits(self.constant) == canonical_bits(other.constant)
    }
}

impl Eq for AffineExpr {}

impl Hash for AffineExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terms.hash(state);
        canonical_bits(self.constant).hash(state);
    }
}

// ── Operator overloads ──────────────────────────────────────

impl std::ops::Add for AffineExpr {
    type Output = AffineExpr;

    fn add(self, rhs: AffineExpr) -> Self::Output {
        AffineExpr::add(&self, &rhs)
    }
}

impl std::ops::Sub for AffineExpr {
    type Output = AffineExpr;

    fn sub(self, rhs: AffineExpr) -> Self::Output {
        AffineExpr::add(&self, &rhs.scale(-1.0))
    }
}

impl std::ops::Mul<f64> for AffineExpr {
    type Output = AffineExpr;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl std::ops::Neg for AffineExpr {
    type Output = AffineExpr;

    fn neg(self) -> Self::Output {
        self.scale(-1.0)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn x() -> VarId {
        VarId::new(1)
    }

    fn y() -> VarId {
        VarId::new(2)
    }

    #[test]
    fn from_constant() {
        let e = AffineExpr::from_constant(5.0);
        assert_eq!(e.constant(), 5.0);
        assert!(e.is_constant());
        assert!(e.as_variable().is_none());
    }

    #[test]
    fn bare_variable_is_detected() {
        assert_eq!(AffineExpr::var(x()).as_variable(), Some(x()));
        assert!(AffineExpr::term(x(), 2.0).as_variable().is_none());
        assert!(AffineExpr::var(x()).add_constant(1.0).as_variable().is_none());
    }

    #[test]
    fn cancelled_terms_become_constant() {
        let e = (AffineExpr::var(x()) - AffineExpr::var(x())).add_constant(3.0);
        assert!(!e.is_constant());
        let e = e.normalized();
        assert!(e.is_constant());
        assert_eq!(e.constant(), 3.0);
    }

    #[test]
    fn operand_order_is_irrelevant_after_normalize() {
        let a = (AffineExpr::var(x()) + AffineExpr::term(y(), 2.0)).normalized();
        let b = (AffineExpr::term(y(), 2.0) + AffineExpr::var(x())).normalized();
        assert_eq!(a, b);
    }

    #[test]
    fn scale_with_constant() {
        let e = AffineExpr::new(LinTerms::from_vec(vec![(x(), 2.0)]), 3.0);
        let scaled = e * 2.0;
        assert_eq!(scaled.constant(), 6.0);
        assert_eq!(scaled.terms().as_slice()[0].1, 4.0);
    }

    #[test]
    fn without_constant() {
        let e = AffineExpr::var(x()).add_constant(5.0);
        let stripped = e.without_constant();
        assert_eq!(stripped.constant(), 0.0);
        assert_eq!(stripped.terms().len(), 1);
    }
}
