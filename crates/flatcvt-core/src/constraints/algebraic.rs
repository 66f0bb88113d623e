//! Linear and quadratic algebraic constraints.
//!
//! Bodies never carry a constant: constructors move it to the right-hand
//! side so that `x + 1 <= 3` and `x <= 2` are the same constraint.

use flatcvt_expr::{AffineExpr, QuadExpr, VarId};

/// Expression types an algebraic constraint can be built over.
pub trait ConBody: Clone + std::fmt::Debug + PartialEq {
    fn constant(&self) -> f64;

    fn without_constant(&self) -> Self;

    fn scale(&self, by: f64) -> Self;

    fn normalized(self) -> Self;

    /// Append every referenced variable (duplicates possible).
    fn collect_vars(&self, out: &mut Vec<VarId>);

    fn linear_part(&self) -> &AffineExpr;
}

impl ConBody for AffineExpr {
    fn constant(&self) -> f64 {
        AffineExpr::constant(self)
    }

    fn without_constant(&self) -> Self {
        AffineExpr::without_constant(self)
    }

    fn scale(&self, by: f64) -> Self {
        AffineExpr::scale(self, by)
    }

    fn normalized(self) -> Self {
        AffineExpr::normalized(self)
    }

    fn collect_vars(&self, out: &mut Vec<VarId>) {
        out.extend(self.terms().iter().map(|(v, _)| v));
    }

    fn linear_part(&self) -> &AffineExpr {
        self
    }
}

impl ConBody for QuadExpr {
    fn constant(&self) -> f64 {
        QuadExpr::constant(self)
    }

    fn without_constant(&self) -> Self {
        QuadExpr::without_constant(self)
    }

    fn scale(&self, by: f64) -> Self {
        QuadExpr::scale(self, by)
    }

    fn normalized(self) -> Self {
        QuadExpr::normalized(self)
    }

    fn collect_vars(&self, out: &mut Vec<VarId>) {
        out.extend(self.lin_terms().iter().map(|(v, _)| v));
        for (a, b, _) in self.quad_terms().iter() {
            out.push(a);
            out.push(b);
        }
    }

    fn linear_part(&self) -> &AffineExpr {
        self.affine()
    }
}

/// Single-sided constraint `body <sense> rhs`; the sense is given by the
/// constraint kind holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct RhsCon<E> {
    body: E,
    rhs: f64,
}

impl<E: ConBody> RhsCon<E> {
    pub fn new(expr: E, rhs: f64) -> Self {
        let rhs = rhs - expr.constant();
        Self {
            body: expr.without_constant().normalized(),
            rhs,
        }
    }

    pub fn body(&self) -> &E {
        &self.body
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn into_parts(self) -> (E, f64) {
        (self.body, self.rhs)
    }

    /// `-body <flipped sense> -rhs`.
    pub fn negated(&self) -> Self {
        Self {
            body: self.body.scale(-1.0),
            rhs: -self.rhs,
        }
    }
}

/// Two-sided constraint `lower <= body <= upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCon<E> {
    body: E,
    lower: f64,
    upper: f64,
}

impl<E: ConBody> RangeCon<E> {
    pub fn new(expr: E, lower: f64, upper: f64) -> Self {
        let c = expr.constant();
        Self {
            body: expr.without_constant().normalized(),
            lower: lower - c,
            upper: upper - c,
        }
    }

    pub fn body(&self) -> &E {
        &self.body
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

pub type LinCon = RhsCon<AffineExpr>;
pub type QuadCon = RhsCon<QuadExpr>;
pub type LinRangeCon = RangeCon<AffineExpr>;
pub type QuadRangeCon = RangeCon<QuadExpr>;

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn constant_moves_to_rhs() {
        let x = VarId::new(0);
        let con = LinCon::new(AffineExpr::var(x).add_constant(1.0), 3.0);
        assert_eq!(con.rhs(), 2.0);
        assert_eq!(con.body().constant(), 0.0);
        assert_eq!(con, LinCon::new(AffineExpr::var(x), 2.0));
    }

    #[test]
    fn range_keeps_infinite_side() {
        let x = VarId::new(0);
        let con = LinRangeCon::new(AffineExpr::var(x).add_constant(2.0), f64::NEG_INFINITY, 5.0);
        assert_eq!(con.lower(), f64::NEG_INFINITY);
        assert_eq!(con.upper(), 3.0);
    }
}
