//! Interval bounds of expressions and domains of new result variables.

use crate::constraints::Constraint;
use crate::model::FlatModel;
use crate::types::{Bounds, VarType, Variable};
use flatcvt_expr::{AffineExpr, QuadExpr, VarId};

// 0 * inf is 0 here: a zero coefficient removes the term.
fn mul(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

fn scale(bounds: Bounds, coef: f64) -> Bounds {
    let (a, b) = (mul(bounds.lower, coef), mul(bounds.upper, coef));
    Bounds::new(a.min(b), a.max(b))
}

fn add(a: Bounds, b: Bounds) -> Bounds {
    Bounds::new(a.lower + b.lower, a.upper + b.upper)
}

fn product(a: Bounds, b: Bounds) -> Bounds {
    let corners = [
        mul(a.lower, b.lower),
        mul(a.lower, b.upper),
        mul(a.upper, b.lower),
        mul(a.upper, b.upper),
    ];
    Bounds::new(
        corners.iter().copied().fold(f64::INFINITY, f64::min),
        corners.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    )
}

fn square(a: Bounds) -> Bounds {
    let hi = mul(a.lower, a.lower).max(mul(a.upper, a.upper));
    if a.contains(0.0) {
        Bounds::new(0.0, hi)
    } else {
        let lo = mul(a.lower, a.lower).min(mul(a.upper, a.upper));
        Bounds::new(lo, hi)
    }
}

/// Interval of `expr` over the current variable domains.
pub(super) fn affine_bounds(model: &FlatModel, expr: &AffineExpr) -> Bounds {
    expr.terms()
        .iter()
        .map(|(var, coef)| scale(model.bounds(var), coef))
        .fold(Bounds::fixed(expr.constant()), add)
}

pub(super) fn quad_bounds(model: &FlatModel, expr: &QuadExpr) -> Bounds {
    expr.quad_terms()
        .iter()
        .map(|(a, b, coef)| {
            let term = if a == b {
                square(model.bounds(a))
            } else {
                product(model.bounds(a), model.bounds(b))
            };
            scale(term, coef)
        })
        .fold(affine_bounds(model, expr.affine()), add)
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0
}

fn is_integer_var(model: &FlatModel, var: VarId) -> bool {
    model.var_type(var) == VarType::Integer
}

/// Every variable integer, every coefficient and the constant integral.
pub(super) fn is_integral_affine(model: &FlatModel, expr: &AffineExpr) -> bool {
    is_integral(expr.constant())
        && expr
            .terms()
            .iter()
            .all(|(var, coef)| is_integral(coef) && is_integer_var(model, var))
}

pub(super) fn is_integral_quad(model: &FlatModel, expr: &QuadExpr) -> bool {
    is_integral_affine(model, expr.affine())
        && expr.quad_terms().iter().all(|(a, b, coef)| {
            is_integral(coef) && is_integer_var(model, a) && is_integer_var(model, b)
        })
}

/// Integer with a domain inside `[0, 1]`.
pub(super) fn is_boolean(model: &FlatModel, var: VarId) -> bool {
    is_integer_var(model, var) && model.lb(var) >= 0.0 && model.ub(var) <= 1.0
}

fn all_integer(model: &FlatModel, vars: &[VarId]) -> bool {
    vars.iter().all(|v| is_integer_var(model, *v))
}

fn typed(bounds: Bounds, integer: bool) -> Variable {
    let var_type = if integer {
        VarType::Integer
    } else {
        VarType::Continuous
    };
    // Integer bounds are rounded inward.
    let bounds = if integer {
        Bounds::new(bounds.lower.ceil(), bounds.upper.floor())
    } else {
        bounds
    };
    Variable { bounds, var_type }
}

/// Bounds and type for the result of functional constraint `con`.
pub(super) fn result_domain(model: &FlatModel, con: &Constraint) -> Variable {
    if con.kind().is_logical() {
        return Variable::binary();
    }
    match con {
        Constraint::LinearFunctional(f) => typed(
            affine_bounds(model, &f.expr),
            is_integral_affine(model, &f.expr),
        ),
        Constraint::QuadFunctional(f) => {
            typed(quad_bounds(model, &f.expr), is_integral_quad(model, &f.expr))
        }
        Constraint::Max(f) => {
            let lower = f.args.iter().map(|v| model.lb(*v)).fold(f64::NEG_INFINITY, f64::max);
            let upper = f.args.iter().map(|v| model.ub(*v)).fold(f64::NEG_INFINITY, f64::max);
            typed(Bounds::new(lower, upper), all_integer(model, &f.args))
        }
        Constraint::Min(f) => {
            let lower = f.args.iter().map(|v| model.lb(*v)).fold(f64::INFINITY, f64::min);
            let upper = f.args.iter().map(|v| model.ub(*v)).fold(f64::INFINITY, f64::min);
            typed(Bounds::new(lower, upper), all_integer(model, &f.args))
        }
        Constraint::Abs(f) => {
            let arg = model.bounds(f.args[0]);
            let bounds = if arg.lower >= 0.0 {
                arg
            } else if arg.upper <= 0.0 {
                Bounds::new(-arg.upper, -arg.lower)
            } else {
                Bounds::new(0.0, (-arg.lower).max(arg.upper))
            };
            typed(bounds, all_integer(model, &f.args))
        }
        Constraint::IfThen(f) => {
            let branches = &f.args[1..];
            typed(model.hull(branches), all_integer(model, branches))
        }
        Constraint::Count(f) | Constraint::NumberofConst(f) => {
            Variable::integer(0.0, f.args.len() as f64)
        }
        Constraint::NumberofVar(f) => Variable::integer(0.0, (f.args.len() - 1) as f64),
        Constraint::Exp(_) | Constraint::ExpA(_) => Variable::continuous(0.0, f64::INFINITY),
        Constraint::Sin(_) | Constraint::Cos(_) => Variable::continuous(-1.0, 1.0),
        Constraint::Pl(pl) => {
            let arg = model.bounds(pl.arg);
            if !arg.is_finite() {
                return Variable::continuous(f64::NEG_INFINITY, f64::INFINITY);
            }
            let points = pl.points(arg.lower, arg.upper);
            let lower = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            let upper = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
            Variable::continuous(lower, upper)
        }
        _ => Variable::continuous(f64::NEG_INFINITY, f64::INFINITY),
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::constraints::{FuncCon, FunctionalExpr};
    use crate::presolve::NodeId;

    fn model() -> (FlatModel, VarId, VarId) {
        let mut model = FlatModel::new(|kind| NodeId::new(kind.index()));
        let x = model.add_var(Variable::integer(-2.0, 3.0));
        let y = model.add_var(Variable::continuous(1.0, 4.0));
        (model, x, y)
    }

    #[test]
    fn affine_bounds_respect_sign() {
        let (model, x, y) = model();
        let expr = AffineExpr::term(x, 2.0) - AffineExpr::var(y) + AffineExpr::from_constant(1.0);
        assert_eq!(affine_bounds(&model, &expr), Bounds::new(-7.0, 6.0));
    }

    #[test]
    fn square_of_sign_changing_var_starts_at_zero() {
        let (model, x, _) = model();
        let expr = QuadExpr::product(x, x, 1.0);
        assert_eq!(quad_bounds(&model, &expr), Bounds::new(0.0, 9.0));
    }

    #[test]
    fn integral_sum_gets_integer_result() {
        let (model, x, y) = model();
        let con = Constraint::LinearFunctional(FunctionalExpr::new(AffineExpr::term(x, 3.0)));
        let var = result_domain(&model, &con);
        assert!(var.is_integer());
        assert_eq!(var.bounds, Bounds::new(-6.0, 9.0));

        let con = Constraint::LinearFunctional(FunctionalExpr::new(AffineExpr::var(x) + AffineExpr::var(y)));
        assert!(!result_domain(&model, &con).is_integer());
    }

    #[test]
    fn abs_and_max_domains() {
        let (model, x, y) = model();
        let abs = Constraint::Abs(FuncCon::new(vec![x]));
        assert_eq!(result_domain(&model, &abs).bounds, Bounds::new(0.0, 3.0));
        let max = Constraint::Max(FuncCon::new(vec![x, y]));
        let var = result_domain(&model, &max);
        assert_eq!(var.bounds, Bounds::new(1.0, 4.0));
        assert!(!var.is_integer());
    }

    #[test]
    fn logical_results_are_binary() {
        let (model, x, y) = model();
        let and = Constraint::And(FuncCon::new(vec![x, y]));
        assert!(result_domain(&model, &and).is_binary());
    }
}
