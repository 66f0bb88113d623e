//! Indicators, piecewise-linear functions, SOS and complementarity.

use super::{failure, mismatch};
use crate::backend::ModelApi;
use crate::constraints::{Constraint, IndicatorCon, LinCon, LinRangeCon, SosCon};
use crate::convert::{Converter, bounds};
use crate::error::ConvertError;
use crate::model::ConInfo;
use crate::types::{Bounds, Variable};
use flatcvt_expr::{AffineExpr, ComparisonSense, VarId, affine_sum};

/// `b == val ==> body <sense> rhs` with big-M constants from the bounds of
/// `body`.
pub(super) fn indicator_big_m<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let (ind, sense) = match con {
        Constraint::IndLinLe(ind) => (ind, ComparisonSense::LessEqual),
        Constraint::IndLinEq(ind) => (ind, ComparisonSense::Equal),
        Constraint::IndLinGe(ind) => (ind, ComparisonSense::GreaterEqual),
        _ => return Err(mismatch(con, "indicator_big_m")),
    };
    let b = ind.bvar();
    if !bounds::is_boolean(cvt.model(), b) {
        return Err(failure(con, format!("indicator variable {b} is not binary")));
    }
    let body = ind.con().body();
    let rhs = ind.con().rhs();
    let range = bounds::affine_bounds(cvt.model(), body);
    let on = ind.bval() == 1;

    // body - rhs <= M (or >= -M) while the indicator is off
    let upper_m = (sense != ComparisonSense::GreaterEqual).then_some(range.upper - rhs);
    let lower_m = (sense != ComparisonSense::LessEqual).then_some(rhs - range.lower);
    for m in [upper_m, lower_m].into_iter().flatten() {
        if !m.is_finite() {
            return Err(failure(
                con,
                format!(
                    "expression bounds [{}, {}] are not finite",
                    range.lower, range.upper
                ),
            ));
        }
    }

    if let Some(m) = upper_m.filter(|m| *m > 0.0) {
        // on: body + M b <= rhs + M, off: body - M b <= rhs
        let (coef, shifted) = if on { (m, rhs + m) } else { (-m, rhs) };
        let expr = body.clone() + AffineExpr::term(b, coef);
        cvt.add_constraint(Constraint::LinLe(LinCon::new(expr, shifted)))?;
    }
    if let Some(m) = lower_m.filter(|m| *m > 0.0) {
        // on: body - M b >= rhs - M, off: body + M b >= rhs
        let (coef, shifted) = if on { (-m, rhs - m) } else { (m, rhs) };
        let expr = body.clone() + AffineExpr::term(b, coef);
        cvt.add_constraint(Constraint::LinGe(LinCon::new(expr, shifted)))?;
    }
    Ok(())
}

/// Piecewise-linear `r = f(x)` as a convex combination of graph points
/// with SOS2 weights.
pub(super) fn pl_to_sos2<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Pl(pl) = con else {
        return Err(mismatch(con, "pl_to_sos2"));
    };
    let domain = cvt.model().bounds(pl.arg);
    if !domain.is_finite() {
        return Err(failure(
            con,
            format!(
                "argument domain [{}, {}] is not finite",
                domain.lower, domain.upper
            ),
        ));
    }
    let points = pl.points(domain.lower, domain.upper);
    if let [(_, y)] = points.as_slice() {
        return cvt.narrow_var_bounds(pl.result, *y, *y).map(|_| ());
    }
    let lambdas: Vec<VarId> = points
        .iter()
        .map(|_| cvt.add_var(Variable::continuous(0.0, 1.0)))
        .collect();
    let weighted = |coord: fn(&(f64, f64)) -> f64| {
        AffineExpr::from_linear(
            lambdas
                .iter()
                .zip(&points)
                .map(|(lambda, point)| (*lambda, coord(point)))
                .collect(),
        )
    };
    let convexity = affine_sum(lambdas.iter().map(|l| AffineExpr::var(*l)));
    let x_link = weighted(|p| p.0) - AffineExpr::var(pl.arg);
    let y_link = weighted(|p| p.1) - AffineExpr::var(pl.result);
    cvt.add_constraint(Constraint::LinEq(LinCon::new(convexity, 1.0)))?;
    cvt.add_constraint(Constraint::LinEq(LinCon::new(x_link, 0.0)))?;
    cvt.add_constraint(Constraint::LinEq(LinCon::new(y_link, 0.0)))?;

    let weights = (1..=lambdas.len()).map(|w| w as f64).collect();
    cvt.add_constraint(Constraint::Sos2(SosCon::new(lambdas, weights)?))
}

fn finite_member_bounds<B: ModelApi>(
    cvt: &Converter<B>,
    con: &Constraint,
    sos: &SosCon,
) -> Result<Vec<Bounds>, ConvertError> {
    sos.vars()
        .iter()
        .map(|var| {
            let b = cvt.model().bounds(*var);
            if b.is_finite() {
                Ok(b)
            } else {
                Err(failure(con, format!("member {var} has infinite bounds")))
            }
        })
        .collect()
}

fn add_sum_bounds<B: ModelApi>(cvt: &mut Converter<B>, sos: &SosCon) -> Result<(), ConvertError> {
    let sum = sos.sum_bounds();
    if sum.lower.is_finite() || sum.upper.is_finite() {
        let expr = affine_sum(sos.vars().iter().map(|v| AffineExpr::var(*v)));
        cvt.add_constraint(Constraint::LinRange(LinRangeCon::new(
            expr, sum.lower, sum.upper,
        )))?;
    }
    Ok(())
}

// l_i * sum(flags) <= x_i <= u_i * sum(flags)
fn link_member<B: ModelApi>(
    cvt: &mut Converter<B>,
    var: VarId,
    bounds: Bounds,
    flags: &[VarId],
) -> Result<(), ConvertError> {
    let flag_sum = affine_sum(flags.iter().map(|f| AffineExpr::var(*f)));
    let x = AffineExpr::var(var);
    cvt.add_constraint(Constraint::LinLe(LinCon::new(
        x.clone() - flag_sum.scale(bounds.upper),
        0.0,
    )))?;
    cvt.add_constraint(Constraint::LinGe(LinCon::new(
        x - flag_sum.scale(bounds.lower),
        0.0,
    )))
}

/// At most one nonzero member, one binary flag per member.
pub(super) fn sos1_to_binaries<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Sos1(sos) = con else {
        return Err(mismatch(con, "sos1_to_binaries"));
    };
    let member_bounds = finite_member_bounds(cvt, con, sos)?;
    let flags: Vec<VarId> = sos
        .vars()
        .iter()
        .map(|_| cvt.add_var(Variable::binary()))
        .collect();
    for ((var, b), flag) in sos.vars().iter().zip(member_bounds).zip(&flags) {
        link_member(cvt, *var, b, std::slice::from_ref(flag))?;
    }
    if !flags.is_empty() {
        let expr = affine_sum(flags.iter().map(|f| AffineExpr::var(*f)));
        cvt.add_constraint(Constraint::LinLe(LinCon::new(expr, 1.0)))?;
    }
    add_sum_bounds(cvt, sos)
}

/// At most two consecutive nonzero members, one binary flag per segment.
pub(super) fn sos2_to_binaries<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Sos2(sos) = con else {
        return Err(mismatch(con, "sos2_to_binaries"));
    };
    let n = sos.len();
    if n > 2 {
        let member_bounds = finite_member_bounds(cvt, con, sos)?;
        let segments: Vec<VarId> = (0..n - 1).map(|_| cvt.add_var(Variable::binary())).collect();
        for (i, (var, b)) in sos.vars().iter().zip(member_bounds).enumerate() {
            // member i lies on segments i - 1 and i
            let lo = i.saturating_sub(1);
            let hi = i.min(n - 2);
            link_member(cvt, *var, b, &segments[lo..=hi])?;
        }
        let expr = affine_sum(segments.iter().map(|s| AffineExpr::var(*s)));
        cvt.add_constraint(Constraint::LinLe(LinCon::new(expr, 1.0)))?;
    }
    add_sum_bounds(cvt, sos)
}

/// `expr ⟂ x` for an `x` bounded on one side: the bound is active or the
/// expression is zero.
pub(super) fn compl_lin_to_indicators<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::ComplLin(compl) = con else {
        return Err(mismatch(con, "compl_lin_to_indicators"));
    };
    let x = compl.var;
    let domain = cvt.model().bounds(x);
    let expr = compl.expr.clone();
    let (bound, expr_sign) = match (domain.lower.is_finite(), domain.upper.is_finite()) {
        (false, false) => {
            return cvt.add_constraint(Constraint::LinEq(LinCon::new(expr, 0.0)));
        }
        (true, false) => (domain.lower, ComparisonSense::GreaterEqual),
        (false, true) => (domain.upper, ComparisonSense::LessEqual),
        (true, true) => {
            return Err(failure(
                con,
                format!(
                    "variable {} is bounded on both sides [{}, {}]",
                    x, domain.lower, domain.upper
                ),
            ));
        }
    };
    let flag = cvt.add_var(Variable::binary());
    let at_bound = LinCon::new(AffineExpr::var(x), bound);
    let zero = LinCon::new(expr.clone(), 0.0);
    if expr_sign == ComparisonSense::GreaterEqual {
        // x >= l, expr >= 0, x == l or expr == 0
        cvt.add_constraint(Constraint::LinGe(LinCon::new(expr, 0.0)))?;
        cvt.add_constraint(Constraint::IndLinLe(IndicatorCon::new(flag, 1, at_bound)?))?;
        cvt.add_constraint(Constraint::IndLinLe(IndicatorCon::new(flag, 0, zero)?))
    } else {
        // x <= u, expr <= 0, x == u or expr == 0
        cvt.add_constraint(Constraint::LinLe(LinCon::new(expr, 0.0)))?;
        cvt.add_constraint(Constraint::IndLinGe(IndicatorCon::new(flag, 1, at_bound)?))?;
        cvt.add_constraint(Constraint::IndLinGe(IndicatorCon::new(flag, 0, zero)?))
    }
}
