//! Min/max/abs, boolean connectives, reified comparisons and counting.
//!
//! Most rules emit only the half of the reformulation the context asks
//! for: the positive half bounds the result from the side it is used on,
//! the negative half the other one.

use super::{CMP_EPS, failure, mismatch};
use crate::backend::ModelApi;
use crate::constraints::{
    ConBody, CondCon, Constraint, FuncCon, FunctionalExpr, IndicatorCon, LinCon, RhsCon,
};
use crate::context::Context;
use crate::convert::{Converter, bounds};
use crate::error::ConvertError;
use crate::model::ConInfo;
use crate::types::Variable;
use flatcvt_expr::{AffineExpr, QuadExpr, VarId, affine_sum};

fn sum(vars: &[VarId]) -> AffineExpr {
    affine_sum(vars.iter().map(|v| AffineExpr::var(*v)))
}

fn require_booleans<B: ModelApi>(
    cvt: &Converter<B>,
    con: &Constraint,
    vars: &[VarId],
) -> Result<(), ConvertError> {
    match vars.iter().find(|v| !bounds::is_boolean(cvt.model(), **v)) {
        Some(var) => Err(failure(con, format!("argument {var} is not boolean"))),
        None => Ok(()),
    }
}

// ── Min / max / abs ─────────────────────────────────────────

fn convert_extremum<B: ModelApi>(
    cvt: &mut Converter<B>,
    f: &FuncCon,
    is_max: bool,
) -> Result<(), ConvertError> {
    let r = AffineExpr::var(f.result);
    let ctx = f.ctx.resolved();
    if ctx.has_positive() {
        // max: r >= x_i, min: r <= x_i
        for arg in &f.args {
            let x = AffineExpr::var(*arg);
            let body = if is_max { x - r.clone() } else { r.clone() - x };
            cvt.add_constraint(Constraint::LinLe(LinCon::new(body, 0.0)))?;
        }
    }
    if ctx.has_negative() {
        // r equals the argument selected by a flag
        let flags: Vec<VarId> = f.args.iter().map(|_| cvt.add_var(Variable::binary())).collect();
        cvt.add_constraint(Constraint::LinEq(LinCon::new(sum(&flags), 1.0)))?;
        for (arg, flag) in f.args.iter().zip(&flags) {
            let x = AffineExpr::var(*arg);
            let body = if is_max { r.clone() - x } else { x - r.clone() };
            cvt.add_constraint(Constraint::IndLinLe(IndicatorCon::new(
                *flag,
                1,
                LinCon::new(body, 0.0),
            )?))?;
        }
    }
    Ok(())
}

pub(super) fn convert_max<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Max(f) = con else {
        return Err(mismatch(con, "convert_max"));
    };
    convert_extremum(cvt, f, true)
}

pub(super) fn convert_min<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Min(f) = con else {
        return Err(mismatch(con, "convert_min"));
    };
    convert_extremum(cvt, f, false)
}

/// `|x|` as `max(x, -x)`.
pub(super) fn abs_to_max<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Abs(f) = con else {
        return Err(mismatch(con, "abs_to_max"));
    };
    let x = f.args[0];
    let neg = cvt.convert_to_var(-AffineExpr::var(x))?;
    let mut max = FuncCon::new(vec![x, neg]).with_result(f.result);
    max.ctx = f.ctx;
    cvt.redefine_variable(f.result, Constraint::Max(max))
}

// ── Boolean connectives ─────────────────────────────────────

pub(super) fn convert_and<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::And(f) = con else {
        return Err(mismatch(con, "convert_and"));
    };
    require_booleans(cvt, con, &f.args)?;
    if f.args.is_empty() {
        return cvt.narrow_var_bounds(f.result, 1.0, 1.0).map(|_| ());
    }
    let r = AffineExpr::var(f.result);
    let ctx = f.ctx.resolved();
    if ctx.has_positive() {
        for arg in &f.args {
            let body = r.clone() - AffineExpr::var(*arg);
            cvt.add_constraint(Constraint::LinLe(LinCon::new(body, 0.0)))?;
        }
    }
    if ctx.has_negative() {
        let n = f.args.len() as f64;
        let body = r - sum(&f.args);
        cvt.add_constraint(Constraint::LinGe(LinCon::new(body, 1.0 - n)))?;
    }
    Ok(())
}

pub(super) fn convert_or<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Or(f) = con else {
        return Err(mismatch(con, "convert_or"));
    };
    require_booleans(cvt, con, &f.args)?;
    if f.args.is_empty() {
        return cvt.narrow_var_bounds(f.result, 0.0, 0.0).map(|_| ());
    }
    let r = AffineExpr::var(f.result);
    let ctx = f.ctx.resolved();
    if ctx.has_positive() {
        let body = r.clone() - sum(&f.args);
        cvt.add_constraint(Constraint::LinLe(LinCon::new(body, 0.0)))?;
    }
    if ctx.has_negative() {
        for arg in &f.args {
            let body = r.clone() - AffineExpr::var(*arg);
            cvt.add_constraint(Constraint::LinGe(LinCon::new(body, 0.0)))?;
        }
    }
    Ok(())
}

/// `r = !b` redefined as `r = 1 - b`.
pub(super) fn not_to_complement<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Not(f) = con else {
        return Err(mismatch(con, "not_to_complement"));
    };
    require_booleans(cvt, con, &f.args)?;
    let expr = AffineExpr::from_constant(1.0) - AffineExpr::var(f.args[0]);
    cvt.redefine_variable(f.result, Constraint::LinearFunctional(FunctionalExpr::new(expr)))
}

// ── Reified comparisons ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Le,
    Lt,
    Ge,
    Gt,
}

/// Constraint constructors for one body type.
struct CondKinds<E> {
    ind_le: fn(IndicatorCon<RhsCon<E>>) -> Constraint,
    ind_eq: fn(IndicatorCon<RhsCon<E>>) -> Constraint,
    ind_ge: fn(IndicatorCon<RhsCon<E>>) -> Constraint,
    cond_lt: fn(CondCon<E>) -> Constraint,
    cond_gt: fn(CondCon<E>) -> Constraint,
}

const LIN_KINDS: CondKinds<AffineExpr> = CondKinds {
    ind_le: Constraint::IndLinLe,
    ind_eq: Constraint::IndLinEq,
    ind_ge: Constraint::IndLinGe,
    cond_lt: Constraint::CondLinLt,
    cond_gt: Constraint::CondLinGt,
};

const QUAD_KINDS: CondKinds<QuadExpr> = CondKinds {
    ind_le: Constraint::IndQuadLe,
    ind_eq: Constraint::IndQuadEq,
    ind_ge: Constraint::IndQuadGe,
    cond_lt: Constraint::CondQuadLt,
    cond_gt: Constraint::CondQuadGt,
};

// `r <=> (body cmp rhs)` through indicators on `r`.
fn convert_cond<B: ModelApi, E: ConBody>(
    cvt: &mut Converter<B>,
    c: &CondCon<E>,
    cmp: Cmp,
    kinds: &CondKinds<E>,
    integral: bool,
) -> Result<(), ConvertError> {
    let r = c.result;
    let ctx = c.ctx.resolved();
    let body = c.con.body();
    let rhs = c.con.rhs();
    let eps = if integral { 1.0 } else { CMP_EPS };
    let implies = |value: i64, wrap: fn(IndicatorCon<RhsCon<E>>) -> Constraint, rhs: f64| {
        IndicatorCon::new(r, value, RhsCon::new(body.clone(), rhs)).map(wrap)
    };

    // (positive half, negative half) as (r = 1 ==> ..., r = 0 ==> ...)
    match cmp {
        Cmp::Le | Cmp::Lt | Cmp::Ge | Cmp::Gt => {
            let (pos, neg) = match cmp {
                Cmp::Le => (
                    implies(1, kinds.ind_le, rhs)?,
                    implies(0, kinds.ind_ge, rhs + eps)?,
                ),
                Cmp::Lt => (
                    implies(1, kinds.ind_le, rhs - eps)?,
                    implies(0, kinds.ind_ge, rhs)?,
                ),
                Cmp::Ge => (
                    implies(1, kinds.ind_ge, rhs)?,
                    implies(0, kinds.ind_le, rhs - eps)?,
                ),
                _ => (
                    implies(1, kinds.ind_ge, rhs + eps)?,
                    implies(0, kinds.ind_le, rhs)?,
                ),
            };
            if ctx.has_positive() {
                cvt.add_constraint(pos)?;
            }
            if ctx.has_negative() {
                cvt.add_constraint(neg)?;
            }
        }
        Cmp::Eq => {
            if ctx.has_positive() {
                cvt.add_constraint(implies(1, kinds.ind_eq, rhs)?)?;
            }
            if ctx.has_negative() {
                // r = 0 ==> body < rhs or body > rhs
                let below = (kinds.cond_lt)(CondCon::new(RhsCon::new(body.clone(), rhs)));
                let above = (kinds.cond_gt)(CondCon::new(RhsCon::new(body.clone(), rhs)));
                let lt = cvt.assign_result_var(below)?;
                let gt = cvt.assign_result_var(above)?;
                for flag in [lt, gt] {
                    let b = cvt.model().bounds(flag);
                    cvt.propagate_result_of_init_expr(flag, b.lower, b.upper, Context::Positive)?;
                }
                let body = AffineExpr::var(r) + AffineExpr::var(lt) + AffineExpr::var(gt);
                cvt.add_constraint(Constraint::LinGe(LinCon::new(body, 1.0)))?;
            }
        }
    }
    Ok(())
}

pub(super) fn convert_cond_lin<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let (c, cmp) = match con {
        Constraint::CondLinEq(c) => (c, Cmp::Eq),
        Constraint::CondLinLe(c) => (c, Cmp::Le),
        Constraint::CondLinLt(c) => (c, Cmp::Lt),
        Constraint::CondLinGe(c) => (c, Cmp::Ge),
        Constraint::CondLinGt(c) => (c, Cmp::Gt),
        _ => return Err(mismatch(con, "convert_cond_lin")),
    };
    let integral = bounds::is_integral_affine(cvt.model(), c.con.body())
        && c.con.rhs().fract() == 0.0;
    convert_cond(cvt, c, cmp, &LIN_KINDS, integral)
}

pub(super) fn convert_cond_quad<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let (c, cmp) = match con {
        Constraint::CondQuadEq(c) => (c, Cmp::Eq),
        Constraint::CondQuadLe(c) => (c, Cmp::Le),
        Constraint::CondQuadLt(c) => (c, Cmp::Lt),
        Constraint::CondQuadGe(c) => (c, Cmp::Ge),
        Constraint::CondQuadGt(c) => (c, Cmp::Gt),
        _ => return Err(mismatch(con, "convert_cond_quad")),
    };
    let integral =
        bounds::is_integral_quad(cvt.model(), c.con.body()) && c.con.rhs().fract() == 0.0;
    convert_cond(cvt, c, cmp, &QUAD_KINDS, integral)
}

/// `r = c ? a : b` as two indicator equalities on `c`.
pub(super) fn if_then_to_indicators<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::IfThen(f) = con else {
        return Err(mismatch(con, "if_then_to_indicators"));
    };
    let (cond, then, other) = (f.args[0], f.args[1], f.args[2]);
    require_booleans(cvt, con, &[cond])?;
    let r = AffineExpr::var(f.result);
    for (value, branch) in [(1, then), (0, other)] {
        let body = r.clone() - AffineExpr::var(branch);
        cvt.add_constraint(Constraint::IndLinEq(IndicatorCon::new(
            cond,
            value,
            LinCon::new(body, 0.0),
        )?))?;
    }
    Ok(())
}

// ── Counting ────────────────────────────────────────────────

// Flag for `expr == value`, created in `ctx`.
fn equality_flag<B: ModelApi>(
    cvt: &mut Converter<B>,
    expr: AffineExpr,
    value: f64,
    ctx: Context,
) -> Result<VarId, ConvertError> {
    let flag =
        cvt.assign_result_var(Constraint::CondLinEq(CondCon::new(LinCon::new(expr, value))))?;
    let b = cvt.model().bounds(flag);
    cvt.propagate_result_of_init_expr(flag, b.lower, b.upper, ctx)?;
    Ok(flag)
}

// Values a single alldiff may expand into equality flags.
const MAX_ALLDIFF_VALUES: i128 = 100_000;

// Sorted disjoint ranges of values lying in at least two of `domains`.
fn shared_ranges(domains: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let mut overlaps = Vec::new();
    for (i, (lo_a, hi_a)) in domains.iter().enumerate() {
        for (lo_b, hi_b) in &domains[i + 1..] {
            let (lo, hi) = ((*lo_a).max(*lo_b), (*hi_a).min(*hi_b));
            if lo <= hi {
                overlaps.push((lo, hi));
            }
        }
    }
    overlaps.sort_unstable();
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(overlaps.len());
    for (lo, hi) in overlaps {
        match merged.last_mut() {
            Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// All arguments pairwise different, in positive context only.
pub(super) fn convert_alldiff<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::AllDiff(f) = con else {
        return Err(mismatch(con, "convert_alldiff"));
    };
    if f.ctx.resolved().has_negative() {
        return Err(failure(con, "only supported in positive context"));
    }
    let model = cvt.model();
    let mut domains = Vec::with_capacity(f.args.len());
    for arg in &f.args {
        let b = model.bounds(*arg);
        if !model.var(*arg).is_integer() || !b.is_finite() {
            return Err(failure(
                con,
                format!("argument {arg} needs a finite integer domain"),
            ));
        }
        domains.push((b.lower as i64, b.upper as i64));
    }
    let shared = shared_ranges(&domains);
    let count: i128 = shared
        .iter()
        .map(|(lo, hi)| i128::from(*hi) - i128::from(*lo) + 1)
        .sum();
    if count > MAX_ALLDIFF_VALUES {
        return Err(failure(
            con,
            format!("{count} shared domain values exceed the limit of {MAX_ALLDIFF_VALUES}"),
        ));
    }

    let r = f.result;
    for value in shared.iter().flat_map(|(lo, hi)| *lo..=*hi) {
        let users: Vec<VarId> = f
            .args
            .iter()
            .copied()
            .filter(|arg| cvt.model().bounds(*arg).contains(value as f64))
            .collect();
        if users.len() < 2 {
            continue;
        }
        let mut flags = Vec::with_capacity(users.len());
        for arg in users {
            flags.push(equality_flag(
                cvt,
                AffineExpr::var(arg),
                value as f64,
                Context::Negative,
            )?);
        }
        // r = 1 ==> at most one argument takes `value`
        let n = flags.len() as f64;
        let body = sum(&flags) + AffineExpr::term(r, n);
        cvt.add_constraint(Constraint::LinLe(LinCon::new(body, n + 1.0)))?;
    }
    Ok(())
}

/// `r = #{i : x_i == k}`.
pub(super) fn convert_numberof_const<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::NumberofConst(f) = con else {
        return Err(mismatch(con, "convert_numberof_const"));
    };
    let k = f.params[0];
    let mut flags = Vec::with_capacity(f.args.len());
    for arg in &f.args {
        flags.push(equality_flag(cvt, AffineExpr::var(*arg), k, Context::Mixed)?);
    }
    let body = AffineExpr::var(f.result) - sum(&flags);
    cvt.add_constraint(Constraint::LinEq(LinCon::new(body, 0.0)))
}

/// `r = #{i >= 1 : x_i == x_0}`.
pub(super) fn convert_numberof_var<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::NumberofVar(f) = con else {
        return Err(mismatch(con, "convert_numberof_var"));
    };
    let pattern = AffineExpr::var(f.args[0]);
    let mut flags = Vec::with_capacity(f.args.len() - 1);
    for arg in &f.args[1..] {
        let diff = AffineExpr::var(*arg) - pattern.clone();
        flags.push(equality_flag(cvt, diff, 0.0, Context::Mixed)?);
    }
    let body = AffineExpr::var(f.result) - sum(&flags);
    cvt.add_constraint(Constraint::LinEq(LinCon::new(body, 0.0)))
}

/// `r = #{i : x_i != 0}` as `r + sum(x_i == 0) == n`.
pub(super) fn convert_count<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Count(f) = con else {
        return Err(mismatch(con, "convert_count"));
    };
    let mut zeros = Vec::with_capacity(f.args.len());
    for arg in &f.args {
        zeros.push(equality_flag(cvt, AffineExpr::var(*arg), 0.0, Context::Mixed)?);
    }
    let body = AffineExpr::var(f.result) + sum(&zeros);
    cvt.add_constraint(Constraint::LinEq(LinCon::new(body, f.args.len() as f64)))
}
