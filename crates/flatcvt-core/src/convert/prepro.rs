//! Folding of functional constraints before they are stored.

use super::{Converter, bounds};
use crate::backend::ModelApi;
use crate::constraints::{CondCon, Constraint, FuncCon, FunctionalExpr};
use crate::error::ConvertError;
use crate::model::FlatModel;
use flatcvt_expr::{AffineExpr, VarId};

/// What to do with a functional constraint about to be stored.
#[derive(Debug)]
pub(super) enum Prepro {
    /// Store it (possibly with simplified arguments).
    Keep(Constraint),
    /// Its result is this constant.
    Fixed(f64),
    /// Its result is this existing variable.
    Var(VarId),
    /// Its result is defined by this other constraint instead.
    Rewrite(Constraint),
}

fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Simplify `con` using the current variable domains.
///
/// Does nothing unless `cvt:pre:all` is on.
pub(super) fn preprocess<B: ModelApi>(
    cvt: &Converter<B>,
    con: Constraint,
) -> Result<Prepro, ConvertError> {
    let options = cvt.options();
    if !options.preprocess {
        return Ok(Prepro::Keep(con));
    }
    let model = cvt.model();
    let outcome = match con {
        Constraint::And(f) => fold_and(model, f),
        Constraint::Or(f) => fold_or(model, f),
        Constraint::Not(f) => match model.fixed_value(f.args[0]) {
            Some(v) => Prepro::Fixed(bool_value(v == 0.0)),
            None => Prepro::Keep(Constraint::Not(f)),
        },
        Constraint::Max(f) => fold_extremum(model, f, true),
        Constraint::Min(f) => fold_extremum(model, f, false),
        Constraint::Abs(f) => {
            let arg = f.args[0];
            match model.fixed_value(arg) {
                Some(v) => Prepro::Fixed(v.abs()),
                None if model.lb(arg) >= 0.0 => Prepro::Var(arg),
                None => Prepro::Keep(Constraint::Abs(f)),
            }
        }
        Constraint::IfThen(f) => match model.fixed_value(f.args[0]) {
            Some(cond) => Prepro::Var(if cond != 0.0 { f.args[1] } else { f.args[2] }),
            None => Prepro::Keep(Constraint::IfThen(f)),
        },
        Constraint::Div(f) => match (model.fixed_value(f.args[0]), model.fixed_value(f.args[1])) {
            (Some(x), Some(y)) if y != 0.0 => Prepro::Fixed(x / y),
            _ => Prepro::Keep(Constraint::Div(f)),
        },
        Constraint::Count(f) => match fixed_args(model, &f.args) {
            Some(values) => Prepro::Fixed(values.iter().filter(|v| **v != 0.0).count() as f64),
            None => Prepro::Keep(Constraint::Count(f)),
        },
        Constraint::NumberofConst(f) => match fixed_args(model, &f.args) {
            Some(values) => {
                Prepro::Fixed(values.iter().filter(|v| **v == f.params[0]).count() as f64)
            }
            None => Prepro::Keep(Constraint::NumberofConst(f)),
        },
        Constraint::Exp(f) => fold_unary(model, f, Constraint::Exp, f64::exp),
        Constraint::Log(f) => fold_unary(model, f, Constraint::Log, f64::ln),
        Constraint::Sin(f) => fold_unary(model, f, Constraint::Sin, f64::sin),
        Constraint::Cos(f) => fold_unary(model, f, Constraint::Cos, f64::cos),
        Constraint::Tan(f) => fold_unary(model, f, Constraint::Tan, f64::tan),
        Constraint::ExpA(f) => {
            let base = f.params[0];
            fold_unary(model, f, Constraint::ExpA, |x| base.powf(x))
        }
        Constraint::LogA(f) => {
            let base = f.params[0];
            fold_unary(model, f, Constraint::LogA, |x| x.ln() / base.ln())
        }
        Constraint::Pow(f) => {
            let exponent = f.params[0];
            fold_unary(model, f, Constraint::Pow, |x| x.powf(exponent))
        }
        Constraint::Pl(pl) => match model.fixed_value(pl.arg) {
            Some(x) => Prepro::Fixed(pl.eval(x)),
            None => Prepro::Keep(Constraint::Pl(pl)),
        },
        Constraint::CondLinEq(c) => fold_cond_eq(cvt, c),
        Constraint::CondLinLe(c) => fold_cond_cmp(model, c, Constraint::CondLinLe, |lo, hi, rhs| {
            decide(hi <= rhs, lo > rhs)
        }),
        Constraint::CondLinLt(c) => fold_cond_cmp(model, c, Constraint::CondLinLt, |lo, hi, rhs| {
            decide(hi < rhs, lo >= rhs)
        }),
        Constraint::CondLinGe(c) => fold_cond_cmp(model, c, Constraint::CondLinGe, |lo, hi, rhs| {
            decide(lo >= rhs, hi < rhs)
        }),
        Constraint::CondLinGt(c) => fold_cond_cmp(model, c, Constraint::CondLinGt, |lo, hi, rhs| {
            decide(lo > rhs, hi <= rhs)
        }),
        other => Prepro::Keep(other),
    };
    Ok(outcome)
}

fn decide(always: bool, never: bool) -> Option<bool> {
    if always {
        Some(true)
    } else if never {
        Some(false)
    } else {
        None
    }
}

fn fixed_args(model: &FlatModel, args: &[VarId]) -> Option<Vec<f64>> {
    args.iter().map(|v| model.fixed_value(*v)).collect()
}

fn fold_unary(
    model: &FlatModel,
    f: FuncCon,
    wrap: fn(FuncCon) -> Constraint,
    eval: impl Fn(f64) -> f64,
) -> Prepro {
    match model.fixed_value(f.args[0]).map(eval) {
        Some(value) if value.is_finite() => Prepro::Fixed(value),
        _ => Prepro::Keep(wrap(f)),
    }
}

fn fold_and(model: &FlatModel, mut f: FuncCon) -> Prepro {
    if f.args.iter().any(|v| model.fixed_value(*v) == Some(0.0)) {
        return Prepro::Fixed(0.0);
    }
    f.args.retain(|v| model.fixed_value(*v).is_none());
    match f.args.as_slice() {
        [] => Prepro::Fixed(1.0),
        [single] => Prepro::Var(*single),
        _ => Prepro::Keep(Constraint::And(f)),
    }
}

fn fold_or(model: &FlatModel, mut f: FuncCon) -> Prepro {
    if f.args
        .iter()
        .any(|v| model.fixed_value(*v).is_some_and(|x| x != 0.0))
    {
        return Prepro::Fixed(1.0);
    }
    f.args.retain(|v| model.fixed_value(*v).is_none());
    match f.args.as_slice() {
        [] => Prepro::Fixed(0.0),
        [single] => Prepro::Var(*single),
        _ => Prepro::Keep(Constraint::Or(f)),
    }
}

fn fold_extremum(model: &FlatModel, f: FuncCon, is_max: bool) -> Prepro {
    if let [single] = f.args.as_slice() {
        return Prepro::Var(*single);
    }
    if let Some(values) = fixed_args(model, &f.args) {
        let folded = if is_max {
            values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        } else {
            values.iter().copied().fold(f64::INFINITY, f64::min)
        };
        return Prepro::Fixed(folded);
    }
    if is_max {
        Prepro::Keep(Constraint::Max(f))
    } else {
        Prepro::Keep(Constraint::Min(f))
    }
}

fn fold_cond_cmp(
    model: &FlatModel,
    c: CondCon<AffineExpr>,
    wrap: fn(CondCon<AffineExpr>) -> Constraint,
    test: impl Fn(f64, f64, f64) -> Option<bool>,
) -> Prepro {
    let body = bounds::affine_bounds(model, c.con.body());
    match test(body.lower, body.upper, c.con.rhs()) {
        Some(value) => Prepro::Fixed(bool_value(value)),
        None => Prepro::Keep(wrap(c)),
    }
}

// `r <=> (body == rhs)`.
fn fold_cond_eq<B: ModelApi>(cvt: &Converter<B>, c: CondCon<AffineExpr>) -> Prepro {
    let model = cvt.model();
    let options = cvt.options();
    let rhs = c.con.rhs();
    if options.eq_result_enabled() {
        let body = bounds::affine_bounds(model, c.con.body());
        if !body.contains(rhs) {
            return Prepro::Fixed(0.0);
        }
        if body.is_fixed() {
            return Prepro::Fixed(1.0);
        }
    }
    if options.eq_binary_enabled() {
        if let [(var, coef)] = c.con.body().terms().as_slice() {
            if bounds::is_boolean(model, *var) && !model.is_fixed(*var) {
                let value = rhs / coef;
                if value == 1.0 {
                    return Prepro::Var(*var);
                }
                if value == 0.0 {
                    return Prepro::Rewrite(Constraint::LinearFunctional(FunctionalExpr::new(
                        AffineExpr::from_constant(1.0) - AffineExpr::var(*var),
                    )));
                }
            }
        }
    }
    Prepro::Keep(Constraint::CondLinEq(c))
}
