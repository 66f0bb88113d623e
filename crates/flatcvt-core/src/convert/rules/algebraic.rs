//! Range splits, functional equalities and division.

use super::{failure, mismatch};
use crate::backend::ModelApi;
use crate::constraints::{ConBody, Constraint, LinCon, QuadCon, RangeCon, RhsCon};
use crate::convert::Converter;
use crate::error::ConvertError;
use crate::model::ConInfo;
use flatcvt_expr::{AffineExpr, QuadExpr};

// `lower <= body <= upper` as single-sided constraints.
fn split_range<B: ModelApi, E: ConBody>(
    cvt: &mut Converter<B>,
    range: &RangeCon<E>,
    le: fn(RhsCon<E>) -> Constraint,
    eq: fn(RhsCon<E>) -> Constraint,
    ge: fn(RhsCon<E>) -> Constraint,
) -> Result<(), ConvertError> {
    let (lower, upper) = (range.lower(), range.upper());
    if lower > upper {
        return Err(ConvertError::Infeasible {
            reason: format!("range constraint with bounds [{lower}, {upper}]"),
        });
    }
    let body = range.body();
    if lower == upper {
        return cvt.add_constraint(eq(RhsCon::new(body.clone(), lower)));
    }
    if lower.is_finite() {
        cvt.add_constraint(ge(RhsCon::new(body.clone(), lower)))?;
    }
    if upper.is_finite() {
        cvt.add_constraint(le(RhsCon::new(body.clone(), upper)))?;
    }
    Ok(())
}

pub(super) fn split_lin_range<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::LinRange(range) = con else {
        return Err(mismatch(con, "split_lin_range"));
    };
    split_range(
        cvt,
        range,
        Constraint::LinLe,
        Constraint::LinEq,
        Constraint::LinGe,
    )
}

pub(super) fn split_quad_range<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::QuadRange(range) = con else {
        return Err(mismatch(con, "split_quad_range"));
    };
    split_range(
        cvt,
        range,
        Constraint::QuadLe,
        Constraint::QuadEq,
        Constraint::QuadGe,
    )
}

/// `r = expr` as `expr - r == 0`.
pub(super) fn linear_functional_to_eq<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::LinearFunctional(f) = con else {
        return Err(mismatch(con, "linear_functional_to_eq"));
    };
    let body = f.expr.clone() - AffineExpr::var(f.result);
    cvt.add_constraint(Constraint::LinEq(LinCon::new(body, 0.0)))
}

pub(super) fn quad_functional_to_eq<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::QuadFunctional(f) = con else {
        return Err(mismatch(con, "quad_functional_to_eq"));
    };
    let body = f
        .expr
        .add(&QuadExpr::from_affine(AffineExpr::term(f.result, -1.0)));
    cvt.add_constraint(Constraint::QuadEq(QuadCon::new(body, 0.0)))
}

/// `r = x / y` as `r * y - x == 0`, valid only while `y` cannot be zero.
pub(super) fn div_to_quad<B: ModelApi>(
    cvt: &mut Converter<B>,
    con: &Constraint,
    _info: ConInfo,
) -> Result<(), ConvertError> {
    let Constraint::Div(f) = con else {
        return Err(mismatch(con, "div_to_quad"));
    };
    let (x, y) = (f.args[0], f.args[1]);
    let divisor = cvt.model().bounds(y);
    if divisor.contains(0.0) {
        return Err(failure(
            con,
            format!(
                "divisor domain [{}, {}] contains zero",
                divisor.lower, divisor.upper
            ),
        ));
    }
    let body = QuadExpr::product(f.result, y, 1.0)
        .add(&QuadExpr::from_affine(AffineExpr::term(x, -1.0)));
    cvt.add_constraint(Constraint::QuadEq(QuadCon::new(body, 0.0)))
}
