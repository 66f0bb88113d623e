//! Functional constraints `result = f(args)`.
//!
//! Payloads built through the `new` constructors carry [`UNASSIGNED`] as
//! result variable; the converter picks (or reuses) the result variable
//! when the constraint is added.

use super::algebraic::{ConBody, RhsCon};
use super::error::ConstraintError;
use crate::context::Context;
use flatcvt_expr::VarId;

/// Result placeholder of a functional constraint not yet added to a model.
pub const UNASSIGNED: VarId = VarId::new(u32::MAX);

/// `result = expr` for an affine or quadratic expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionalExpr<E> {
    pub result: VarId,
    pub expr: E,
    pub ctx: Context,
}

impl<E: ConBody> FunctionalExpr<E> {
    pub fn new(expr: E) -> Self {
        Self {
            result: UNASSIGNED,
            expr: expr.normalized(),
            ctx: Context::None,
        }
    }

    pub fn with_result(mut self, result: VarId) -> Self {
        self.result = result;
        self
    }
}

/// Generic function over variable arguments and numeric parameters.
///
/// Argument meaning depends on the kind: `Div` is `args[0] / args[1]`,
/// `IfThen` is `args[0] ? args[1] : args[2]`, `NumberofConst` counts
/// `args[i] == params[0]`, `NumberofVar` counts `args[i] == args[0]` for
/// `i >= 1`, `ExpA` is `params[0] ^ args[0]`, `LogA` is
/// `log_{params[0]} args[0]` and `Pow` is `args[0] ^ params[0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCon {
    pub result: VarId,
    pub args: Vec<VarId>,
    pub params: Vec<f64>,
    pub ctx: Context,
}

impl FuncCon {
    pub fn new(args: Vec<VarId>) -> Self {
        Self::with_params(args, Vec::new())
    }

    pub fn with_params(args: Vec<VarId>, params: Vec<f64>) -> Self {
        Self {
            result: UNASSIGNED,
            args,
            params,
            ctx: Context::None,
        }
    }

    pub fn with_result(mut self, result: VarId) -> Self {
        self.result = result;
        self
    }
}

/// Reified comparison `result <=> (body <cmp> rhs)`; the comparison is
/// given by the constraint kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CondCon<E> {
    pub result: VarId,
    pub con: RhsCon<E>,
    pub ctx: Context,
}

impl<E: ConBody> CondCon<E> {
    pub fn new(con: RhsCon<E>) -> Self {
        Self {
            result: UNASSIGNED,
            con,
            ctx: Context::None,
        }
    }

    pub fn with_result(mut self, result: VarId) -> Self {
        self.result = result;
        self
    }
}

/// Piecewise-linear function `result = f(arg)` given by slopes between
/// breakpoints and one point `(x0, y0)` on the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PlCon {
    pub result: VarId,
    pub arg: VarId,
    pub breakpoints: Vec<f64>,
    pub slopes: Vec<f64>,
    pub x0: f64,
    pub y0: f64,
    pub ctx: Context,
}

impl PlCon {
    pub fn new(
        arg: VarId,
        breakpoints: Vec<f64>,
        slopes: Vec<f64>,
        x0: f64,
        y0: f64,
    ) -> Result<Self, ConstraintError> {
        if slopes.len() != breakpoints.len() + 1 {
            return Err(ConstraintError::InvalidPiecewise {
                reason: format!(
                    "{} breakpoints need {} slopes (got {})",
                    breakpoints.len(),
                    breakpoints.len() + 1,
                    slopes.len()
                ),
            });
        }
        if breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConstraintError::InvalidPiecewise {
                reason: "breakpoints must be strictly increasing".to_string(),
            });
        }
        if !(x0.is_finite() && y0.is_finite()) || slopes.iter().any(|s| !s.is_finite()) {
            return Err(ConstraintError::InvalidPiecewise {
                reason: "slopes and anchor point must be finite".to_string(),
            });
        }
        Ok(Self {
            result: UNASSIGNED,
            arg,
            breakpoints,
            slopes,
            x0,
            y0,
            ctx: Context::None,
        })
    }

    pub fn with_result(mut self, result: VarId) -> Self {
        self.result = result;
        self
    }

    // Integral of the slope function over [lo, hi], lo <= hi.
    fn integral(&self, lo: f64, hi: f64) -> f64 {
        let mut total = 0.0;
        for (j, slope) in self.slopes.iter().enumerate() {
            let seg_lo = if j == 0 {
                f64::NEG_INFINITY
            } else {
                self.breakpoints[j - 1]
            };
            let seg_hi = self
                .breakpoints
                .get(j)
                .copied()
                .unwrap_or(f64::INFINITY);
            let overlap = hi.min(seg_hi) - lo.max(seg_lo);
            if overlap > 0.0 {
                total += slope * overlap;
            }
        }
        total
    }

    /// Function value at a finite `x`.
    pub fn eval(&self, x: f64) -> f64 {
        if x >= self.x0 {
            self.y0 + self.integral(self.x0, x)
        } else {
            self.y0 - self.integral(x, self.x0)
        }
    }

    /// Graph points covering `[lower, upper]`: both ends plus every
    /// breakpoint strictly inside.
    pub fn points(&self, lower: f64, upper: f64) -> Vec<(f64, f64)> {
        let mut xs = vec![lower];
        xs.extend(
            self.breakpoints
                .iter()
                .copied()
                .filter(|b| *b > lower && *b < upper),
        );
        if upper > lower {
            xs.push(upper);
        }
        xs.into_iter().map(|x| (x, self.eval(x))).collect()
    }
}
