//! Indicator, SOS and complementarity constraints.

use super::algebraic::ConBody;
use super::error::ConstraintError;
use crate::types::Bounds;
use flatcvt_expr::VarId;

/// `bvar == bval ==> con`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorCon<C> {
    bvar: VarId,
    bval: i32,
    con: C,
}

impl<C> IndicatorCon<C> {
    pub fn new(bvar: VarId, bval: i64, con: C) -> Result<Self, ConstraintError> {
        let bval = match bval {
            0 => 0,
            1 => 1,
            value => return Err(ConstraintError::InvalidIndicatorValue { value }),
        };
        Ok(Self { bvar, bval, con })
    }

    /// Build from a raw (possibly negative) variable index.
    pub fn from_raw(bvar: i64, bval: i64, con: C) -> Result<Self, ConstraintError> {
        let bvar =
            VarId::try_from(bvar).map_err(|_| ConstraintError::InvalidVarIndex { value: bvar })?;
        Self::new(bvar, bval, con)
    }

    pub fn bvar(&self) -> VarId {
        self.bvar
    }

    pub fn bval(&self) -> i32 {
        self.bval
    }

    pub fn con(&self) -> &C {
        &self.con
    }
}

/// Special ordered set: members sorted strictly ascending by weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SosCon {
    vars: Vec<VarId>,
    weights: Vec<f64>,
    sum_bounds: Bounds,
}

impl SosCon {
    pub fn new(vars: Vec<VarId>, weights: Vec<f64>) -> Result<Self, ConstraintError> {
        if vars.len() != weights.len() {
            return Err(ConstraintError::SosLengthMismatch {
                vars: vars.len(),
                weights: weights.len(),
            });
        }
        if let Some(weight) = weights.iter().find(|w| !w.is_finite()) {
            return Err(ConstraintError::NonFiniteSosWeight { weight: *weight });
        }
        let mut members: Vec<(f64, VarId)> = weights.into_iter().zip(vars).collect();
        members.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = members.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ConstraintError::NonUniqueSosWeights { weight: pair[0].0 });
        }
        let (weights, vars) = members.into_iter().unzip();
        Ok(Self {
            vars,
            weights,
            sum_bounds: Bounds::free(),
        })
    }

    /// Extra bounds on the sum of the member variables.
    pub fn with_sum_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.sum_bounds = Bounds::new(lower, upper);
        self
    }

    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn sum_bounds(&self) -> Bounds {
        self.sum_bounds
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// `expr` complements `var`: at a solution, `expr >= 0` when `var` sits on
/// its lower bound, `expr <= 0` on its upper bound, `expr == 0` in between.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementarityCon<E> {
    pub expr: E,
    pub var: VarId,
}

impl<E: ConBody> ComplementarityCon<E> {
    pub fn new(expr: E, var: VarId) -> Self {
        Self {
            expr: expr.normalized(),
            var,
        }
    }
}
