//! Default rewrite rules for linear MIP backends.
//!
//! - `algebraic` : range splits, functional equalities, division
//! - `logical`   : min/max/abs, boolean connectives, reified comparisons,
//!   counting
//! - `special`   : indicators, piecewise-linear, SOS, complementarity

mod algebraic;
mod logical;
mod special;

use super::RewriteRegistry;
use crate::backend::ModelApi;
use crate::constraints::{ConKind, Constraint};
use crate::error::ConvertError;

// Separation used to express a strict comparison.
pub(super) const CMP_EPS: f64 = 1e-3;

pub(super) fn register_mip<B: ModelApi>(registry: &mut RewriteRegistry<B>) {
    registry.register(ConKind::LinRange, algebraic::split_lin_range);
    registry.register(ConKind::QuadRange, algebraic::split_quad_range);
    registry.register(ConKind::LinearFunctional, algebraic::linear_functional_to_eq);
    registry.register(ConKind::QuadFunctional, algebraic::quad_functional_to_eq);
    registry.register(ConKind::Div, algebraic::div_to_quad);

    registry.register(ConKind::Max, logical::convert_max);
    registry.register(ConKind::Min, logical::convert_min);
    registry.register(ConKind::Abs, logical::abs_to_max);
    registry.register(ConKind::And, logical::convert_and);
    registry.register(ConKind::Or, logical::convert_or);
    registry.register(ConKind::Not, logical::not_to_complement);
    registry.register(ConKind::CondLinEq, logical::convert_cond_lin);
    registry.register(ConKind::CondLinLe, logical::convert_cond_lin);
    registry.register(ConKind::CondLinLt, logical::convert_cond_lin);
    registry.register(ConKind::CondLinGe, logical::convert_cond_lin);
    registry.register(ConKind::CondLinGt, logical::convert_cond_lin);
    registry.register(ConKind::CondQuadEq, logical::convert_cond_quad);
    registry.register(ConKind::CondQuadLe, logical::convert_cond_quad);
    registry.register(ConKind::CondQuadLt, logical::convert_cond_quad);
    registry.register(ConKind::CondQuadGe, logical::convert_cond_quad);
    registry.register(ConKind::CondQuadGt, logical::convert_cond_quad);
    registry.register(ConKind::IfThen, logical::if_then_to_indicators);
    registry.register(ConKind::AllDiff, logical::convert_alldiff);
    registry.register(ConKind::NumberofConst, logical::convert_numberof_const);
    registry.register(ConKind::NumberofVar, logical::convert_numberof_var);
    registry.register(ConKind::Count, logical::convert_count);

    registry.register(ConKind::IndLinLe, special::indicator_big_m);
    registry.register(ConKind::IndLinEq, special::indicator_big_m);
    registry.register(ConKind::IndLinGe, special::indicator_big_m);
    registry.register(ConKind::Pl, special::pl_to_sos2);
    registry.register(ConKind::Sos1, special::sos1_to_binaries);
    registry.register(ConKind::Sos2, special::sos2_to_binaries);
    registry.register(ConKind::ComplLin, special::compl_lin_to_indicators);
}

/// A rule was handed a constraint of the wrong kind.
pub(super) fn mismatch(con: &Constraint, rule: &str) -> ConvertError {
    ConvertError::Invariant {
        reason: format!("{} passed to rule {}", con.type_name(), rule),
    }
}

pub(super) fn failure(con: &Constraint, reason: impl Into<String>) -> ConvertError {
    ConvertError::ConversionFailure {
        kind: con.type_name(),
        reason: reason.into(),
    }
}
