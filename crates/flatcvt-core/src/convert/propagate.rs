//! Bound narrowing and context propagation along init expressions.

use super::Converter;
use crate::backend::ModelApi;
use crate::constraints::Constraint;
use crate::context::Context;
use crate::error::ConvertError;
use crate::model::ConInfo;
use crate::types::{Bounds, VarType};
use flatcvt_expr::VarId;

// Slack for rounding integer bounds inward.
const INTEGRALITY_TOL: f64 = 1e-9;

impl<B: ModelApi> Converter<B> {
    /// Intersect the domain of `var` with `[lb, ub]`.
    ///
    /// Integer domains are rounded inward. Returns whether the domain
    /// changed; an empty result is [`ConvertError::Infeasible`].
    pub fn narrow_var_bounds(&mut self, var: VarId, lb: f64, ub: f64) -> Result<bool, ConvertError> {
        self.model.check_var(var)?;
        let current = self.model.bounds(var);
        let mut narrowed = current.intersect(&Bounds::new(lb, ub));
        if self.model.var_type(var) == VarType::Integer {
            narrowed = Bounds::new(
                (narrowed.lower - INTEGRALITY_TOL).ceil(),
                (narrowed.upper + INTEGRALITY_TOL).floor(),
            );
        }
        if narrowed.is_empty() {
            return Err(ConvertError::Infeasible {
                reason: format!(
                    "variable {} with domain [{}, {}] narrowed to [{}, {}]",
                    var, current.lower, current.upper, lb, ub
                ),
            });
        }
        // Rounding never widens.
        let narrowed = narrowed.intersect(&current);
        if narrowed == current {
            return Ok(false);
        }
        self.model.set_bounds(var, narrowed);
        tracing::trace!(
            component = "propagator",
            operation = "narrow_var_bounds",
            status = "success",
            var = var.inner(),
            lower = narrowed.lower,
            upper = narrowed.upper,
            "Narrowed variable bounds"
        );
        Ok(true)
    }

    /// Narrow `var` to `[lb, ub]` and merge `ctx` into its init expression,
    /// continuing into the expression's arguments while anything changes.
    pub fn propagate_result_of_init_expr(
        &mut self,
        var: VarId,
        lb: f64,
        ub: f64,
        ctx: Context,
    ) -> Result<(), ConvertError> {
        let narrowed = self.narrow_var_bounds(var, lb, ub)?;
        let Some(info) = self.model.init_expr(var) else {
            return Ok(());
        };
        self.propagate_result(info, narrowed, ctx)
    }

    /// A boolean that must be true.
    pub fn fix_as_true(&mut self, var: VarId) -> Result<(), ConvertError> {
        self.propagate_result_of_init_expr(var, 1.0, 1.0, Context::Positive)
    }

    pub(super) fn propagate_mixed(&mut self, var: VarId) -> Result<(), ConvertError> {
        self.model.check_var(var)?;
        let bounds = self.model.bounds(var);
        self.propagate_result_of_init_expr(var, bounds.lower, bounds.upper, Context::Mixed)
    }

    fn propagate_result(
        &mut self,
        info: ConInfo,
        narrowed: bool,
        ctx: Context,
    ) -> Result<(), ConvertError> {
        let Some(con) = self.model.constraint_mut(info) else {
            return Err(ConvertError::Invariant {
                reason: format!("init expression {} #{} missing", info.kind.type_name(), info.index),
            });
        };
        let Some(stored) = con.context_mut() else {
            return Ok(());
        };
        let before = *stored;
        let merged = before.merge(ctx);
        let changed = merged != before;
        *stored = merged;
        if !changed && !narrowed {
            return Ok(());
        }
        let con = con.clone();
        if changed && self.model.keeper(info.kind).is_bridged(info.index) {
            self.requeue_added_context(&con, before)?;
        }
        self.propagate_args(&con, merged)
    }

    /// Store a copy of a converted constraint whose context grew after its
    /// rewrite. The copy carries only the part of the context the rewrite
    /// did not cover, so the conversion loop emits the missing half.
    ///
    /// The copy is not mapped and does not become the init expression.
    pub(super) fn requeue_added_context(
        &mut self,
        con: &Constraint,
        before: Context,
    ) -> Result<(), ConvertError> {
        let Some(after) = con.context() else {
            return Ok(());
        };
        let added = match before {
            Context::Positive => Context::Negative,
            Context::Negative => Context::Positive,
            _ => after,
        };
        if added == before {
            return Ok(());
        }
        let mut copy = con.clone();
        if let Some(ctx) = copy.context_mut() {
            *ctx = added;
        }
        let info = self.store_entry(copy, false)?;
        tracing::debug!(
            component = "propagator",
            operation = "requeue_added_context",
            status = "success",
            kind = info.kind.type_name(),
            index = info.index,
            ctx = added.as_str(),
            "Queued converted constraint for its added context"
        );
        Ok(())
    }

    // Push the result's domain and context down to the arguments.
    fn propagate_args(&mut self, con: &Constraint, ctx: Context) -> Result<(), ConvertError> {
        let Some(result) = con.result_var() else {
            return Ok(());
        };
        let result_bounds = self.model.bounds(result);
        match con {
            Constraint::LinearFunctional(f) => {
                for (var, coef) in f.expr.terms().iter() {
                    self.propagate_keep_bounds(var, if coef > 0.0 { ctx } else { -ctx })?;
                }
            }
            Constraint::QuadFunctional(f) => {
                for (var, coef) in f.expr.lin_terms().iter() {
                    self.propagate_keep_bounds(var, if coef > 0.0 { ctx } else { -ctx })?;
                }
                for (a, b, _) in f.expr.quad_terms().iter() {
                    self.propagate_keep_bounds(a, Context::Mixed)?;
                    self.propagate_keep_bounds(b, Context::Mixed)?;
                }
            }
            Constraint::Max(f) | Constraint::Min(f) => {
                for arg in &f.args {
                    self.propagate_keep_bounds(*arg, ctx)?;
                }
            }
            Constraint::And(f) => {
                let lower = if result_bounds.lower >= 1.0 { 1.0 } else { f64::NEG_INFINITY };
                for arg in &f.args {
                    self.propagate_result_of_init_expr(*arg, lower, f64::INFINITY, ctx)?;
                }
            }
            Constraint::Or(f) => {
                let upper = if result_bounds.upper <= 0.0 { 0.0 } else { f64::INFINITY };
                for arg in &f.args {
                    self.propagate_result_of_init_expr(*arg, f64::NEG_INFINITY, upper, ctx)?;
                }
            }
            Constraint::Not(f) => {
                let arg = f.args[0];
                let bounds = match self.model.fixed_value(result) {
                    Some(value) => Bounds::fixed(1.0 - value),
                    None => self.model.bounds(arg),
                };
                self.propagate_result_of_init_expr(arg, bounds.lower, bounds.upper, -ctx)?;
            }
            Constraint::IfThen(f) => {
                self.propagate_keep_bounds(f.args[0], Context::Mixed)?;
                self.propagate_keep_bounds(f.args[1], ctx)?;
                self.propagate_keep_bounds(f.args[2], ctx)?;
            }
            other => {
                for var in other.vars() {
                    if var != result {
                        self.propagate_keep_bounds(var, Context::Mixed)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn propagate_keep_bounds(&mut self, var: VarId, ctx: Context) -> Result<(), ConvertError> {
        let bounds = self.model.bounds(var);
        self.propagate_result_of_init_expr(var, bounds.lower, bounds.upper, ctx)
    }
}
