//! Breadth-first conversion loop and the push to the backend.

use super::Converter;
use crate::backend::{AcceptanceLevel, ModelApi};
use crate::constraints::{ConKind, Constraint};
use crate::context::Context;
use crate::error::ConvertError;
use crate::model::ConInfo;
use crate::presolve::NodeRange;
use crate::types::VarType;
use flatcvt_expr::VarId;

impl<B: ModelApi> Converter<B> {
    /// Convert until no stored constraint needs a rewrite, then run the
    /// whole-model passes.
    pub(super) fn convert_items(&mut self) -> Result<(), ConvertError> {
        self.convert_all_constraints()?;
        self.convert_maps()?;
        self.preprocess_final()
    }

    fn convert_all_constraints(&mut self) -> Result<(), ConvertError> {
        loop {
            self.passes += 1;
            let mut any = false;
            for kind in ConKind::ALL {
                // Every kind runs in every pass.
                any |= self.convert_all_new(*kind)?;
            }
            tracing::debug!(
                component = "engine",
                operation = "convert_pass",
                status = "success",
                pass = self.passes,
                rewrites = self.rewrites,
                constraints = self.model.num_constraints(),
                vars = self.model.num_vars(),
                "Finished conversion pass"
            );
            if !any {
                return Ok(());
            }
        }
    }

    /// Visit the constraints of `kind` not seen yet, including those added
    /// while visiting. Returns whether anything was rewritten.
    fn convert_all_new(&mut self, kind: ConKind) -> Result<bool, ConvertError> {
        let level = self.acceptance(kind);
        let mut any = false;
        while self.model.keeper(kind).cursor() < self.model.keeper(kind).len() {
            let index = self.model.keeper(kind).cursor();
            self.model.keeper_mut(kind).advance_cursor();
            if self.model.keeper(kind).is_bridged(index) {
                continue;
            }
            let info = ConInfo::new(kind, index);
            match level {
                AcceptanceLevel::NotAccepted => {
                    self.run_conversion(info)?;
                    any = true;
                }
                AcceptanceLevel::AcceptedButNotRecommended => {
                    if !self.registry.has_rule(kind) {
                        continue;
                    }
                    match self.run_conversion(info) {
                        Ok(()) => any = true,
                        Err(ConvertError::ConversionFailure { kind, reason }) => {
                            tracing::warn!(
                                component = "engine",
                                operation = "convert",
                                status = "fallback",
                                kind,
                                index,
                                reason = reason.as_str(),
                                "Rewrite failed, passing constraint to the backend"
                            );
                            self.warnings
                                .push(format!("{kind} #{index}: {reason}"));
                        }
                        Err(err) => return Err(err),
                    }
                }
                AcceptanceLevel::Recommended => {
                    let needs = self
                        .model
                        .constraint(info)
                        .is_some_and(|con| self.backend.needs_conversion(con));
                    if needs {
                        self.run_conversion(info)?;
                        any = true;
                    }
                }
            }
        }
        Ok(any)
    }

    /// Apply the registered rule to one constraint, linking everything it
    /// creates from the constraint's value slot.
    fn run_conversion(&mut self, info: ConInfo) -> Result<(), ConvertError> {
        let Some(rule) = self.registry.get(info.kind) else {
            return Err(ConvertError::Unsupported {
                kind: info.kind.type_name(),
                backend: self.backend.type_name().to_string(),
            });
        };
        let Some(stored) = self.model.constraint_mut(info) else {
            return Err(ConvertError::Invariant {
                reason: format!("{} #{} missing", info.kind.type_name(), info.index),
            });
        };
        if let Some(ctx) = stored.context_mut() {
            if ctx.is_none() {
                *ctx = Context::Mixed;
            }
        }
        let con = stored.clone();
        let src = self.model.keeper(info.kind).select_value_node_range(info.index);
        self.presolver.begin_auto_link(src);
        let result = rule(self, &con, info).and_then(|()| {
            self.model.keeper_mut(info.kind).mark_bridged(info.index);
            self.requeue_if_widened(info, &con)
        });
        self.presolver.end_auto_link(result.is_ok())?;
        result?;

        self.rewrites += 1;
        tracing::debug!(
            component = "engine",
            operation = "convert",
            status = "success",
            kind = info.kind.type_name(),
            index = info.index,
            ctx = con.context().map(Context::as_str).unwrap_or("n/a"),
            "Rewrote constraint"
        );
        Ok(())
    }

    // The rule itself may have widened the context of the entry it rewrote.
    fn requeue_if_widened(
        &mut self,
        info: ConInfo,
        converted: &Constraint,
    ) -> Result<(), ConvertError> {
        let Some(before) = converted.context() else {
            return Ok(());
        };
        let Some(current) = self.model.constraint(info).cloned() else {
            return Ok(());
        };
        if current.context().is_some_and(|now| now != before) {
            self.requeue_added_context(&current, before)?;
        }
        Ok(())
    }

    /// Consolidation of constraints that are only related once fully
    /// lowered. No such rule exists for the default rule set.
    fn convert_maps(&mut self) -> Result<(), ConvertError> {
        tracing::trace!(
            component = "engine",
            operation = "convert_maps",
            status = "success",
            constraints = self.model.num_constraints(),
            "No map conversions to run"
        );
        Ok(())
    }

    /// Round integer domains inward and check every domain is non-empty.
    fn preprocess_final(&mut self) -> Result<(), ConvertError> {
        for index in 0..self.model.num_vars() {
            let var = VarId::new(index as u32);
            let bounds = self.model.bounds(var);
            if self.model.var_type(var) == VarType::Integer {
                self.narrow_var_bounds(var, bounds.lower, bounds.upper)?;
            } else if bounds.is_empty() {
                return Err(ConvertError::Infeasible {
                    reason: format!(
                        "variable {} has bounds [{}, {}]",
                        var, bounds.lower, bounds.upper
                    ),
                });
            }
        }
        Ok(())
    }

    /// Push variables, objectives and unbridged constraints to the backend,
    /// linking each to its backend slot. Returns the constraints pushed.
    pub(super) fn push_model(&mut self) -> Result<usize, ConvertError> {
        if self.options.relax {
            self.model.relax_integrality();
        }
        let dst = self.presolver.target_nodes();

        let num_vars = self.model.num_vars();
        self.backend.add_variables(self.model.vars())?;
        if num_vars > 0 {
            let slots = self.presolver.add_slots(dst.vars, num_vars);
            self.presolver
                .add_copy_link(NodeRange::new(self.var_node, 0, num_vars), slots)?;
        }

        for (index, objective) in self.model.objectives().iter().enumerate() {
            if objective.is_quadratic() {
                self.backend
                    .set_quadratic_objective(index, objective.sense, &objective.expr)?;
            } else {
                self.backend
                    .set_linear_objective(index, objective.sense, objective.expr.affine())?;
            }
            let slot = self.presolver.add_slots(dst.objs, 1);
            self.presolver
                .add_copy_link(NodeRange::single(self.obj_node, index), slot)?;
        }

        let mut pushed = 0;
        for keeper in self.model.keepers() {
            for (index, con) in keeper.iter_unbridged() {
                self.backend.add_constraint(con)?;
                let slot = self.presolver.add_slots(dst.cons, 1);
                self.presolver
                    .add_copy_link(keeper.select_value_node_range(index), slot)?;
                pushed += 1;
            }
        }
        tracing::debug!(
            component = "engine",
            operation = "push_model",
            status = "success",
            backend = self.backend.type_name(),
            vars = num_vars,
            objectives = self.model.objectives().len(),
            constraints = pushed,
            "Pushed flat model"
        );
        Ok(pushed)
    }
}

