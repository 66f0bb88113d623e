//! Expression-to-variable reducer and constraint insertion.

use super::prepro::{self, Prepro};
use super::{Converter, VarOrConst, bounds};
use crate::backend::ModelApi;
use crate::constraints::{ConKind, Constraint, FunctionalExpr, LinCon, UNASSIGNED};
use crate::error::ConvertError;
use crate::model::ConInfo;
use crate::presolve::NodeRange;
use crate::types::{VarType, Variable};
use flatcvt_expr::{AffineExpr, QuadExpr, VarId, canonical_bits};

impl<B: ModelApi> Converter<B> {
    // ── Variables ───────────────────────────────────────────

    /// Add a variable; a fixed continuous one is shared per value.
    pub fn add_var(&mut self, var: Variable) -> VarId {
        if var.bounds.is_fixed() && var.var_type == VarType::Continuous {
            return self.make_fixed_var(var.bounds.lower);
        }
        self.do_add_var(var)
    }

    /// The shared variable fixed at `value`.
    pub fn make_fixed_var(&mut self, value: f64) -> VarId {
        let key = canonical_bits(value);
        if let Some(var) = self.fixed_vars.get(&key).copied() {
            self.presolver
                .auto_link(NodeRange::single(self.var_node, var.index()));
            return var;
        }
        let var = self.do_add_var(Variable::fixed(value));
        self.fixed_vars.insert(key, var);
        var
    }

    pub(super) fn do_add_var(&mut self, var: Variable) -> VarId {
        let id = self.model.add_var(var);
        let slot = self.presolver.add_slots(self.var_node, 1);
        self.presolver.auto_link(slot);
        id
    }

    /// The variable `1 - b` of a binary `b`.
    pub fn make_complement_var(&mut self, b: VarId) -> Result<VarId, ConvertError> {
        self.model.check_var(b)?;
        if self.model.lb(b) != 0.0 || self.model.ub(b) != 1.0 {
            return Err(ConvertError::Invariant {
                reason: format!(
                    "complement of variable {} with bounds [{}, {}]",
                    b,
                    self.model.lb(b),
                    self.model.ub(b)
                ),
            });
        }
        self.convert_to_var(AffineExpr::from_constant(1.0) - AffineExpr::var(b))
    }

    // ── Expression reduction ────────────────────────────────

    /// A variable equal to `expr`.
    ///
    /// A bare variable comes back unchanged, a constant becomes the shared
    /// fixed variable, anything else the result of a (deduplicated)
    /// linear functional constraint.
    pub fn convert_to_var(&mut self, expr: AffineExpr) -> Result<VarId, ConvertError> {
        let expr = expr.normalized();
        if let Some(var) = expr.as_variable() {
            self.model.check_var(var)?;
            return Ok(var);
        }
        if expr.is_constant() {
            return Ok(self.make_fixed_var(expr.constant()));
        }
        self.assign_result_var(Constraint::LinearFunctional(FunctionalExpr::new(expr)))
    }

    /// Quadratic version of [`Converter::convert_to_var`]; an expression
    /// without quadratic terms is reduced as affine.
    pub fn convert_quad_to_var(&mut self, expr: QuadExpr) -> Result<VarId, ConvertError> {
        let expr = expr.normalized();
        if expr.is_affine() {
            return self.convert_to_var(expr.into_affine());
        }
        self.assign_result_var(Constraint::QuadFunctional(FunctionalExpr::new(expr)))
    }

    /// Result variable of `con`, creating it if no equal constraint exists.
    pub fn assign_result_var(&mut self, con: Constraint) -> Result<VarId, ConvertError> {
        match self.assign_result(con)? {
            VarOrConst::Var(var) => Ok(var),
            VarOrConst::Const(value) => Ok(self.make_fixed_var(value)),
        }
    }

    /// Reduce a functional constraint with an unassigned result.
    ///
    /// Returns a literal when preprocessing or the inferred result domain
    /// decides the value.
    pub fn assign_result(&mut self, con: Constraint) -> Result<VarOrConst, ConvertError> {
        let Some(result) = con.result_var() else {
            return Err(ConvertError::Invariant {
                reason: format!("{} has no result variable", con.type_name()),
            });
        };
        if result != UNASSIGNED {
            return Err(ConvertError::Invariant {
                reason: format!("{} already has result {}", con.type_name(), result),
            });
        }
        con.validate()?;
        self.check_vars(&con)?;

        let mut con = match prepro::preprocess(self, con)? {
            Prepro::Keep(con) => con,
            Prepro::Fixed(value) => return Ok(VarOrConst::Const(value)),
            Prepro::Var(var) => return Ok(VarOrConst::Var(var)),
            Prepro::Rewrite(rewritten) => {
                return self.reduce_rewritten(rewritten).map(VarOrConst::Var);
            }
        };

        if let Some(existing) = self.find_existing(&con) {
            return Ok(VarOrConst::Var(existing));
        }
        let domain = bounds::result_domain(&self.model, &con);
        if domain.bounds.is_fixed() {
            return Ok(VarOrConst::Const(domain.bounds.lower));
        }
        let ctx = con.context().unwrap_or_default();
        let var = self.do_add_var(domain);
        con.set_result_var(var);
        let info = self.store_constraint(con, true)?;
        tracing::debug!(
            component = "reducer",
            operation = "assign_result",
            status = "success",
            kind = info.kind.type_name(),
            index = info.index,
            result = var.inner(),
            ctx = ctx.as_str(),
            "Created result variable"
        );
        Ok(VarOrConst::Var(var))
    }

    // Linear functional rewrites are reduced directly; anything else goes
    // back through preprocessing.
    fn reduce_rewritten(&mut self, con: Constraint) -> Result<VarId, ConvertError> {
        match con {
            Constraint::LinearFunctional(f) => self.convert_to_var(f.expr),
            other => self.assign_result_var(other),
        }
    }

    fn find_existing(&self, con: &Constraint) -> Option<VarId> {
        let key = con.dedup_key()?;
        let keeper = self.model.keeper(con.kind());
        let index = keeper.find(&key)?;
        keeper.get(index).and_then(Constraint::result_var)
    }

    fn check_vars(&self, con: &Constraint) -> Result<(), ConvertError> {
        for var in con.vars() {
            if var != UNASSIGNED {
                self.model.check_var(var)?;
            }
        }
        Ok(())
    }

    // ── Constraint insertion ────────────────────────────────

    /// Add a constraint created by a rule.
    ///
    /// A functional constraint without a result is reduced; one with a
    /// result equal to an existing constraint's is stored as an equality
    /// of the two results.
    pub fn add_constraint(&mut self, con: Constraint) -> Result<(), ConvertError> {
        match con.result_var() {
            Some(UNASSIGNED) => self.assign_result(con).map(|_| ()),
            Some(result) => self.add_defining_constraint(result, con),
            None => {
                con.validate()?;
                self.check_vars(&con)?;
                self.store_constraint(con, false).map(|_| ())
            }
        }
    }

    /// Add an original-model constraint; root algebraic and special
    /// constraints use their variables in mixed context.
    pub fn add_constraint_as_root(&mut self, con: Constraint) -> Result<(), ConvertError> {
        if con.result_var().is_some() {
            return self.add_constraint(con);
        }
        con.validate()?;
        self.check_vars(&con)?;
        for var in con.vars() {
            self.propagate_mixed(var)?;
        }
        self.store_constraint(con, false).map(|_| ())
    }

    /// Add a logical constraint that must hold: its result is fixed to 1.
    pub fn add_root_logical(&mut self, con: Constraint) -> Result<(), ConvertError> {
        if !con.kind().is_logical() {
            return Err(ConvertError::Invariant {
                reason: format!("{} is not a logical constraint", con.type_name()),
            });
        }
        let result = match con.result_var() {
            Some(UNASSIGNED) => self.assign_result(con)?,
            Some(result) => {
                self.add_constraint(con)?;
                VarOrConst::Var(result)
            }
            None => {
                return Err(ConvertError::Invariant {
                    reason: format!("{} has no result variable", con.type_name()),
                });
            }
        };
        match result {
            VarOrConst::Var(var) => self.fix_as_true(var),
            VarOrConst::Const(value) if value != 0.0 => Ok(()),
            VarOrConst::Const(_) => Err(ConvertError::Infeasible {
                reason: "root logical constraint is always false".to_string(),
            }),
        }
    }

    fn add_defining_constraint(
        &mut self,
        result: VarId,
        con: Constraint,
    ) -> Result<(), ConvertError> {
        con.validate()?;
        self.check_vars(&con)?;
        match prepro::preprocess(self, con)? {
            Prepro::Keep(con) => {
                if let Some(existing) = self.find_existing(&con) {
                    if existing != result {
                        return self.add_constraint(Constraint::LinEq(LinCon::new(
                            AffineExpr::var(result) - AffineExpr::var(existing),
                            0.0,
                        )));
                    }
                    return Ok(());
                }
                self.store_constraint(con, true).map(|_| ())
            }
            Prepro::Fixed(value) => self.narrow_var_bounds(result, value, value).map(|_| ()),
            Prepro::Var(var) => self.redefine_variable(
                result,
                Constraint::LinearFunctional(FunctionalExpr::new(AffineExpr::var(var))),
            ),
            Prepro::Rewrite(con) => self.redefine_variable(result, con),
        }
    }

    /// Make `con` the defining constraint of `var`, replacing any previous
    /// init expression. The new constraint is not registered for dedup.
    pub fn redefine_variable(&mut self, var: VarId, con: Constraint) -> Result<(), ConvertError> {
        self.model.check_var(var)?;
        let mut con = con;
        if con.result_var().is_none() {
            return Err(ConvertError::Invariant {
                reason: format!("cannot define a variable by {}", con.type_name()),
            });
        }
        con.set_result_var(var);
        con.validate()?;
        self.check_vars(&con)?;
        let info = self.store_constraint(con, false)?;
        tracing::debug!(
            component = "reducer",
            operation = "redefine_variable",
            status = "success",
            var = var.inner(),
            kind = info.kind.type_name(),
            index = info.index,
            "Replaced init expression"
        );
        Ok(())
    }

    /// Store `con` in its keeper, note it as its result's init expression
    /// and link it from the active source.
    pub(super) fn store_constraint(
        &mut self,
        con: Constraint,
        map: bool,
    ) -> Result<ConInfo, ConvertError> {
        let result = con.result_var();
        let info = self.store_entry(con, map)?;
        if let Some(result) = result {
            self.model.set_init_expr(result, info);
        }
        Ok(info)
    }

    /// Append `con` to its keeper and link its slot from the active source.
    pub(super) fn store_entry(
        &mut self,
        con: Constraint,
        map: bool,
    ) -> Result<ConInfo, ConvertError> {
        let kind: ConKind = con.kind();
        let keeper = self.model.keeper_mut(kind);
        let index = keeper.add(con)?;
        if map {
            keeper.map_insert(index)?;
        }
        let node = keeper.value_node();
        let slot = self.presolver.add_slots(node, 1);
        if slot.begin != index {
            return Err(ConvertError::Invariant {
                reason: format!(
                    "{} slot {} out of step with index {}",
                    kind.type_name(),
                    slot.begin,
                    index
                ),
            });
        }
        self.presolver.auto_link(slot);
        Ok(ConInfo::new(kind, index))
    }
}
