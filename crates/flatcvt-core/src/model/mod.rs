//! Flat model store: variables, init expressions, constraint keepers and
//! objectives.
//!
//! # Module Organization
//!
//! - [`keeper`]: per-kind constraint storage with dedup maps

mod keeper;

pub use keeper::{ConInfo, ConstraintKeeper};

use crate::constraints::{ConKind, Constraint};
use crate::error::ConvertError;
use crate::presolve::NodeId;
use crate::types::{Bounds, Objective, VarType, Variable};
use flatcvt_expr::VarId;

/// Variables, constraints and objectives of the model being converted.
///
/// Everything is append-only. A variable may carry an init expression: the
/// functional constraint defining its value.
#[derive(Debug, Clone)]
pub struct FlatModel {
    vars: Vec<Variable>,
    init_exprs: Vec<Option<ConInfo>>,
    keepers: Vec<ConstraintKeeper>,
    objectives: Vec<Objective>,
}

impl FlatModel {
    /// Create an empty model; `value_node` supplies each keeper's node.
    pub fn new(mut value_node: impl FnMut(ConKind) -> NodeId) -> Self {
        Self {
            vars: Vec::new(),
            init_exprs: Vec::new(),
            keepers: ConKind::ALL
                .iter()
                .map(|kind| ConstraintKeeper::new(*kind, value_node(*kind)))
                .collect(),
            objectives: Vec::new(),
        }
    }

    // ── Variables ───────────────────────────────────────────

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn add_var(&mut self, var: Variable) -> VarId {
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(var);
        self.init_exprs.push(None);
        id
    }

    pub fn has_var(&self, var: VarId) -> bool {
        var.index() < self.vars.len()
    }

    pub fn check_var(&self, var: VarId) -> Result<(), ConvertError> {
        if self.has_var(var) {
            Ok(())
        } else {
            Err(ConvertError::Invariant {
                reason: format!("variable {} does not exist", var),
            })
        }
    }

    /// Variable data. `var` must exist.
    pub fn var(&self, var: VarId) -> &Variable {
        &self.vars[var.index()]
    }

    pub fn bounds(&self, var: VarId) -> Bounds {
        self.vars[var.index()].bounds
    }

    pub fn lb(&self, var: VarId) -> f64 {
        self.vars[var.index()].bounds.lower
    }

    pub fn ub(&self, var: VarId) -> f64 {
        self.vars[var.index()].bounds.upper
    }

    pub fn var_type(&self, var: VarId) -> VarType {
        self.vars[var.index()].var_type
    }

    pub fn is_fixed(&self, var: VarId) -> bool {
        self.bounds(var).is_fixed()
    }

    pub fn fixed_value(&self, var: VarId) -> Option<f64> {
        let b = self.bounds(var);
        b.is_fixed().then_some(b.lower)
    }

    pub fn is_binary(&self, var: VarId) -> bool {
        self.var(var).is_binary()
    }

    /// Lower and upper bound of every variable in `vars`, as an interval
    /// hull.
    pub fn hull(&self, vars: &[VarId]) -> Bounds {
        vars.iter()
            .map(|v| self.bounds(*v))
            .reduce(|a, b| a.hull(&b))
            .unwrap_or(Bounds::new(0.0, 0.0))
    }

    pub(crate) fn set_bounds(&mut self, var: VarId, bounds: Bounds) {
        self.vars[var.index()].bounds = bounds;
    }

    /// Make every variable continuous.
    pub fn relax_integrality(&mut self) {
        for var in &mut self.vars {
            var.var_type = VarType::Continuous;
        }
    }

    // ── Init expressions ────────────────────────────────────

    pub fn init_expr(&self, var: VarId) -> Option<ConInfo> {
        self.init_exprs.get(var.index()).copied().flatten()
    }

    pub fn has_init_expr(&self, var: VarId) -> bool {
        self.init_expr(var).is_some()
    }

    /// Set or replace the defining constraint of `var`.
    pub(crate) fn set_init_expr(&mut self, var: VarId, info: ConInfo) {
        self.init_exprs[var.index()] = Some(info);
    }

    // ── Constraints ─────────────────────────────────────────

    pub fn keeper(&self, kind: ConKind) -> &ConstraintKeeper {
        &self.keepers[kind.index()]
    }

    pub(crate) fn keeper_mut(&mut self, kind: ConKind) -> &mut ConstraintKeeper {
        &mut self.keepers[kind.index()]
    }

    pub fn keepers(&self) -> &[ConstraintKeeper] {
        &self.keepers
    }

    pub fn constraint(&self, info: ConInfo) -> Option<&Constraint> {
        self.keeper(info.kind).get(info.index)
    }

    pub(crate) fn constraint_mut(&mut self, info: ConInfo) -> Option<&mut Constraint> {
        self.keeper_mut(info.kind).get_mut(info.index)
    }

    /// Constraints of all kinds, bridged ones included.
    pub fn num_constraints(&self) -> usize {
        self.keepers.iter().map(|k| k.len()).sum()
    }

    /// Constraints that will reach the backend.
    pub fn num_unbridged(&self) -> usize {
        self.keepers.iter().map(|k| k.len() - k.num_bridged()).sum()
    }

    // ── Objectives ──────────────────────────────────────────

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub(crate) fn add_objective(&mut self, objective: Objective) -> usize {
        self.objectives.push(objective);
        self.objectives.len() - 1
    }
}
