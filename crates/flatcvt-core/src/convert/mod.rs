//! Model conversion: reducer, propagation, conversion loop and rewrite rules.
//!
//! # Module Organization
//!
//! - [`registry`]: kind -> rewrite function table
//! - `reduce`: expression-to-variable reducer and constraint insertion
//! - `propagate`: bound narrowing and context propagation
//! - `bounds`: interval bounds of expressions and inferred result domains
//! - `prepro`: folding of functional constraints before insertion
//! - `engine`: the breadth-first conversion loop and the final push
//! - `rules`: the default MIP rewrite rules

mod bounds;
mod engine;
mod prepro;
mod propagate;
mod reduce;
pub mod registry;
mod rules;

pub use registry::{RewriteFn, RewriteRegistry};

use crate::backend::ModelApi;
use crate::constraints::{ConKind, Constraint};
use crate::error::ConvertError;
use crate::model::FlatModel;
use crate::options::ConverterOptions;
use crate::presolve::{
    LinkExporter, ModelValues, NodeId, NodeRange, ValueKind, ValuePresolver,
};
use crate::types::{Objective, Variable};
use flatcvt_expr::VarId;
use serde::Serialize;
use std::collections::HashMap;

/// Lifecycle of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionState {
    /// Accepting model input.
    #[default]
    Unconverted,
    /// Inside `finish_model_input`; stays here if conversion aborted.
    Converting,
    /// Flat model pushed to the backend.
    Converted,
}

impl ConversionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionState::Unconverted => "unconverted",
            ConversionState::Converting => "converting",
            ConversionState::Converted => "converted",
        }
    }
}

/// A reduced expression: a variable, or a literal when the value is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarOrConst {
    Var(VarId),
    Const(f64),
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionReport {
    /// Passes of the conversion loop, the last one finding nothing to do.
    pub passes: usize,
    /// Constraints handed to a rewrite rule.
    pub rewrites: usize,
    pub constraints_created: usize,
    pub variables_created: usize,
    pub constraints_pushed: usize,
    pub variables_pushed: usize,
    /// Rewrites of fallback-accepted kinds that failed and were kept.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct InputCounts {
    vars: usize,
    cons: usize,
}

/// Lowers a model into the kinds a backend accepts and pushes it.
///
/// Input goes through [`Converter::input_var`], [`Converter::input_constraint`],
/// [`Converter::input_logical`] and [`Converter::input_objective`], bracketed
/// by [`Converter::start_model_input`] and [`Converter::finish_model_input`].
/// Every input item gets a source slot in the value presolver so solutions
/// of the flat model can be mapped back.
pub struct Converter<B: ModelApi> {
    model: FlatModel,
    backend: B,
    registry: RewriteRegistry<B>,
    presolver: ValuePresolver,
    options: ConverterOptions,
    state: ConversionState,
    var_node: NodeId,
    obj_node: NodeId,
    fixed_vars: HashMap<u64, VarId>,
    input: InputCounts,
    passes: usize,
    rewrites: usize,
    warnings: Vec<String>,
}

impl<B: ModelApi> Converter<B> {
    /// Converter with the default MIP rewrite rules.
    pub fn new(backend: B, options: ConverterOptions) -> Self {
        Self::with_registry(backend, options, RewriteRegistry::mip())
    }

    pub fn with_registry(
        backend: B,
        options: ConverterOptions,
        registry: RewriteRegistry<B>,
    ) -> Self {
        let mut presolver = ValuePresolver::new();
        let var_node = presolver.add_node("vars", ValueKind::Var);
        let model =
            FlatModel::new(|kind| presolver.add_node(kind.type_name(), ValueKind::Con));
        let obj_node = presolver.add_node("objs", ValueKind::Obj);
        Self {
            model,
            backend,
            registry,
            presolver,
            options,
            state: ConversionState::Unconverted,
            var_node,
            obj_node,
            fixed_vars: HashMap::new(),
            input: InputCounts::default(),
            passes: 0,
            rewrites: 0,
            warnings: Vec::new(),
        }
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn model(&self) -> &FlatModel {
        &self.model
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    pub fn presolver(&self) -> &ValuePresolver {
        &self.presolver
    }

    pub fn registry_mut(&mut self) -> &mut RewriteRegistry<B> {
        &mut self.registry
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn expect_state(
        &self,
        expected: ConversionState,
        operation: &'static str,
    ) -> Result<(), ConvertError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ConvertError::State {
                operation,
                state: self.state.as_str(),
            })
        }
    }

    // ── Model input ─────────────────────────────────────────

    /// Open the link-graph export, if one is configured.
    pub fn start_model_input(&mut self) -> Result<(), ConvertError> {
        self.expect_state(ConversionState::Unconverted, "start_model_input")?;
        if let Some(path) = self.options.write_graph.clone() {
            if !self.presolver.is_exporting() {
                let exporter = LinkExporter::create(&path)?;
                self.presolver.set_exporter(exporter);
            }
        }
        tracing::debug!(
            component = "converter",
            operation = "start_model_input",
            status = "success",
            backend = self.backend.type_name(),
            export = self.presolver.is_exporting(),
            "Started model input"
        );
        Ok(())
    }

    /// Add an original-model variable. Ids are dense in input order.
    pub fn input_var(&mut self, var: Variable) -> Result<VarId, ConvertError> {
        self.expect_state(ConversionState::Unconverted, "input_var")?;
        if var.bounds.is_empty() {
            return Err(ConvertError::Infeasible {
                reason: format!(
                    "input variable {} has bounds [{}, {}]",
                    self.input.vars, var.bounds.lower, var.bounds.upper
                ),
            });
        }
        let src = self
            .presolver
            .add_slots(self.presolver.source_nodes().vars, 1);
        let id = self.with_auto_link(src, |cvt| Ok(cvt.do_add_var(var)))?;
        self.input.vars += 1;
        Ok(id)
    }

    pub fn input_vars(
        &mut self,
        vars: impl IntoIterator<Item = Variable>,
    ) -> Result<Vec<VarId>, ConvertError> {
        vars.into_iter().map(|var| self.input_var(var)).collect()
    }

    /// Add an original-model constraint.
    ///
    /// Non-functional constraints are roots: the variables they use are
    /// marked as used in mixed context.
    pub fn input_constraint(&mut self, con: Constraint) -> Result<(), ConvertError> {
        self.expect_state(ConversionState::Unconverted, "input_constraint")?;
        let src = self
            .presolver
            .add_slots(self.presolver.source_nodes().cons, 1);
        self.with_auto_link(src, |cvt| cvt.add_constraint_as_root(con))?;
        self.input.cons += 1;
        Ok(())
    }

    /// Add an original-model logical constraint that must hold.
    pub fn input_logical(&mut self, con: Constraint) -> Result<(), ConvertError> {
        self.expect_state(ConversionState::Unconverted, "input_logical")?;
        let src = self
            .presolver
            .add_slots(self.presolver.source_nodes().cons, 1);
        self.with_auto_link(src, |cvt| cvt.add_root_logical(con))?;
        self.input.cons += 1;
        Ok(())
    }

    pub fn input_objective(&mut self, objective: Objective) -> Result<(), ConvertError> {
        self.expect_state(ConversionState::Unconverted, "input_objective")?;
        let src = self
            .presolver
            .add_slots(self.presolver.source_nodes().objs, 1);
        self.with_auto_link(src, |cvt| cvt.add_objective(objective))
    }

    /// Convert the model, push it to the backend and close the export.
    ///
    /// On failure the export is closed and the converter stays in
    /// [`ConversionState::Converting`].
    pub fn finish_model_input(&mut self) -> Result<ConversionReport, ConvertError> {
        self.expect_state(ConversionState::Unconverted, "finish_model_input")?;
        let result = self.convert_model();
        if let Err(err) = &result {
            self.presolver.abort_export();
            tracing::debug!(
                component = "converter",
                operation = "finish_model_input",
                status = "error",
                code = err.code(),
                "Model conversion aborted"
            );
        }
        result
    }

    fn convert_model(&mut self) -> Result<ConversionReport, ConvertError> {
        self.state = ConversionState::Converting;
        let vars_before = self.model.num_vars();
        let cons_before = self.model.num_constraints();

        self.convert_items()?;
        let constraints_created = self.model.num_constraints() - cons_before;
        let variables_created = self.model.num_vars() - vars_before;

        let constraints_pushed = self.push_model()?;
        self.presolver.finish_export()?;
        self.state = ConversionState::Converted;

        let report = ConversionReport {
            passes: self.passes,
            rewrites: self.rewrites,
            constraints_created,
            variables_created,
            constraints_pushed,
            variables_pushed: self.model.num_vars(),
            warnings: self.warnings.clone(),
        };
        tracing::info!(
            component = "converter",
            operation = "finish_model_input",
            status = "success",
            backend = self.backend.type_name(),
            input_vars = self.input.vars,
            input_cons = self.input.cons,
            passes = report.passes,
            rewrites = report.rewrites,
            constraints_created = report.constraints_created,
            variables_created = report.variables_created,
            constraints_pushed = report.constraints_pushed,
            warnings = report.warnings.len(),
            "Converted model"
        );
        Ok(report)
    }

    // ── Value presolve ──────────────────────────────────────

    /// Map original-model values onto the backend's items.
    pub fn presolve_values(&self, values: &ModelValues) -> Result<ModelValues, ConvertError> {
        self.expect_state(ConversionState::Converted, "presolve_values")?;
        self.presolver.presolve(values)
    }

    /// Map backend values back onto the original model's items.
    pub fn postsolve_values(&self, values: &ModelValues) -> Result<ModelValues, ConvertError> {
        self.expect_state(ConversionState::Converted, "postsolve_values")?;
        self.presolver.postsolve(values)
    }

    /// Run `f` with every variable and constraint it creates linked from
    /// `src`. Links are dropped if `f` fails.
    pub fn with_auto_link<T>(
        &mut self,
        src: NodeRange,
        f: impl FnOnce(&mut Self) -> Result<T, ConvertError>,
    ) -> Result<T, ConvertError> {
        self.presolver.begin_auto_link(src);
        let result = f(self);
        self.presolver.end_auto_link(result.is_ok())?;
        result
    }

    // ── Helpers for rules ───────────────────────────────────

    /// Acceptance of `kind`, option overrides first.
    pub fn acceptance(&self, kind: ConKind) -> crate::backend::AcceptanceLevel {
        self.options
            .acceptance_override(kind)
            .unwrap_or_else(|| self.backend.acceptance(kind))
    }

    fn add_objective(&mut self, objective: Objective) -> Result<(), ConvertError> {
        let vars = objective_vars(&objective);
        for var in &vars {
            self.model.check_var(*var)?;
        }
        for var in vars {
            self.propagate_mixed(var)?;
        }
        self.model.add_objective(objective);
        let slot = self.presolver.add_slots(self.obj_node, 1);
        self.presolver.auto_link(slot);
        Ok(())
    }
}

fn objective_vars(objective: &Objective) -> Vec<VarId> {
    let mut vars = objective.expr.lin_terms().vars();
    for (a, b, _) in objective.expr.quad_terms().iter() {
        vars.push(a);
        vars.push(b);
    }
    vars.sort_unstable();
    vars.dedup();
    vars
}
