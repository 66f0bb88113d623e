//! In-memory backend that records the flat model it receives.

use super::{AcceptanceLevel, BackendError, ModelApi};
use crate::constraints::{ConKind, Constraint};
use crate::types::{Objective, Sense, Variable};
use flatcvt_expr::{AffineExpr, QuadExpr};
use serde::Serialize;
use std::collections::BTreeMap;

/// Canned acceptance tables modelled on typical solver families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptanceProfile {
    /// Linear constraints only.
    Lp,
    /// Linear, linear indicators and SOS.
    #[default]
    Mip,
    /// MIP plus quadratic, nonlinear and general constraints.
    Full,
}

impl AcceptanceProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            AcceptanceProfile::Lp => "lp",
            AcceptanceProfile::Mip => "mip",
            AcceptanceProfile::Full => "full",
        }
    }

    pub fn acceptance(self, kind: ConKind) -> AcceptanceLevel {
        use AcceptanceLevel::{AcceptedButNotRecommended, NotAccepted, Recommended};
        let linear = matches!(
            kind,
            ConKind::LinRange | ConKind::LinLe | ConKind::LinEq | ConKind::LinGe
        );
        let mip = matches!(
            kind,
            ConKind::IndLinLe
                | ConKind::IndLinEq
                | ConKind::IndLinGe
                | ConKind::Sos1
                | ConKind::Sos2
        );
        let full_native = matches!(
            kind,
            ConKind::QuadRange
                | ConKind::QuadLe
                | ConKind::QuadEq
                | ConKind::QuadGe
                | ConKind::IndQuadLe
                | ConKind::IndQuadEq
                | ConKind::IndQuadGe
                | ConKind::Pl
                | ConKind::ComplLin
                | ConKind::ComplQuad
                | ConKind::Exp
                | ConKind::ExpA
                | ConKind::Log
                | ConKind::LogA
                | ConKind::Pow
                | ConKind::Sin
                | ConKind::Cos
                | ConKind::Tan
        );
        let full_fallback = matches!(
            kind,
            ConKind::Max | ConKind::Min | ConKind::Abs | ConKind::And | ConKind::Or
        );
        match self {
            _ if linear => Recommended,
            AcceptanceProfile::Mip | AcceptanceProfile::Full if mip => Recommended,
            AcceptanceProfile::Full if full_native => Recommended,
            AcceptanceProfile::Full if full_fallback => AcceptedButNotRecommended,
            _ => NotAccepted,
        }
    }
}

impl std::str::FromStr for AcceptanceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lp" => Ok(AcceptanceProfile::Lp),
            "mip" => Ok(AcceptanceProfile::Mip),
            "full" => Ok(AcceptanceProfile::Full),
            other => Err(format!("unknown profile '{other}' (expected lp, mip or full)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableRecord {
    pub lower: f64,
    pub upper: f64,
    pub var_type: &'static str,
}

/// Serializable digest of a recorded flat model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatModelSummary {
    pub backend: String,
    pub num_variables: usize,
    pub num_integer: usize,
    pub num_constraints: usize,
    pub constraints: BTreeMap<&'static str, usize>,
    pub objectives: Vec<&'static str>,
    pub variables: Vec<VariableRecord>,
}

/// Backend storing everything it is given.
#[derive(Debug, Clone)]
pub struct FlatModelRecorder {
    name: String,
    profile: AcceptanceProfile,
    overrides: BTreeMap<ConKind, AcceptanceLevel>,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objectives: Vec<Objective>,
    vars_added: bool,
}

impl FlatModelRecorder {
    pub fn new(profile: AcceptanceProfile) -> Self {
        Self {
            name: format!("recorder[{}]", profile.as_str()),
            profile,
            overrides: BTreeMap::new(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objectives: Vec::new(),
            vars_added: false,
        }
    }

    /// Declare a different acceptance for one kind.
    pub fn with_acceptance(mut self, kind: ConKind, level: AcceptanceLevel) -> Self {
        self.overrides.insert(kind, level);
        self
    }

    pub fn profile(&self) -> AcceptanceProfile {
        self.profile
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn constraints_of(&self, kind: ConKind) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.iter().filter(move |c| c.kind() == kind)
    }

    pub fn count_of(&self, kind: ConKind) -> usize {
        self.constraints_of(kind).count()
    }

    pub fn summary(&self) -> FlatModelSummary {
        let mut constraints = BTreeMap::new();
        for con in &self.constraints {
            *constraints.entry(con.type_name()).or_insert(0) += 1;
        }
        FlatModelSummary {
            backend: self.name.clone(),
            num_variables: self.variables.len(),
            num_integer: self.variables.iter().filter(|v| v.is_integer()).count(),
            num_constraints: self.constraints.len(),
            constraints,
            objectives: self.objectives.iter().map(|o| o.sense.as_str()).collect(),
            variables: self
                .variables
                .iter()
                .map(|v| VariableRecord {
                    lower: v.bounds.lower,
                    upper: v.bounds.upper,
                    var_type: v.var_type.as_str(),
                })
                .collect(),
        }
    }
}

impl ModelApi for FlatModelRecorder {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn acceptance(&self, kind: ConKind) -> AcceptanceLevel {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| self.profile.acceptance(kind))
    }

    fn add_variables(&mut self, vars: &[Variable]) -> Result<(), BackendError> {
        if self.vars_added {
            return Err(BackendError::VariablesAlreadyAdded);
        }
        self.variables.extend_from_slice(vars);
        self.vars_added = true;
        Ok(())
    }

    fn set_linear_objective(
        &mut self,
        index: usize,
        sense: Sense,
        expr: &AffineExpr,
    ) -> Result<(), BackendError> {
        if index != self.objectives.len() {
            return Err(BackendError::InvalidObjectiveIndex { index });
        }
        self.objectives.push(Objective::linear(sense, expr.clone()));
        Ok(())
    }

    fn set_quadratic_objective(
        &mut self,
        index: usize,
        sense: Sense,
        expr: &QuadExpr,
    ) -> Result<(), BackendError> {
        if index != self.objectives.len() {
            return Err(BackendError::InvalidObjectiveIndex { index });
        }
        self.objectives.push(Objective::quadratic(sense, expr.clone()));
        Ok(())
    }

    fn add_constraint(&mut self, con: &Constraint) -> Result<(), BackendError> {
        if !self.acceptance(con.kind()).is_accepted() {
            return Err(BackendError::Rejected {
                kind: con.type_name(),
                backend: self.name.clone(),
            });
        }
        self.constraints.push(con.clone());
        Ok(())
    }
}
