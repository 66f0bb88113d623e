//! Backend contract ("ModelAPI") for pushing a flat model to a solver.
//!
//! The converter only talks to a backend through [`ModelApi`]: one
//! acceptance query per kind, an optional per-instance conversion query
//! and bulk/one-by-one model input after the conversion fixpoint.

mod recorder;

pub use recorder::{AcceptanceProfile, FlatModelRecorder, FlatModelSummary, VariableRecord};

use crate::constraints::{ConKind, Constraint};
use crate::types::{Sense, Variable};
use flatcvt_expr::{AffineExpr, QuadExpr};

/// How a backend treats a constraint kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AcceptanceLevel {
    /// Must be converted.
    NotAccepted,
    /// Converted if a rule exists and succeeds, otherwise passed natively.
    AcceptedButNotRecommended,
    /// Passed natively unless the instance needs conversion.
    Recommended,
}

impl AcceptanceLevel {
    /// Level for an `acc:<kind>` option value (0, 1 or 2).
    pub fn from_option_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(AcceptanceLevel::NotAccepted),
            1 => Some(AcceptanceLevel::AcceptedButNotRecommended),
            2 => Some(AcceptanceLevel::Recommended),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AcceptanceLevel::NotAccepted => "not_accepted",
            AcceptanceLevel::AcceptedButNotRecommended => "accepted_not_recommended",
            AcceptanceLevel::Recommended => "recommended",
        }
    }

    pub fn is_accepted(self) -> bool {
        self != AcceptanceLevel::NotAccepted
    }
}

/// Errors raised by a backend while receiving the flat model.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Constraint of a kind the backend does not accept
    Rejected { kind: &'static str, backend: String },
    /// Variables can only be added once
    VariablesAlreadyAdded,
    /// Objective index out of sequence
    InvalidObjectiveIndex { index: usize },
}

impl BackendError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::Rejected { .. } => "BACKEND_REJECTED_CONSTRAINT",
            BackendError::VariablesAlreadyAdded => "BACKEND_VARIABLES_ALREADY_ADDED",
            BackendError::InvalidObjectiveIndex { .. } => "BACKEND_INVALID_OBJECTIVE_INDEX",
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Rejected { kind, backend } => write!(
                f,
                "[{}] Backend '{}' does not accept '{}'",
                self.code(),
                backend,
                kind
            ),
            BackendError::VariablesAlreadyAdded => {
                write!(f, "[{}] Variables were already added", self.code())
            }
            BackendError::InvalidObjectiveIndex { index } => {
                write!(f, "[{}] Objective index {} out of sequence", self.code(), index)
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Contract between the converter and a solver backend.
pub trait ModelApi {
    /// Name used in diagnostics.
    fn type_name(&self) -> &str;

    /// Declared acceptance of a constraint kind.
    fn acceptance(&self, kind: ConKind) -> AcceptanceLevel;

    /// Per-instance override for kinds the backend otherwise accepts.
    fn needs_conversion(&self, _con: &Constraint) -> bool {
        false
    }

    /// Add all variables at once.
    fn add_variables(&mut self, vars: &[Variable]) -> Result<(), BackendError>;

    fn set_linear_objective(
        &mut self,
        index: usize,
        sense: Sense,
        expr: &AffineExpr,
    ) -> Result<(), BackendError>;

    fn set_quadratic_objective(
        &mut self,
        index: usize,
        sense: Sense,
        expr: &QuadExpr,
    ) -> Result<(), BackendError>;

    /// Add one constraint of an accepted kind.
    fn add_constraint(&mut self, con: &Constraint) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_values_map_to_levels() {
        assert_eq!(
            AcceptanceLevel::from_option_value(0),
            Some(AcceptanceLevel::NotAccepted)
        );
        assert_eq!(
            AcceptanceLevel::from_option_value(1),
            Some(AcceptanceLevel::AcceptedButNotRecommended)
        );
        assert_eq!(AcceptanceLevel::from_option_value(3), None);
        assert!(!AcceptanceLevel::NotAccepted.is_accepted());
    }
}
