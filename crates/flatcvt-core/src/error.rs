//! Conversion error types.

use crate::backend::BackendError;
use crate::constraints::ConstraintError;
use crate::options::OptionError;
use flatcvt_expr::ExprError;

/// Errors that abort a model conversion.
///
/// [`ConvertError::Infeasible`] is an expected outcome (an empty variable
/// domain was found); every other variant is a failure of the input, the
/// backend or the converter itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Bound narrowing produced an empty domain
    Infeasible { reason: String },
    /// Kind is neither accepted by the backend nor convertible
    Unsupported { kind: &'static str, backend: String },
    /// A rewrite rule could not handle this instance
    ConversionFailure { kind: &'static str, reason: String },
    /// Internal consistency check failed
    Invariant { reason: String },
    /// Link graph export could not be written
    Export { path: String, reason: String },
    /// Invalid constraint payload
    Constraint(ConstraintError),
    /// Invalid expression
    Expr(ExprError),
    /// Backend rejected the flat model
    Backend(BackendError),
    /// Invalid option
    Option(OptionError),
    /// Operation called in the wrong conversion state
    State {
        operation: &'static str,
        state: &'static str,
    },
}

impl ConvertError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::Infeasible { .. } => "MODEL_INFEASIBLE",
            ConvertError::Unsupported { .. } => "CONSTRAINT_UNSUPPORTED",
            ConvertError::ConversionFailure { .. } => "CONVERSION_FAILURE",
            ConvertError::Invariant { .. } => "CONVERTER_INVARIANT",
            ConvertError::Export { .. } => "GRAPH_EXPORT_FAILED",
            ConvertError::Constraint(err) => err.code(),
            ConvertError::Expr(err) => err.code(),
            ConvertError::Backend(err) => err.code(),
            ConvertError::Option(err) => err.code(),
            ConvertError::State { .. } => "CONVERTER_INVALID_STATE",
        }
    }

    /// Expected infeasibility, as opposed to a conversion failure.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ConvertError::Infeasible { .. })
    }
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::Infeasible { reason } => {
                write!(f, "[{}] Model infeasible: {}", self.code(), reason)
            }
            ConvertError::Unsupported { kind, backend } => write!(
                f,
                "[{}] Constraint type '{}' is neither accepted by '{}', nor is there a conversion",
                self.code(),
                kind,
                backend
            ),
            ConvertError::ConversionFailure { kind, reason } => {
                write!(f, "[{}] Cannot convert '{}': {}", self.code(), kind, reason)
            }
            ConvertError::Invariant { reason } => {
                write!(f, "[{}] Internal error: {}", self.code(), reason)
            }
            ConvertError::Export { path, reason } => write!(
                f,
                "[{}] Failed to write graph export '{}': {}",
                self.code(),
                path,
                reason
            ),
            ConvertError::Constraint(err) => write!(f, "{err}"),
            ConvertError::Expr(err) => write!(f, "{err}"),
            ConvertError::Backend(err) => write!(f, "{err}"),
            ConvertError::Option(err) => write!(f, "{err}"),
            ConvertError::State { operation, state } => write!(
                f,
                "[{}] Cannot {} while conversion is {}",
                self.code(),
                operation,
                state
            ),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<ConstraintError> for ConvertError {
    fn from(err: ConstraintError) -> Self {
        ConvertError::Constraint(err)
    }
}

impl From<ExprError> for ConvertError {
    fn from(err: ExprError) -> Self {
        ConvertError::Expr(err)
    }
}

impl From<BackendError> for ConvertError {
    fn from(err: BackendError) -> Self {
        ConvertError::Backend(err)
    }
}

impl From<OptionError> for ConvertError {
    fn from(err: OptionError) -> Self {
        ConvertError::Option(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasibility_is_distinguished() {
        let err = ConvertError::Infeasible {
            reason: "empty variable domain".to_string(),
        };
        assert!(err.is_infeasible());
        assert!(!ConvertError::Invariant {
            reason: String::new()
        }
        .is_infeasible());
    }

    #[test]
    fn unsupported_message_names_kind_and_backend() {
        let err = ConvertError::Unsupported {
            kind: "ExpConstraint",
            backend: "recorder[lp]".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("[CONSTRAINT_UNSUPPORTED]"));
        assert!(rendered.contains("ExpConstraint"));
        assert!(rendered.contains("recorder[lp]"));
    }

    #[test]
    fn wrapped_errors_keep_their_code() {
        let err: ConvertError = ConstraintError::InvalidIndicatorValue { value: 2 }.into();
        assert_eq!(err.code(), "INDICATOR_INVALID_VALUE");
    }
}
