//! Expression construction errors.

#[derive(Debug, Clone, PartialEq)]
pub enum ExprError {
    MismatchedLengths { vars: usize, coefs: usize },
    NonFiniteCoefficient { value: f64 },
    InvalidIndex { value: i64 },
}

impl ExprError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ExprError::MismatchedLengths { .. } => "EXPR_MISMATCHED_LENGTHS",
            ExprError::NonFiniteCoefficient { .. } => "EXPR_NON_FINITE_COEFFICIENT",
            ExprError::InvalidIndex { .. } => "EXPR_INVALID_INDEX",
        }
    }
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprError::MismatchedLengths { vars, coefs } => write!(
                f,
                "[{}] variables ({vars}) and coefficients ({coefs}) must have the same length",
                self.code()
            ),
            ExprError::NonFiniteCoefficient { value } => {
                write!(f, "[{}] coefficient must be finite (got {value})", self.code())
            }
            ExprError::InvalidIndex { value } => {
                write!(f, "[{}] variable index {value} is out of range", self.code())
            }
        }
    }
}

impl std::error::Error for ExprError {}
