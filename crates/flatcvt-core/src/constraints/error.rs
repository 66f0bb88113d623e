//! Constraint construction errors.

/// Errors raised while building a constraint payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintError {
    /// Two SOS members share a weight
    NonUniqueSosWeights { weight: f64 },
    /// SOS weight is NaN or infinite
    NonFiniteSosWeight { weight: f64 },
    /// SOS vars and weights differ in length
    SosLengthMismatch { vars: usize, weights: usize },
    /// Indicator value is not 0 or 1
    InvalidIndicatorValue { value: i64 },
    /// Raw variable index is negative or too large
    InvalidVarIndex { value: i64 },
    /// Wrong number of arguments or parameters for the kind
    InvalidArity { kind: &'static str, reason: String },
    /// Piecewise-linear data is malformed
    InvalidPiecewise { reason: String },
}

impl ConstraintError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintError::NonUniqueSosWeights { .. } => "SOS_NON_UNIQUE_WEIGHTS",
            ConstraintError::NonFiniteSosWeight { .. } => "SOS_NON_FINITE_WEIGHT",
            ConstraintError::SosLengthMismatch { .. } => "SOS_LENGTH_MISMATCH",
            ConstraintError::InvalidIndicatorValue { .. } => "INDICATOR_INVALID_VALUE",
            ConstraintError::InvalidVarIndex { .. } => "CONSTRAINT_INVALID_VAR_INDEX",
            ConstraintError::InvalidArity { .. } => "CONSTRAINT_INVALID_ARITY",
            ConstraintError::InvalidPiecewise { .. } => "PL_INVALID_DATA",
        }
    }
}

impl std::fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintError::NonUniqueSosWeights { weight } => write!(
                f,
                "[{}] SOS weights must be unique (weight {} repeats)",
                self.code(),
                weight
            ),
            ConstraintError::NonFiniteSosWeight { weight } => {
                write!(f, "[{}] SOS weight must be finite (got {})", self.code(), weight)
            }
            ConstraintError::SosLengthMismatch { vars, weights } => write!(
                f,
                "[{}] SOS has {} variables but {} weights",
                self.code(),
                vars,
                weights
            ),
            ConstraintError::InvalidIndicatorValue { value } => write!(
                f,
                "[{}] Indicator value must be 0 or 1 (got {})",
                self.code(),
                value
            ),
            ConstraintError::InvalidVarIndex { value } => write!(
                f,
                "[{}] Variable index {} is out of range",
                self.code(),
                value
            ),
            ConstraintError::InvalidArity { kind, reason } => {
                write!(f, "[{}] {}: {}", self.code(), kind, reason)
            }
            ConstraintError::InvalidPiecewise { reason } => {
                write!(f, "[{}] Piecewise-linear constraint invalid: {}", self.code(), reason)
            }
        }
    }
}

impl std::error::Error for ConstraintError {}
