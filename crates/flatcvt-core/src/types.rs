use flatcvt_expr::{AffineExpr, QuadExpr};

/// Optimization sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Minimize => "minimize",
            Sense::Maximize => "maximize",
        }
    }
}

/// Domain type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarType {
    #[default]
    Continuous,
    Integer,
}

impl VarType {
    pub fn as_str(self) -> &'static str {
        match self {
            VarType::Continuous => "continuous",
            VarType::Integer => "integer",
        }
    }
}

/// Closed interval `[lower, upper]`; either end may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_finite(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn intersect(&self, other: &Bounds) -> Bounds {
        Bounds::new(self.lower.max(other.lower), self.upper.min(other.upper))
    }

    pub fn hull(&self, other: &Bounds) -> Bounds {
        Bounds::new(self.lower.min(other.lower), self.upper.max(other.upper))
    }
}

/// A variable with bounds and domain type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable {
    pub bounds: Bounds,
    pub var_type: VarType,
}

impl Variable {
    /// Binary variable: integer with bounds [0, 1].
    pub fn binary() -> Self {
        Self::integer(0.0, 1.0)
    }

    pub fn continuous(lower: f64, upper: f64) -> Self {
        Self {
            bounds: Bounds::new(lower, upper),
            var_type: VarType::Continuous,
        }
    }

    pub fn integer(lower: f64, upper: f64) -> Self {
        Self {
            bounds: Bounds::new(lower, upper),
            var_type: VarType::Integer,
        }
    }

    pub fn fixed(value: f64) -> Self {
        Self::continuous(value, value)
    }

    pub fn is_integer(&self) -> bool {
        self.var_type == VarType::Integer
    }

    pub fn is_binary(&self) -> bool {
        self.is_integer() && self.bounds.lower == 0.0 && self.bounds.upper == 1.0
    }
}

/// Objective with a sense and a linear or quadratic expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub expr: QuadExpr,
}

impl Objective {
    pub fn linear(sense: Sense, expr: AffineExpr) -> Self {
        Self {
            sense,
            expr: QuadExpr::from_affine(expr),
        }
    }

    pub fn quadratic(sense: Sense, expr: QuadExpr) -> Self {
        Self { sense, expr }
    }

    pub fn is_quadratic(&self) -> bool {
        !self.expr.is_affine()
    }
}
