//! Comparison sense of single-sided algebraic constraints.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonSense {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl ComparisonSense {
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonSense::LessEqual => "le",
            ComparisonSense::Equal => "eq",
            ComparisonSense::GreaterEqual => "ge",
        }
    }

    /// Sense after multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            ComparisonSense::LessEqual => ComparisonSense::GreaterEqual,
            ComparisonSense::Equal => ComparisonSense::Equal,
            ComparisonSense::GreaterEqual => ComparisonSense::LessEqual,
        }
    }

    /// Whether `lhs <sense> rhs` holds.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonSense::LessEqual => lhs <= rhs,
            ComparisonSense::Equal => lhs == rhs,
            ComparisonSense::GreaterEqual => lhs >= rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ComparisonSense;

    #[test]
    fn flip_is_involutive() {
        for sense in [
            ComparisonSense::LessEqual,
            ComparisonSense::Equal,
            ComparisonSense::GreaterEqual,
        ] {
            assert_eq!(sense.flipped().flipped(), sense);
        }
        assert_eq!(ComparisonSense::LessEqual.as_str(), "le");
    }

    #[test]
    fn holds() {
        assert!(ComparisonSense::LessEqual.holds(1.0, 2.0));
        assert!(!ComparisonSense::GreaterEqual.holds(1.0, 2.0));
        assert!(ComparisonSense::Equal.holds(2.0, 2.0));
    }
}
