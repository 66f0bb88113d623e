//! Usage polarity of logical sub-expressions.
//!
//! Lattice: `None ⊑ {Positive, Negative} ⊑ Mixed`.

/// Context in which a constraint's truth value is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Context {
    #[default]
    None,
    Positive,
    Negative,
    Mixed,
}

impl Context {
    /// Least upper bound.
    pub fn merge(self, other: Context) -> Context {
        match (self, other) {
            (Context::None, c) | (c, Context::None) => c,
            (a, b) if a == b => a,
            _ => Context::Mixed,
        }
    }

    /// Context under logical negation.
    pub fn negate(self) -> Context {
        match self {
            Context::Positive => Context::Negative,
            Context::Negative => Context::Positive,
            other => other,
        }
    }

    /// `None` is widened to `Mixed` when a rewrite needs a decision.
    pub fn resolved(self) -> Context {
        match self {
            Context::None => Context::Mixed,
            other => other,
        }
    }

    pub fn is_none(self) -> bool {
        self == Context::None
    }

    pub fn has_positive(self) -> bool {
        matches!(self, Context::Positive | Context::Mixed)
    }

    pub fn has_negative(self) -> bool {
        matches!(self, Context::Negative | Context::Mixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Context::None => "none",
            Context::Positive => "positive",
            Context::Negative => "negative",
            Context::Mixed => "mixed",
        }
    }
}

impl std::ops::Neg for Context {
    type Output = Context;

    fn neg(self) -> Context {
        self.negate()
    }
}
