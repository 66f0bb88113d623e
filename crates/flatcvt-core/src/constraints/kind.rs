//! Constraint kind registry.
//!
//! One table generates the kind tag, the payload enum and the per-kind
//! metadata. Declaration order is the conversion order.

use super::algebraic::{LinCon, LinRangeCon, QuadCon, QuadRangeCon};
use super::functional::{CondCon, FuncCon, FunctionalExpr, PlCon};
use super::special::{ComplementarityCon, IndicatorCon, SosCon};
use flatcvt_expr::{AffineExpr, QuadExpr};

macro_rules! define_constraint_kinds {
    ($($kind:ident($payload:ty) => $name:literal, $option:literal, map: $map:literal;)*) => {
        /// Tag of a constraint kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ConKind {
            $($kind,)*
        }

        impl ConKind {
            /// Every kind, in conversion order.
            pub const ALL: &'static [ConKind] = &[$(ConKind::$kind,)*];

            pub const COUNT: usize = Self::ALL.len();

            pub fn index(self) -> usize {
                self as usize
            }

            pub fn type_name(self) -> &'static str {
                match self {
                    $(ConKind::$kind => $name,)*
                }
            }

            /// Name of the acceptance override option, e.g. `acc:linle`.
            pub fn option_name(self) -> &'static str {
                match self {
                    $(ConKind::$kind => $option,)*
                }
            }

            /// Whether stored instances are deduplicated.
            pub fn has_map(self) -> bool {
                match self {
                    $(ConKind::$kind => $map,)*
                }
            }

            pub fn from_option_name(name: &str) -> Option<ConKind> {
                Self::ALL.iter().copied().find(|k| k.option_name() == name)
            }
        }

        impl std::fmt::Display for ConKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.type_name())
            }
        }

        /// A constraint of any kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Constraint {
            $($kind($payload),)*
        }

        impl Constraint {
            pub fn kind(&self) -> ConKind {
                match self {
                    $(Constraint::$kind(_) => ConKind::$kind,)*
                }
            }
        }
    };
}

define_constraint_kinds! {
    LinRange(LinRangeCon) => "LinConRange", "acc:linrange", map: false;
    LinLe(LinCon) => "LinConLE", "acc:linle", map: false;
    LinEq(LinCon) => "LinConEQ", "acc:lineq", map: false;
    LinGe(LinCon) => "LinConGE", "acc:linge", map: false;
    QuadRange(QuadRangeCon) => "QuadConRange", "acc:quadrange", map: false;
    QuadLe(QuadCon) => "QuadConLE", "acc:quadle", map: false;
    QuadEq(QuadCon) => "QuadConEQ", "acc:quadeq", map: false;
    QuadGe(QuadCon) => "QuadConGE", "acc:quadge", map: false;
    LinearFunctional(FunctionalExpr<AffineExpr>) => "LinearFunctionalConstraint", "acc:linfunc", map: true;
    QuadFunctional(FunctionalExpr<QuadExpr>) => "QuadraticFunctionalConstraint", "acc:quadfunc", map: true;
    Max(FuncCon) => "MaximumConstraint", "acc:max", map: true;
    Min(FuncCon) => "MinimumConstraint", "acc:min", map: true;
    Abs(FuncCon) => "AbsConstraint", "acc:abs", map: true;
    And(FuncCon) => "AndConstraint", "acc:and", map: true;
    Or(FuncCon) => "OrConstraint", "acc:or", map: true;
    CondLinEq(CondCon<AffineExpr>) => "CondLinConEQ", "acc:condlineq", map: true;
    CondLinLe(CondCon<AffineExpr>) => "CondLinConLE", "acc:condlinle", map: true;
    CondLinLt(CondCon<AffineExpr>) => "CondLinConLT", "acc:condlinlt", map: true;
    CondLinGe(CondCon<AffineExpr>) => "CondLinConGE", "acc:condlinge", map: true;
    CondLinGt(CondCon<AffineExpr>) => "CondLinConGT", "acc:condlingt", map: true;
    CondQuadEq(CondCon<QuadExpr>) => "CondQuadConEQ", "acc:condquadeq", map: true;
    CondQuadLe(CondCon<QuadExpr>) => "CondQuadConLE", "acc:condquadle", map: true;
    CondQuadLt(CondCon<QuadExpr>) => "CondQuadConLT", "acc:condquadlt", map: true;
    CondQuadGe(CondCon<QuadExpr>) => "CondQuadConGE", "acc:condquadge", map: true;
    CondQuadGt(CondCon<QuadExpr>) => "CondQuadConGT", "acc:condquadgt", map: true;
    Not(FuncCon) => "NotConstraint", "acc:not", map: true;
    Div(FuncCon) => "DivConstraint", "acc:div", map: true;
    IfThen(FuncCon) => "IfThenConstraint", "acc:ifthen", map: true;
    AllDiff(FuncCon) => "AllDiffConstraint", "acc:alldiff", map: true;
    NumberofConst(FuncCon) => "NumberofConstConstraint", "acc:numberofconst", map: true;
    NumberofVar(FuncCon) => "NumberofVarConstraint", "acc:numberofvar", map: true;
    Count(FuncCon) => "CountConstraint", "acc:count", map: true;
    Exp(FuncCon) => "ExpConstraint", "acc:exp", map: true;
    ExpA(FuncCon) => "ExpAConstraint", "acc:expa", map: true;
    Log(FuncCon) => "LogConstraint", "acc:log", map: true;
    LogA(FuncCon) => "LogAConstraint", "acc:loga", map: true;
    Pow(FuncCon) => "PowConstraint", "acc:pow", map: true;
    Sin(FuncCon) => "SinConstraint", "acc:sin", map: true;
    Cos(FuncCon) => "CosConstraint", "acc:cos", map: true;
    Tan(FuncCon) => "TanConstraint", "acc:tan", map: true;
    IndLinLe(IndicatorCon<LinCon>) => "IndicatorConstraintLinLE", "acc:indle", map: false;
    IndLinEq(IndicatorCon<LinCon>) => "IndicatorConstraintLinEQ", "acc:indeq", map: false;
    IndLinGe(IndicatorCon<LinCon>) => "IndicatorConstraintLinGE", "acc:indge", map: false;
    IndQuadLe(IndicatorCon<QuadCon>) => "IndicatorConstraintQuadLE", "acc:indquadle", map: false;
    IndQuadEq(IndicatorCon<QuadCon>) => "IndicatorConstraintQuadEQ", "acc:indquadeq", map: false;
    IndQuadGe(IndicatorCon<QuadCon>) => "IndicatorConstraintQuadGE", "acc:indquadge", map: false;
    Pl(PlCon) => "PLConstraint", "acc:pl", map: false;
    Sos1(SosCon) => "SOS1Constraint", "acc:sos1", map: false;
    Sos2(SosCon) => "SOS2Constraint", "acc:sos2", map: false;
    ComplLin(ComplementarityCon<AffineExpr>) => "ComplementarityLinear", "acc:compl", map: false;
    ComplQuad(ComplementarityCon<QuadExpr>) => "ComplementarityQuadratic", "acc:complquad", map: false;
}

impl ConKind {
    /// Kinds whose result variable is boolean.
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            ConKind::And
                | ConKind::Or
                | ConKind::Not
                | ConKind::AllDiff
                | ConKind::CondLinEq
                | ConKind::CondLinLe
                | ConKind::CondLinLt
                | ConKind::CondLinGe
                | ConKind::CondLinGt
                | ConKind::CondQuadEq
                | ConKind::CondQuadLe
                | ConKind::CondQuadLt
                | ConKind::CondQuadGe
                | ConKind::CondQuadGt
        )
    }

    /// Kinds of the form `result = f(args)`.
    pub fn is_functional(self) -> bool {
        self.has_map() || self == ConKind::Pl
    }
}

#[cfg(test)]
mod tests {
    use super::ConKind;

    #[test]
    fn declaration_order_is_conversion_order() {
        assert_eq!(ConKind::ALL[0], ConKind::LinRange);
        assert_eq!(ConKind::ALL[ConKind::COUNT - 1], ConKind::ComplQuad);
        for (i, kind) in ConKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert!(ConKind::Max < ConKind::IndLinLe);
    }

    #[test]
    fn option_names_roundtrip() {
        for kind in ConKind::ALL {
            assert!(kind.option_name().starts_with("acc:"));
            assert_eq!(ConKind::from_option_name(kind.option_name()), Some(*kind));
        }
        assert_eq!(ConKind::from_option_name("acc:nothing"), None);
    }

    #[test]
    fn only_functional_kinds_keep_a_map() {
        assert!(ConKind::LinearFunctional.has_map());
        assert!(ConKind::CondLinLt.has_map());
        assert!(!ConKind::Pl.has_map());
        assert!(ConKind::Pl.is_functional());
        assert!(!ConKind::Sos1.has_map());
        assert!(!ConKind::LinLe.is_functional());
    }
}
