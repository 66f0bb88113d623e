//! Constraint kinds and payloads.
//!
//! - `kind`       : ConKind tag and the Constraint enum
//! - `algebraic`  : linear/quadratic single-sided and range constraints
//! - `functional` : `result = f(args)` payloads
//! - `special`    : indicator, SOS, complementarity
//! - `dedup`      : structural keys for functional kinds
//! - `error`      : construction errors

mod algebraic;
mod dedup;
mod error;
mod functional;
mod kind;
mod special;

pub use algebraic::{ConBody, LinCon, LinRangeCon, QuadCon, QuadRangeCon, RangeCon, RhsCon};
pub use dedup::DedupKey;
pub use error::ConstraintError;
pub use functional::{CondCon, FuncCon, FunctionalExpr, PlCon, UNASSIGNED};
pub use kind::{ConKind, Constraint};
pub use special::{ComplementarityCon, IndicatorCon, SosCon};

use crate::context::Context;
use flatcvt_expr::{VarId, canonical_bits};

macro_rules! func_con {
    ($c:pat) => {
        Constraint::Max($c)
            | Constraint::Min($c)
            | Constraint::Abs($c)
            | Constraint::And($c)
            | Constraint::Or($c)
            | Constraint::Not($c)
            | Constraint::Div($c)
            | Constraint::IfThen($c)
            | Constraint::AllDiff($c)
            | Constraint::NumberofConst($c)
            | Constraint::NumberofVar($c)
            | Constraint::Count($c)
            | Constraint::Exp($c)
            | Constraint::ExpA($c)
            | Constraint::Log($c)
            | Constraint::LogA($c)
            | Constraint::Pow($c)
            | Constraint::Sin($c)
            | Constraint::Cos($c)
            | Constraint::Tan($c)
    };
}

macro_rules! cond_lin {
    ($c:pat) => {
        Constraint::CondLinEq($c)
            | Constraint::CondLinLe($c)
            | Constraint::CondLinLt($c)
            | Constraint::CondLinGe($c)
            | Constraint::CondLinGt($c)
    };
}

macro_rules! cond_quad {
    ($c:pat) => {
        Constraint::CondQuadEq($c)
            | Constraint::CondQuadLe($c)
            | Constraint::CondQuadLt($c)
            | Constraint::CondQuadGe($c)
            | Constraint::CondQuadGt($c)
    };
}

macro_rules! lin_con {
    ($c:pat) => {
        Constraint::LinLe($c) | Constraint::LinEq($c) | Constraint::LinGe($c)
    };
}

macro_rules! quad_con {
    ($c:pat) => {
        Constraint::QuadLe($c) | Constraint::QuadEq($c) | Constraint::QuadGe($c)
    };
}

macro_rules! ind_lin {
    ($c:pat) => {
        Constraint::IndLinLe($c) | Constraint::IndLinEq($c) | Constraint::IndLinGe($c)
    };
}

macro_rules! ind_quad {
    ($c:pat) => {
        Constraint::IndQuadLe($c) | Constraint::IndQuadEq($c) | Constraint::IndQuadGe($c)
    };
}

impl Constraint {
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    /// Result variable of a functional constraint.
    pub fn result_var(&self) -> Option<VarId> {
        match self {
            Constraint::LinearFunctional(c) => Some(c.result),
            Constraint::QuadFunctional(c) => Some(c.result),
            func_con!(c) => Some(c.result),
            cond_lin!(c) => Some(c.result),
            cond_quad!(c) => Some(c.result),
            Constraint::Pl(c) => Some(c.result),
            _ => None,
        }
    }

    pub(crate) fn set_result_var(&mut self, result: VarId) {
        match self {
            Constraint::LinearFunctional(c) => c.result = result,
            Constraint::QuadFunctional(c) => c.result = result,
            func_con!(c) => c.result = result,
            cond_lin!(c) => c.result = result,
            cond_quad!(c) => c.result = result,
            Constraint::Pl(c) => c.result = result,
            _ => {}
        }
    }

    /// Usage context, for kinds that track one.
    pub fn context(&self) -> Option<Context> {
        match self {
            Constraint::LinearFunctional(c) => Some(c.ctx),
            Constraint::QuadFunctional(c) => Some(c.ctx),
            func_con!(c) => Some(c.ctx),
            cond_lin!(c) => Some(c.ctx),
            cond_quad!(c) => Some(c.ctx),
            Constraint::Pl(c) => Some(c.ctx),
            _ => None,
        }
    }

    pub(crate) fn context_mut(&mut self) -> Option<&mut Context> {
        match self {
            Constraint::LinearFunctional(c) => Some(&mut c.ctx),
            Constraint::QuadFunctional(c) => Some(&mut c.ctx),
            func_con!(c) => Some(&mut c.ctx),
            cond_lin!(c) => Some(&mut c.ctx),
            cond_quad!(c) => Some(&mut c.ctx),
            Constraint::Pl(c) => Some(&mut c.ctx),
            _ => None,
        }
    }

    /// Arguments of a [`FuncCon`]-based kind.
    pub fn func(&self) -> Option<&FuncCon> {
        match self {
            func_con!(c) => Some(c),
            _ => None,
        }
    }

    /// Every variable the constraint references, result included.
    pub fn vars(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        match self {
            Constraint::LinRange(c) => c.body().collect_vars(&mut out),
            Constraint::QuadRange(c) => c.body().collect_vars(&mut out),
            lin_con!(c) => c.body().collect_vars(&mut out),
            quad_con!(c) => c.body().collect_vars(&mut out),
            Constraint::LinearFunctional(c) => c.expr.collect_vars(&mut out),
            Constraint::QuadFunctional(c) => c.expr.collect_vars(&mut out),
            func_con!(c) => out.extend_from_slice(&c.args),
            cond_lin!(c) => c.con.body().collect_vars(&mut out),
            cond_quad!(c) => c.con.body().collect_vars(&mut out),
            ind_lin!(c) => {
                out.push(c.bvar());
                c.con().body().collect_vars(&mut out);
            }
            ind_quad!(c) => {
                out.push(c.bvar());
                c.con().body().collect_vars(&mut out);
            }
            Constraint::Pl(c) => out.push(c.arg),
            Constraint::Sos1(c) | Constraint::Sos2(c) => out.extend_from_slice(c.vars()),
            Constraint::ComplLin(c) => {
                c.expr.collect_vars(&mut out);
                out.push(c.var);
            }
            Constraint::ComplQuad(c) => {
                c.expr.collect_vars(&mut out);
                out.push(c.var);
            }
        }
        if let Some(result) = self.result_var() {
            out.push(result);
        }
        out
    }

    /// Dedup key for kinds stored with a map.
    pub fn dedup_key(&self) -> Option<DedupKey> {
        match self {
            Constraint::LinearFunctional(c) => Some(DedupKey::Linear(c.expr.clone())),
            Constraint::QuadFunctional(c) => Some(DedupKey::Quadratic(c.expr.clone())),
            func_con!(c) => Some(DedupKey::func(&c.args, &c.params)),
            cond_lin!(c) => Some(DedupKey::CondLin {
                body: c.con.body().clone(),
                rhs: canonical_bits(c.con.rhs()),
            }),
            cond_quad!(c) => Some(DedupKey::CondQuad {
                body: c.con.body().clone(),
                rhs: canonical_bits(c.con.rhs()),
            }),
            _ => None,
        }
    }

    /// Check argument and parameter counts against the kind.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        let Some(func) = self.func() else {
            return Ok(());
        };
        let (args, params) = (func.args.len(), func.params.len());
        let kind = self.kind();
        let arity = |ok: bool, reason: &str| {
            if ok {
                Ok(())
            } else {
                Err(ConstraintError::InvalidArity {
                    kind: kind.type_name(),
                    reason: format!("{reason} (got {args} args, {params} params)"),
                })
            }
        };
        match kind {
            ConKind::Abs
            | ConKind::Not
            | ConKind::Exp
            | ConKind::Log
            | ConKind::Sin
            | ConKind::Cos
            | ConKind::Tan => arity(args == 1 && params == 0, "expects one argument"),
            ConKind::ExpA | ConKind::LogA | ConKind::Pow => arity(
                args == 1 && params == 1,
                "expects one argument and one parameter",
            ),
            ConKind::Div => arity(args == 2, "expects two arguments"),
            ConKind::IfThen => arity(args == 3, "expects condition, then and else arguments"),
            ConKind::Max | ConKind::Min | ConKind::NumberofVar => {
                arity(args >= 1, "expects at least one argument")
            }
            ConKind::NumberofConst => arity(params == 1, "expects one parameter"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use flatcvt_expr::AffineExpr;

    fn v(i: u32) -> VarId {
        VarId::new(i)
    }

    #[test]
    fn dedup_key_ignores_result_and_context() {
        let a = Constraint::Max(FuncCon::new(vec![v(0), v(1)]).with_result(v(5)));
        let mut b = FuncCon::new(vec![v(0), v(1)]).with_result(v(6));
        b.ctx = Context::Positive;
        let b = Constraint::Max(b);
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_ne!(a, b);
    }

    #[test]
    fn algebraic_kinds_have_no_key() {
        let con = Constraint::LinLe(LinCon::new(AffineExpr::var(v(0)), 1.0));
        assert!(con.dedup_key().is_none());
        assert!(con.result_var().is_none());
        assert_eq!(con.vars(), vec![v(0)]);
    }

    #[test]
    fn set_result_updates_functional_payload() {
        let mut con = Constraint::LinearFunctional(FunctionalExpr::new(
            AffineExpr::term(v(0), 2.0),
        ));
        assert_eq!(con.result_var(), Some(UNASSIGNED));
        con.set_result_var(v(3));
        assert_eq!(con.result_var(), Some(v(3)));
        assert_eq!(con.vars(), vec![v(0), v(3)]);
    }

    #[test]
    fn arity_is_checked_per_kind() {
        let div = Constraint::Div(FuncCon::new(vec![v(0)]));
        assert_eq!(div.validate().unwrap_err().code(), "CONSTRAINT_INVALID_ARITY");
        let pow = Constraint::Pow(FuncCon::with_params(vec![v(0)], vec![2.0]));
        assert!(pow.validate().is_ok());
        let sos = Constraint::Sos1(SosCon::new(vec![v(0)], vec![1.0]).unwrap());
        assert!(sos.validate().is_ok());
    }
}
