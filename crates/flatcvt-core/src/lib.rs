//! Flattening of rich optimization models into solver-ready form.
//!
//! A [`Converter`] takes variables, constraints of any [`ConKind`] and
//! objectives, rewrites every constraint its backend does not accept into
//! simpler ones until a fixpoint is reached, and pushes the flat model
//! through the [`ModelApi`] contract. A [`ValuePresolver`] link graph maps
//! values between the original and the flat model.

pub mod backend;
pub mod constraints;
pub mod context;
pub mod convert;
pub mod error;
pub mod model;
pub mod options;
pub mod presolve;
pub mod types;

pub use backend::{
    AcceptanceLevel, AcceptanceProfile, BackendError, FlatModelRecorder, FlatModelSummary,
    ModelApi,
};
pub use constraints::{
    CondCon, ConKind, Constraint, ConstraintError, ComplementarityCon, FuncCon, FunctionalExpr,
    IndicatorCon, LinCon, LinRangeCon, PlCon, QuadCon, QuadRangeCon, SosCon,
};
pub use context::Context;
pub use convert::{
    ConversionReport, ConversionState, Converter, RewriteFn, RewriteRegistry, VarOrConst,
};
pub use error::ConvertError;
pub use model::{ConInfo, FlatModel};
pub use options::{ConverterOptions, OptionError};
pub use presolve::{Aggregation, Link, ModelValues, NodeRange, ValueKind, ValuePresolver};
pub use types::{Bounds, Objective, Sense, VarType, Variable};

pub use flatcvt_expr::{AffineExpr, QuadExpr, VarId};
