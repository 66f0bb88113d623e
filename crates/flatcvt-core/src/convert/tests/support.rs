use super::*;
use crate::backend::BackendError;
use crate::types::Sense;
use flatcvt_expr::QuadExpr;

pub(super) fn converter(profile: AcceptanceProfile) -> Converter<FlatModelRecorder> {
    converter_with(profile, ConverterOptions::new())
}

pub(super) fn converter_with(
    profile: AcceptanceProfile,
    options: ConverterOptions,
) -> Converter<FlatModelRecorder> {
    let mut cvt = Converter::new(FlatModelRecorder::new(profile), options);
    cvt.start_model_input().unwrap();
    cvt
}

/// `lower <= var <= upper` continuous input variable.
pub(super) fn continuous(
    cvt: &mut Converter<impl ModelApi>,
    lower: f64,
    upper: f64,
) -> VarId {
    cvt.input_var(Variable::continuous(lower, upper)).unwrap()
}

pub(super) fn binary(cvt: &mut Converter<impl ModelApi>) -> VarId {
    cvt.input_var(Variable::binary()).unwrap()
}

pub(super) fn integer(cvt: &mut Converter<impl ModelApi>, lower: f64, upper: f64) -> VarId {
    cvt.input_var(Variable::integer(lower, upper)).unwrap()
}

pub(super) fn sum_of(vars: &[VarId]) -> AffineExpr {
    flatcvt_expr::affine_sum(vars.iter().map(|v| AffineExpr::var(*v)))
}

/// Number of stored constraints of `kind`, converted or not.
pub(super) fn stored(cvt: &Converter<impl ModelApi>, kind: ConKind) -> usize {
    cvt.model().keeper(kind).len()
}

/// Pushed constraints of `kind`.
pub(super) fn pushed(cvt: &Converter<FlatModelRecorder>, kind: ConKind) -> usize {
    cvt.backend().count_of(kind)
}

/// Pushed constraints of kinds other than `kinds`.
pub(super) fn pushed_other_than(cvt: &Converter<FlatModelRecorder>, kinds: &[ConKind]) -> usize {
    cvt.backend()
        .constraints()
        .iter()
        .filter(|c| !kinds.contains(&c.kind()))
        .count()
}

/// Init expression of `var`.
pub(super) fn defining(cvt: &Converter<impl ModelApi>, var: VarId) -> Constraint {
    let info = cvt.model().init_expr(var).expect("variable has no init expression");
    cvt.model().constraint(info).unwrap().clone()
}

pub(super) fn minimize(cvt: &mut Converter<impl ModelApi>, expr: AffineExpr) {
    cvt.input_objective(Objective::linear(Sense::Minimize, expr))
        .unwrap();
}

/// Recorder that wants ranges with more than `max_terms` terms split even
/// though it accepts ranges.
pub(super) struct ShortRangeBackend {
    pub(super) inner: FlatModelRecorder,
    pub(super) max_terms: usize,
}

impl ShortRangeBackend {
    pub(super) fn new(max_terms: usize) -> Self {
        Self {
            inner: FlatModelRecorder::new(AcceptanceProfile::Mip),
            max_terms,
        }
    }
}

impl ModelApi for ShortRangeBackend {
    fn type_name(&self) -> &str {
        "short-range"
    }

    fn acceptance(&self, kind: ConKind) -> AcceptanceLevel {
        self.inner.acceptance(kind)
    }

    fn needs_conversion(&self, con: &Constraint) -> bool {
        match con {
            Constraint::LinRange(range) => range.body().terms().len() > self.max_terms,
            _ => false,
        }
    }

    fn add_variables(&mut self, vars: &[Variable]) -> Result<(), BackendError> {
        self.inner.add_variables(vars)
    }

    fn set_linear_objective(
        &mut self,
        index: usize,
        sense: Sense,
        expr: &AffineExpr,
    ) -> Result<(), BackendError> {
        self.inner.set_linear_objective(index, sense, expr)
    }

    fn set_quadratic_objective(
        &mut self,
        index: usize,
        sense: Sense,
        expr: &QuadExpr,
    ) -> Result<(), BackendError> {
        self.inner.set_quadratic_objective(index, sense, expr)
    }

    fn add_constraint(&mut self, con: &Constraint) -> Result<(), BackendError> {
        self.inner.add_constraint(con)
    }
}
