use super::support::{binary, continuous, converter, defining, integer};
use super::*;
use crate::constraints::CondCon;

fn at_most(cvt: &mut Converter<FlatModelRecorder>, x: VarId, rhs: f64) -> VarId {
    cvt.assign_result_var(Constraint::CondLinLe(CondCon::new(LinCon::new(
        AffineExpr::var(x),
        rhs,
    ))))
    .unwrap()
}

fn context_of(cvt: &Converter<FlatModelRecorder>, var: VarId) -> Option<Context> {
    defining(cvt, var).context()
}

#[test]
fn test_narrowing_is_monotone() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 10.0);
    assert!(cvt.narrow_var_bounds(x, 2.0, 20.0).unwrap());
    assert_eq!(cvt.model().bounds(x), Bounds::new(2.0, 10.0));
    assert!(!cvt.narrow_var_bounds(x, 0.0, 10.0).unwrap());
    assert_eq!(cvt.model().bounds(x), Bounds::new(2.0, 10.0));
    assert!(!cvt.narrow_var_bounds(x, f64::NEG_INFINITY, f64::INFINITY).unwrap());
}

#[test]
fn test_empty_narrowing_is_infeasible() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 10.0);
    let err = cvt.narrow_var_bounds(x, 11.0, 12.0).unwrap_err();
    assert!(err.is_infeasible());
    assert_eq!(err.code(), "MODEL_INFEASIBLE");
    assert_eq!(cvt.model().bounds(x), Bounds::new(0.0, 10.0));
}

#[test]
fn test_integer_narrowing_rounds_inward() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let i = integer(&mut cvt, 0.0, 10.0);
    assert!(cvt.narrow_var_bounds(i, 0.5, 7.999_999_999_9).unwrap());
    assert_eq!(cvt.model().bounds(i), Bounds::new(1.0, 8.0));
    assert!(cvt.narrow_var_bounds(i, 1.2, 1.8).unwrap_err().is_infeasible());
}

#[test]
fn test_fix_as_true_forces_conjunction_arguments() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let a = binary(&mut cvt);
    let b = binary(&mut cvt);
    let r = cvt
        .assign_result_var(Constraint::And(FuncCon::new(vec![a, b])))
        .unwrap();
    cvt.fix_as_true(r).unwrap();
    assert_eq!(cvt.model().fixed_value(a), Some(1.0));
    assert_eq!(cvt.model().fixed_value(b), Some(1.0));
    assert_eq!(context_of(&cvt, r), Some(Context::Positive));
}

#[test]
fn test_false_disjunction_forces_arguments_false() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let a = binary(&mut cvt);
    let b = binary(&mut cvt);
    let r = cvt
        .assign_result_var(Constraint::Or(FuncCon::new(vec![a, b])))
        .unwrap();
    cvt.propagate_result_of_init_expr(r, 0.0, 0.0, Context::Negative)
        .unwrap();
    assert_eq!(cvt.model().fixed_value(a), Some(0.0));
    assert_eq!(cvt.model().fixed_value(b), Some(0.0));
}

#[test]
fn test_negation_flips_context_and_value() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 10.0);
    let c = at_most(&mut cvt, x, 3.0);
    let n = cvt
        .assign_result_var(Constraint::Not(FuncCon::new(vec![c])))
        .unwrap();
    cvt.fix_as_true(n).unwrap();
    assert_eq!(cvt.model().fixed_value(c), Some(0.0));
    assert_eq!(context_of(&cvt, c), Some(Context::Negative));
}

#[test]
fn test_nested_conjunction_reaches_comparison() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let a = binary(&mut cvt);
    let x = continuous(&mut cvt, 0.0, 10.0);
    let c = at_most(&mut cvt, x, 3.0);
    cvt.input_logical(Constraint::And(FuncCon::new(vec![a, c])))
        .unwrap();
    assert_eq!(cvt.model().fixed_value(c), Some(1.0));
    assert_eq!(context_of(&cvt, c), Some(Context::Positive));
}

#[test]
fn test_opposite_uses_merge_to_mixed() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 10.0);
    let c = at_most(&mut cvt, x, 3.0);
    assert_eq!(context_of(&cvt, c), Some(Context::None));
    cvt.propagate_result_of_init_expr(c, 0.0, 1.0, Context::Positive)
        .unwrap();
    assert_eq!(context_of(&cvt, c), Some(Context::Positive));
    cvt.propagate_result_of_init_expr(c, 0.0, 1.0, Context::Negative)
        .unwrap();
    assert_eq!(context_of(&cvt, c), Some(Context::Mixed));
}

#[test]
fn test_negative_coefficient_negates_argument_context() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 4.0);
    let y = continuous(&mut cvt, 0.0, 4.0);
    let m = cvt
        .assign_result_var(Constraint::Max(FuncCon::new(vec![x, y])))
        .unwrap();
    let scaled = cvt.convert_to_var(AffineExpr::term(m, -2.0)).unwrap();
    let b = cvt.model().bounds(scaled);
    cvt.propagate_result_of_init_expr(scaled, b.lower, b.upper, Context::Positive)
        .unwrap();
    assert_eq!(context_of(&cvt, scaled), Some(Context::Positive));
    assert_eq!(context_of(&cvt, m), Some(Context::Negative));
}

#[test]
fn test_root_constraint_uses_results_in_mixed_context() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 4.0);
    let y = continuous(&mut cvt, 0.0, 4.0);
    let m = cvt
        .assign_result_var(Constraint::Min(FuncCon::new(vec![x, y])))
        .unwrap();
    cvt.input_constraint(Constraint::LinLe(LinCon::new(AffineExpr::var(m), 3.0)))
        .unwrap();
    assert_eq!(context_of(&cvt, m), Some(Context::Mixed));
}
