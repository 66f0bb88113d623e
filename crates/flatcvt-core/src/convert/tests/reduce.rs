use super::support::{binary, continuous, converter, converter_with, defining, integer, stored};
use super::*;
use crate::constraints::{CondCon, FunctionalExpr};
use flatcvt_expr::QuadExpr;

fn fixed_binary(cvt: &mut Converter<FlatModelRecorder>, value: f64) -> VarId {
    cvt.input_var(Variable::integer(value, value)).unwrap()
}

fn cond_eq(expr: AffineExpr, rhs: f64) -> Constraint {
    Constraint::CondLinEq(CondCon::new(LinCon::new(expr, rhs)))
}

#[test]
fn test_bare_variable_reduces_to_itself() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 1.0);
    assert_eq!(cvt.convert_to_var(AffineExpr::var(x)).unwrap(), x);
    assert_eq!(cvt.model().num_constraints(), 0);
    assert_eq!(cvt.model().num_vars(), 1);
}

#[test]
fn test_equal_expressions_share_one_result() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 1.0);
    let y = continuous(&mut cvt, 0.0, 1.0);
    let first = cvt
        .convert_to_var(AffineExpr::term(x, 2.0) + AffineExpr::var(y))
        .unwrap();
    let second = cvt
        .convert_to_var(AffineExpr::var(y) + AffineExpr::term(x, 2.0))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(stored(&cvt, ConKind::LinearFunctional), 1);
    assert!(matches!(
        defining(&cvt, first),
        Constraint::LinearFunctional(FunctionalExpr { result, .. }) if result == first
    ));
}

#[test]
fn test_constant_reduces_to_shared_fixed_variable() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let k = cvt.convert_to_var(AffineExpr::from_constant(3.0)).unwrap();
    assert_eq!(cvt.model().bounds(k), Bounds::new(3.0, 3.0));
    assert_eq!(cvt.convert_to_var(AffineExpr::from_constant(3.0)).unwrap(), k);
    assert_eq!(cvt.add_var(Variable::fixed(3.0)), k);
    assert_ne!(cvt.make_fixed_var(4.0), k);
    assert_eq!(cvt.model().num_constraints(), 0);
}

#[test]
fn test_fixed_input_variables_are_never_merged() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let a = continuous(&mut cvt, 2.0, 2.0);
    let b = continuous(&mut cvt, 2.0, 2.0);
    assert_ne!(a, b);
    assert_ne!(cvt.make_fixed_var(2.0), a);
}

#[test]
fn test_decided_result_domain_returns_constant() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 2.0, 2.0);
    let y = continuous(&mut cvt, 1.0, 1.0);
    let r = cvt
        .convert_to_var(AffineExpr::var(x) + AffineExpr::var(y))
        .unwrap();
    assert_eq!(cvt.model().fixed_value(r), Some(3.0));
    assert_eq!(stored(&cvt, ConKind::LinearFunctional), 0);
}

#[test]
fn test_quadratic_without_products_reduces_as_affine() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 1.0);
    let expr = QuadExpr::from_affine(AffineExpr::term(x, 2.0).add_constant(1.0));
    cvt.convert_quad_to_var(expr).unwrap();
    assert_eq!(stored(&cvt, ConKind::LinearFunctional), 1);
    assert_eq!(stored(&cvt, ConKind::QuadFunctional), 0);

    cvt.convert_quad_to_var(QuadExpr::product(x, x, 1.0)).unwrap();
    assert_eq!(stored(&cvt, ConKind::QuadFunctional), 1);
}

#[test]
fn test_result_domain_is_inferred_from_arguments() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = integer(&mut cvt, 0.0, 2.0);
    let y = integer(&mut cvt, 1.0, 3.0);
    let r = cvt
        .convert_to_var(AffineExpr::var(x) + AffineExpr::var(y))
        .unwrap();
    assert_eq!(cvt.model().bounds(r), Bounds::new(1.0, 5.0));
    assert!(cvt.model().var(r).is_integer());
}

#[test]
fn test_unknown_variable_is_rejected() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let err = cvt
        .convert_to_var(AffineExpr::term(VarId::new(7), 2.0))
        .unwrap_err();
    assert_eq!(err.code(), "CONVERTER_INVARIANT");
    assert_eq!(cvt.model().num_constraints(), 0);
}

#[test]
fn test_complement_of_binary_is_one_minus_b() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let b = binary(&mut cvt);
    let c = cvt.make_complement_var(b).unwrap();
    assert_eq!(cvt.model().bounds(c), Bounds::new(0.0, 1.0));
    let Constraint::LinearFunctional(f) = defining(&cvt, c) else {
        panic!("complement is not defined by a linear expression");
    };
    assert_eq!(
        f.expr,
        (AffineExpr::from_constant(1.0) - AffineExpr::var(b)).normalized()
    );
    assert_eq!(cvt.make_complement_var(b).unwrap(), c);
}

#[test]
fn test_complement_of_non_binary_is_an_error() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = integer(&mut cvt, 0.0, 2.0);
    let err = cvt.make_complement_var(x).unwrap_err();
    assert_eq!(err.code(), "CONVERTER_INVARIANT");
}

#[test]
fn test_explicit_result_of_known_expression_adds_equality() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 4.0);
    let y = continuous(&mut cvt, 0.0, 4.0);
    let r1 = cvt
        .assign_result_var(Constraint::Max(FuncCon::new(vec![x, y])))
        .unwrap();
    let r2 = continuous(&mut cvt, f64::NEG_INFINITY, f64::INFINITY);
    cvt.add_constraint(Constraint::Max(FuncCon::new(vec![x, y]).with_result(r2)))
        .unwrap();

    assert_eq!(stored(&cvt, ConKind::Max), 1);
    assert_eq!(stored(&cvt, ConKind::LinEq), 1);
    let Some(Constraint::LinEq(eq)) = cvt.model().keeper(ConKind::LinEq).get(0) else {
        panic!("missing result equality");
    };
    assert_eq!(eq.body().terms().len(), 2);
    assert_eq!(eq.rhs(), 0.0);

    // same result again is a no-op
    cvt.add_constraint(Constraint::Max(FuncCon::new(vec![x, y]).with_result(r1)))
        .unwrap();
    assert_eq!(cvt.model().num_constraints(), 2);
}

#[test]
fn test_redefine_variable_replaces_init_expression() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 4.0);
    let y = continuous(&mut cvt, 0.0, 4.0);
    let r = cvt
        .assign_result_var(Constraint::Max(FuncCon::new(vec![x, y])))
        .unwrap();
    cvt.redefine_variable(r, Constraint::Min(FuncCon::new(vec![x, y])))
        .unwrap();

    assert_eq!(defining(&cvt, r).kind(), ConKind::Min);
    assert_eq!(defining(&cvt, r).result_var(), Some(r));
    assert_eq!(stored(&cvt, ConKind::Max), 1);

    let err = cvt
        .redefine_variable(r, Constraint::LinLe(LinCon::new(AffineExpr::var(x), 1.0)))
        .unwrap_err();
    assert_eq!(err.code(), "CONVERTER_INVARIANT");
}

#[test]
fn test_and_with_false_argument_folds_to_zero() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let f = fixed_binary(&mut cvt, 0.0);
    let b = binary(&mut cvt);
    let result = cvt
        .assign_result(Constraint::And(FuncCon::new(vec![f, b])))
        .unwrap();
    assert_eq!(result, VarOrConst::Const(0.0));
    assert_eq!(stored(&cvt, ConKind::And), 0);
}

#[test]
fn test_and_drops_true_arguments() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let t = fixed_binary(&mut cvt, 1.0);
    let b = binary(&mut cvt);
    let result = cvt
        .assign_result(Constraint::And(FuncCon::new(vec![t, b])))
        .unwrap();
    assert_eq!(result, VarOrConst::Var(b));
}

#[test]
fn test_or_with_true_argument_folds_to_one() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let t = fixed_binary(&mut cvt, 1.0);
    let b = binary(&mut cvt);
    let result = cvt
        .assign_result(Constraint::Or(FuncCon::new(vec![b, t])))
        .unwrap();
    assert_eq!(result, VarOrConst::Const(1.0));
}

#[test]
fn test_not_abs_and_ifthen_fold_on_known_arguments() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let t = fixed_binary(&mut cvt, 1.0);
    let x = continuous(&mut cvt, 1.0, 5.0);
    let y = continuous(&mut cvt, -1.0, 5.0);

    let not = cvt
        .assign_result(Constraint::Not(FuncCon::new(vec![t])))
        .unwrap();
    assert_eq!(not, VarOrConst::Const(0.0));

    let abs = cvt
        .assign_result(Constraint::Abs(FuncCon::new(vec![x])))
        .unwrap();
    assert_eq!(abs, VarOrConst::Var(x));

    let pick = cvt
        .assign_result(Constraint::IfThen(FuncCon::new(vec![t, y, x])))
        .unwrap();
    assert_eq!(pick, VarOrConst::Var(y));
    assert_eq!(cvt.model().num_constraints(), 0);
}

#[test]
fn test_single_argument_max_is_its_argument() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 5.0);
    let result = cvt
        .assign_result(Constraint::Max(FuncCon::new(vec![x])))
        .unwrap();
    assert_eq!(result, VarOrConst::Var(x));
}

#[test]
fn test_equality_outside_body_range_is_false() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = integer(&mut cvt, 0.0, 3.0);
    let two = integer(&mut cvt, 2.0, 2.0);
    assert_eq!(
        cvt.assign_result(cond_eq(AffineExpr::var(x), 7.0)).unwrap(),
        VarOrConst::Const(0.0)
    );
    assert_eq!(
        cvt.assign_result(cond_eq(AffineExpr::var(two), 2.0)).unwrap(),
        VarOrConst::Const(1.0)
    );
    assert_eq!(stored(&cvt, ConKind::CondLinEq), 0);
}

#[test]
fn test_equality_on_binary_becomes_the_binary_or_its_complement() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let b = binary(&mut cvt);
    assert_eq!(
        cvt.assign_result(cond_eq(AffineExpr::var(b), 1.0)).unwrap(),
        VarOrConst::Var(b)
    );
    assert_eq!(
        cvt.assign_result(cond_eq(AffineExpr::term(b, 2.0), 2.0))
            .unwrap(),
        VarOrConst::Var(b)
    );

    let VarOrConst::Var(c) = cvt.assign_result(cond_eq(AffineExpr::var(b), 0.0)).unwrap() else {
        panic!("b == 0 folded to a constant");
    };
    assert_ne!(c, b);
    assert_eq!(defining(&cvt, c).kind(), ConKind::LinearFunctional);
    assert_eq!(stored(&cvt, ConKind::CondLinEq), 0);
}

#[test]
fn test_eqbinary_switch_keeps_reified_equality() {
    let options = ConverterOptions::new().with_pre_eq_binary(false);
    let mut cvt = converter_with(AcceptanceProfile::Mip, options);
    let b = binary(&mut cvt);
    let result = cvt.assign_result(cond_eq(AffineExpr::var(b), 1.0)).unwrap();
    assert!(matches!(result, VarOrConst::Var(r) if r != b));
    assert_eq!(stored(&cvt, ConKind::CondLinEq), 1);
}

#[test]
fn test_disabled_preprocessing_stores_constraint_as_given() {
    let options = ConverterOptions::new().with_preprocess(false);
    let mut cvt = converter_with(AcceptanceProfile::Mip, options);
    let f = fixed_binary(&mut cvt, 0.0);
    let b = binary(&mut cvt);
    let result = cvt
        .assign_result(Constraint::And(FuncCon::new(vec![f, b])))
        .unwrap();
    assert!(matches!(result, VarOrConst::Var(_)));
    assert_eq!(stored(&cvt, ConKind::And), 1);
}

#[test]
fn test_root_logical_is_fixed_true() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let a = binary(&mut cvt);
    let b = binary(&mut cvt);
    cvt.input_logical(Constraint::Or(FuncCon::new(vec![a, b])))
        .unwrap();
    let Some(Constraint::Or(or)) = cvt.model().keeper(ConKind::Or).get(0) else {
        panic!("missing or constraint");
    };
    assert_eq!(cvt.model().fixed_value(or.result), Some(1.0));
    assert_eq!(or.ctx, Context::Positive);
}

#[test]
fn test_root_logical_always_false_is_infeasible() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let f = fixed_binary(&mut cvt, 0.0);
    let b = binary(&mut cvt);
    let err = cvt
        .input_logical(Constraint::And(FuncCon::new(vec![f, b])))
        .unwrap_err();
    assert!(err.is_infeasible());
}

#[test]
fn test_root_logical_rejects_non_logical_kind() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 1.0);
    let err = cvt
        .input_logical(Constraint::Max(FuncCon::new(vec![x, x])))
        .unwrap_err();
    assert_eq!(err.code(), "CONVERTER_INVARIANT");
}

#[test]
fn test_invalid_arity_is_rejected_before_storing() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 1.0);
    let err = cvt
        .assign_result(Constraint::Div(FuncCon::new(vec![x])))
        .unwrap_err();
    assert_eq!(err.code(), "CONSTRAINT_INVALID_ARITY");
    assert_eq!(cvt.model().num_constraints(), 0);
}
