use super::support::{
    ShortRangeBackend, binary, continuous, converter, converter_with, integer, minimize, pushed,
    sum_of,
};
use super::*;
use crate::constraints::LinRangeCon;
use crate::model::ConInfo;
use crate::presolve::{Aggregation, Link};

fn split_ranges() -> ConverterOptions {
    ConverterOptions::new().with_acceptance(ConKind::LinRange, AcceptanceLevel::NotAccepted)
}

fn range(var: VarId, lower: f64, upper: f64) -> Constraint {
    Constraint::LinRange(LinRangeCon::new(AffineExpr::var(var), lower, upper))
}

fn rhs_of(con: &Constraint) -> f64 {
    match con {
        Constraint::LinLe(c) | Constraint::LinEq(c) | Constraint::LinGe(c) => c.rhs(),
        other => panic!("not a linear constraint: {}", other.type_name()),
    }
}

#[test]
fn test_native_model_converts_in_one_pass() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.0, 10.0);
    let y = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(Constraint::LinLe(LinCon::new(sum_of(&[x, y]), 5.0)))
        .unwrap();
    cvt.input_constraint(Constraint::LinGe(LinCon::new(
        AffineExpr::var(x) - AffineExpr::var(y),
        -1.0,
    )))
    .unwrap();
    minimize(&mut cvt, AffineExpr::var(x));

    let report = cvt.finish_model_input().unwrap();
    assert_eq!(report.passes, 1);
    assert_eq!(report.rewrites, 0);
    assert_eq!(report.constraints_created, 0);
    assert_eq!(report.variables_created, 0);
    assert_eq!(report.constraints_pushed, 2);
    assert_eq!(report.variables_pushed, 2);
    assert_eq!(cvt.state(), ConversionState::Converted);
    assert_eq!(cvt.backend().objectives().len(), 1);
    assert_eq!(pushed(&cvt, ConKind::LinLe), 1);
    assert_eq!(pushed(&cvt, ConKind::LinGe), 1);
}

#[test]
fn test_range_with_equal_bounds_becomes_equality() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, split_ranges());
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 2.0, 2.0)).unwrap();

    let report = cvt.finish_model_input().unwrap();
    assert_eq!(report.passes, 2);
    assert_eq!(report.rewrites, 1);
    let cons = cvt.backend().constraints();
    assert_eq!(cons.len(), 1);
    assert_eq!(cons[0].kind(), ConKind::LinEq);
    assert_eq!(rhs_of(&cons[0]), 2.0);
}

#[test]
fn test_range_with_infinite_lower_becomes_single_le() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, split_ranges());
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, f64::NEG_INFINITY, 5.0)).unwrap();

    cvt.finish_model_input().unwrap();
    let cons = cvt.backend().constraints();
    assert_eq!(cons.len(), 1);
    assert_eq!(cons[0].kind(), ConKind::LinLe);
    assert_eq!(rhs_of(&cons[0]), 5.0);
}

#[test]
fn test_range_with_finite_bounds_splits_in_two() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, split_ranges());
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 1.0, 5.0)).unwrap();

    let report = cvt.finish_model_input().unwrap();
    assert_eq!(report.constraints_created, 2);
    assert_eq!(report.constraints_pushed, 2);
    let ge: Vec<f64> = cvt.backend().constraints_of(ConKind::LinGe).map(rhs_of).collect();
    let le: Vec<f64> = cvt.backend().constraints_of(ConKind::LinLe).map(rhs_of).collect();
    assert_eq!(ge, vec![1.0]);
    assert_eq!(le, vec![5.0]);
    assert_eq!(pushed(&cvt, ConKind::LinRange), 0);
}

#[test]
fn test_crossed_range_is_infeasible_and_stays_converting() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, split_ranges());
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 5.0, 1.0)).unwrap();

    let err = cvt.finish_model_input().unwrap_err();
    assert!(err.is_infeasible());
    assert_eq!(cvt.state(), ConversionState::Converting);
    assert!(cvt.backend().constraints().is_empty());
}

#[test]
fn test_unsupported_kind_names_kind_and_backend() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, 0.5, 2.0);
    cvt.input_constraint(Constraint::Exp(FuncCon::new(vec![x])))
        .unwrap();

    let err = cvt.finish_model_input().unwrap_err();
    assert_eq!(err.code(), "CONSTRAINT_UNSUPPORTED");
    let message = err.to_string();
    assert!(message.contains("ExpConstraint"), "{message}");
    assert!(message.contains("recorder[mip]"), "{message}");
}

#[test]
fn test_failed_fallback_rewrite_is_kept_with_warning() {
    let recorder = FlatModelRecorder::new(AcceptanceProfile::Full)
        .with_acceptance(ConKind::Div, AcceptanceLevel::AcceptedButNotRecommended);
    let mut cvt = Converter::new(recorder, ConverterOptions::new());
    cvt.start_model_input().unwrap();
    let x = continuous(&mut cvt, 1.0, 2.0);
    let y = continuous(&mut cvt, -1.0, 1.0);
    cvt.input_constraint(Constraint::Div(FuncCon::new(vec![x, y])))
        .unwrap();

    let report = cvt.finish_model_input().unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("DivConstraint #0"));
    assert!(report.warnings[0].contains("contains zero"));
    assert_eq!(report.warnings, cvt.warnings());
    assert_eq!(pushed(&cvt, ConKind::Div), 1);
    assert_eq!(pushed(&cvt, ConKind::QuadEq), 0);
}

#[test]
fn test_fallback_kind_with_working_rule_is_rewritten() {
    let mut cvt = converter(AcceptanceProfile::Full);
    let x = continuous(&mut cvt, 0.0, 3.0);
    let y = continuous(&mut cvt, 0.0, 3.0);
    let r = cvt
        .assign_result_var(Constraint::Max(FuncCon::new(vec![x, y])))
        .unwrap();
    minimize(&mut cvt, AffineExpr::var(r));

    let report = cvt.finish_model_input().unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(pushed(&cvt, ConKind::Max), 0);
    assert_eq!(pushed(&cvt, ConKind::LinLe), 2);
}

#[test]
fn test_needs_conversion_splits_only_flagged_instances() {
    let mut cvt = Converter::new(ShortRangeBackend::new(1), ConverterOptions::new());
    cvt.start_model_input().unwrap();
    let x = continuous(&mut cvt, 0.0, 10.0);
    let y = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 0.0, 1.0)).unwrap();
    cvt.input_constraint(Constraint::LinRange(LinRangeCon::new(sum_of(&[x, y]), 0.0, 1.0)))
        .unwrap();

    let report = cvt.finish_model_input().unwrap();
    assert_eq!(report.rewrites, 1);
    let inner = &cvt.backend().inner;
    assert_eq!(inner.count_of(ConKind::LinRange), 1);
    assert_eq!(inner.count_of(ConKind::LinGe), 1);
    assert_eq!(inner.count_of(ConKind::LinLe), 1);
}

#[test]
fn test_rewrite_chain_needs_several_passes() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = continuous(&mut cvt, -2.0, 3.0);
    let r = cvt
        .assign_result_var(Constraint::Abs(FuncCon::new(vec![x])))
        .unwrap();
    minimize(&mut cvt, AffineExpr::var(r));

    let report = cvt.finish_model_input().unwrap();
    assert!(report.passes >= 2);
    for kind in [ConKind::Abs, ConKind::Max, ConKind::LinearFunctional] {
        assert_eq!(pushed(&cvt, kind), 0, "{kind}");
    }
}

#[test]
fn test_custom_registry_rule_is_used() {
    fn upper_only(
        cvt: &mut Converter<FlatModelRecorder>,
        con: &Constraint,
        _info: ConInfo,
    ) -> Result<(), ConvertError> {
        let Constraint::LinRange(range) = con else {
            return Ok(());
        };
        cvt.add_constraint(Constraint::LinLe(LinCon::new(
            range.body().clone(),
            range.upper(),
        )))
    }

    let mut registry = RewriteRegistry::empty();
    registry.register(ConKind::LinRange, upper_only);
    let mut cvt = Converter::with_registry(
        FlatModelRecorder::new(AcceptanceProfile::Mip),
        split_ranges(),
        registry,
    );
    cvt.start_model_input().unwrap();
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 1.0, 5.0)).unwrap();

    cvt.finish_model_input().unwrap();
    assert_eq!(pushed(&cvt, ConKind::LinLe), 1);
    assert_eq!(pushed(&cvt, ConKind::LinGe), 0);
}

#[test]
fn test_unregistered_rule_makes_kind_unsupported() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, split_ranges());
    cvt.registry_mut().unregister(ConKind::LinRange);
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 1.0, 5.0)).unwrap();

    let err = cvt.finish_model_input().unwrap_err();
    assert_eq!(err.code(), "CONSTRAINT_UNSUPPORTED");
}

#[test]
fn test_postsolve_sums_split_range_values() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, split_ranges());
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 1.0, 5.0)).unwrap();
    cvt.finish_model_input().unwrap();

    assert!(cvt.presolver().links().iter().any(|link| matches!(
        link,
        Link::OneToMany {
            aggregation: Aggregation::Sum,
            ..
        }
    )));

    // backend rows: LinLe first, LinGe second
    let solution = ModelValues {
        vars: vec![3.0],
        cons: vec![0.5, -0.25],
        objs: vec![],
    };
    let original = cvt.postsolve_values(&solution).unwrap();
    assert_eq!(original.vars, vec![3.0]);
    assert_eq!(original.cons, vec![0.25]);

    let start = ModelValues {
        vars: vec![4.0],
        cons: vec![2.0],
        objs: vec![],
    };
    let flat = cvt.presolve_values(&start).unwrap();
    assert_eq!(flat.vars, vec![4.0]);
    assert_eq!(flat.cons, vec![0.0, 2.0]);
}

#[test]
fn test_postsolve_rejects_wrong_value_count() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    continuous(&mut cvt, 0.0, 1.0);
    cvt.finish_model_input().unwrap();

    let err = cvt
        .postsolve_values(&ModelValues {
            vars: vec![1.0, 2.0],
            ..ModelValues::default()
        })
        .unwrap_err();
    assert_eq!(err.code(), "CONVERTER_INVARIANT");
}

#[test]
fn test_relax_pushes_every_variable_continuous() {
    let mut cvt = converter_with(AcceptanceProfile::Mip, ConverterOptions::new().with_relax(true));
    let x = integer(&mut cvt, 0.0, 3.0);
    let b = binary(&mut cvt);
    cvt.input_constraint(Constraint::LinLe(LinCon::new(sum_of(&[x, b]), 2.0)))
        .unwrap();

    cvt.finish_model_input().unwrap();
    let summary = cvt.backend().summary();
    assert_eq!(summary.num_variables, 2);
    assert_eq!(summary.num_integer, 0);
    assert_eq!(summary.variables[0].upper, 3.0);
}

#[test]
fn test_integer_bounds_are_rounded_before_push() {
    let mut cvt = converter(AcceptanceProfile::Mip);
    let x = cvt.input_var(Variable::integer(0.5, 3.7)).unwrap();
    minimize(&mut cvt, AffineExpr::var(x));

    cvt.finish_model_input().unwrap();
    let pushed_var = cvt.backend().variables()[0];
    assert_eq!(pushed_var.bounds, Bounds::new(1.0, 3.0));
}

#[test]
fn test_writegraph_exports_one_line_per_link() {
    let path = std::env::temp_dir().join(format!(
        "flatcvt-engine-graph-{}.jsonl",
        std::process::id()
    ));
    let options = split_ranges().with_write_graph(&path);
    let mut cvt = converter_with(AcceptanceProfile::Mip, options);
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 1.0, 5.0)).unwrap();
    cvt.finish_model_input().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), cvt.presolver().links().len());
    assert!(lines.iter().all(|line| line.get("type").is_some()));
    assert!(lines.iter().any(|line| line["aggregation"] == "sum"));
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["index"], i);
    }
}

#[test]
fn test_unopenable_graph_path_fails_only_when_requested() {
    let path = std::env::temp_dir()
        .join(format!("flatcvt-missing-{}", std::process::id()))
        .join("graph.jsonl");
    let options = ConverterOptions::new().with_write_graph(&path);
    let mut cvt = Converter::new(FlatModelRecorder::new(AcceptanceProfile::Mip), options);
    let err = cvt.start_model_input().unwrap_err();
    assert_eq!(err.code(), "GRAPH_EXPORT_FAILED");
    assert!(!cvt.presolver().is_exporting());

    let mut plain = Converter::new(
        FlatModelRecorder::new(AcceptanceProfile::Mip),
        ConverterOptions::new(),
    );
    plain.start_model_input().unwrap();
    assert!(!plain.presolver().is_exporting());
}

#[test]
fn test_aborted_conversion_still_closes_the_graph_export() {
    let path = std::env::temp_dir().join(format!(
        "flatcvt-engine-abort-{}.jsonl",
        std::process::id()
    ));
    let options = split_ranges().with_write_graph(&path);
    let mut cvt = converter_with(AcceptanceProfile::Mip, options);
    let x = continuous(&mut cvt, 0.0, 10.0);
    cvt.input_constraint(range(x, 5.0, 1.0)).unwrap();

    let err = cvt.finish_model_input().unwrap_err();
    assert!(err.is_infeasible());
    assert!(!cvt.presolver().is_exporting());

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(!lines.is_empty());
    assert_eq!(lines.len(), cvt.presolver().links().len());
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line["index"], i);
    }
}
