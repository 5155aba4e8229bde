//! End-to-end validation scenarios.

use num_complex::Complex64;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use tessella_core::{Address, DiagnosticKind, KeyKind, Phase, Value};
use tessella_validate::{validate, Template};

const TEMPLATE: &str = r#"
keywords:
  - name: title
    type: str
    docstring: Title of the calculation.
sections:
  - name: scf
    docstring: Self-consistent field options.
    keywords:
      - name: another_number
        type: int
        docstring: Computed from the iteration cap.
        default: "user['scf']['max_num_iterations'] / 10"
      - name: max_num_iterations
        type: int
        default: 20
        docstring: Iteration cap.
      - name: damping
        type: float
        default: 12.5
        docstring: Damping factor.
        predicates:
          - "0 <= value <= 40"
"#;

fn template() -> Template {
    Template::from_yaml(TEMPLATE).unwrap()
}

fn input(json: serde_json::Value) -> Value {
    serde_json::from_value(json).unwrap()
}

#[test]
fn defaults_fill_in_and_computed_defaults_resolve() {
    let result = validate(&input(serde_json::json!({"title": "energy"})), &template()).unwrap();
    assert_eq!(
        result.get_at(&Address::of(["scf", "max_num_iterations"])),
        Some(&Value::Int(20))
    );
    assert_eq!(
        result.get_at(&Address::of(["scf", "another_number"])),
        Some(&Value::Int(2))
    );
    assert_eq!(
        result.get_at(&Address::of(["scf", "damping"])),
        Some(&Value::Float(12.5))
    );
}

#[test]
fn computed_default_follows_a_user_override() {
    let result = validate(
        &input(serde_json::json!({"title": "t", "scf": {"max_num_iterations": 40}})),
        &template(),
    )
    .unwrap();
    assert_eq!(
        result.get_at(&Address::of(["scf", "another_number"])),
        Some(&Value::Int(4))
    );
}

#[test]
fn missing_required_title_fails_the_merge_phase() {
    let report = validate(&input(serde_json::json!({})), &template()).unwrap_err();
    assert_eq!(report.phase(), Phase::Merging);
    assert_eq!(report.diagnostics().len(), 1);
    let diagnostic = &report.diagnostics()[0];
    assert_eq!(diagnostic.address, Address::of(["title"]));
    assert_eq!(diagnostic.kind, DiagnosticKind::MissingRequired("title".into()));

    let rendered = report.to_string();
    assert!(rendered.contains("Error(s) occurred when merging:"));
    assert!(rendered.contains("- At user['title']:"));
    assert!(rendered.contains("Keyword 'title' is required but has no value."));
}

#[test]
fn unexpected_keys_in_different_sections_are_all_reported() {
    let report = validate(
        &input(serde_json::json!({
            "title": "t",
            "mistyped": 1,
            "scf": {"mistyped_nested": 2}
        })),
        &template(),
    )
    .unwrap_err();
    assert_eq!(report.phase(), Phase::Merging);
    let unexpected: Vec<_> = report
        .diagnostics()
        .iter()
        .filter_map(|d| match &d.kind {
            DiagnosticKind::UnexpectedKey { kind, name } => Some((kind, name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        unexpected,
        vec![(&KeyKind::Keyword, "mistyped"), (&KeyKind::Keyword, "mistyped_nested")]
    );
}

#[test]
fn dangling_default_reference_is_a_reference_diagnostic() {
    let template = Template::from_yaml(
        r#"
sections:
  - name: scf
    docstring: SCF options.
    keywords:
      - name: another_number
        type: int
        docstring: References a keyword the template never declares.
        default: "user['scf']['min_num_iterations'] / 10"
      - name: max_num_iterations
        type: int
        default: 20
        docstring: Iteration cap.
"#,
    )
    .unwrap();
    let report = validate(&input(serde_json::json!({})), &template).unwrap_err();
    assert_eq!(report.phase(), Phase::FixingDefaults);
    assert_eq!(
        report.diagnostics()[0].kind,
        DiagnosticKind::ExpressionReference {
            key: "min_num_iterations".into(),
            closure: "user['scf']['min_num_iterations'] / 10".into(),
        }
    );
    let rendered = report.to_string();
    assert!(rendered.contains("KeyError 'min_num_iterations'"));
    assert!(rendered.contains("in closure 'user['scf']['min_num_iterations'] / 10'"));
}

#[test]
fn out_of_range_value_fails_its_predicate() {
    let report = validate(
        &input(serde_json::json!({"title": "t", "scf": {"damping": 50.0}})),
        &template(),
    )
    .unwrap_err();
    assert_eq!(report.phase(), Phase::CheckingPredicates);
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].address, Address::of(["scf", "damping"]));
    assert_eq!(
        report.diagnostics()[0].kind,
        DiagnosticKind::PredicateNotSatisfied("0 <= value <= 40".into())
    );
}

#[test]
fn cyclic_defaults_fail_the_template_phase() {
    let template = Template::from_yaml(
        r#"
sections:
  - name: loop
    docstring: Cyclic defaults.
    keywords:
      - name: a
        type: int
        docstring: Depends on b.
        default: "user['loop']['b'] + 1"
      - name: b
        type: int
        docstring: Depends on a.
        default: "user['loop']['a'] + 1"
"#,
    )
    .unwrap();
    let report = validate(&input(serde_json::json!({})), &template).unwrap_err();
    assert_eq!(report.phase(), Phase::CheckingTemplate);
    let cyclic = report
        .diagnostics()
        .iter()
        .filter(|d| matches!(d.kind, DiagnosticKind::CyclicDefault(_)))
        .count();
    assert_eq!(cyclic, 2);
}

#[test]
fn a_failing_phase_stops_the_pipeline() {
    // Missing title (merge) and an out-of-range damping (predicates):
    // only the merge phase reports.
    let report = validate(
        &input(serde_json::json!({"scf": {"damping": 50.0}})),
        &template(),
    )
    .unwrap_err();
    assert_eq!(report.phase(), Phase::Merging);
    assert!(report
        .diagnostics()
        .iter()
        .all(|d| matches!(d.kind, DiagnosticKind::MissingRequired(_))));
}

#[test]
fn complex_values_survive_a_json_round_trip() {
    let template = Template::from_yaml(
        r#"
keywords:
  - name: shift
    type: complex
    docstring: A complex level shift.
    default: "0.5 - 2j"
  - name: shifts
    type: List[complex]
    docstring: Several shifts.
    default: ["1+2j", "3j"]
"#,
    )
    .unwrap();
    let result = validate(&input(serde_json::json!({})), &template).unwrap();
    assert_eq!(
        result.get_at(&Address::of(["shift"])),
        Some(&Value::Complex(Complex64::new(0.5, -2.0)))
    );

    let text = serde_json::to_string(&result).unwrap();
    assert!(text.contains("__complex__"));
    let back: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(back, result);
}

#[test]
fn validation_is_idempotent_on_its_own_output() {
    let template = template();
    let first = validate(&input(serde_json::json!({"title": "t"})), &template).unwrap();
    let second = validate(&first, &template).unwrap();
    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn fixed_values_always_match_their_declared_type(n in any::<i64>(), x in any::<f64>()) {
        use tessella_validate::{type_fix, type_matches, ScalarType, TypeName};

        let t = TypeName::Scalar(ScalarType::Float);
        let fixed = type_fix(&Value::Int(n), t).unwrap();
        prop_assert!(type_matches(&fixed, t));

        if x.is_finite() {
            let t = TypeName::Scalar(ScalarType::Int);
            // Stay inside i64 range so truncation is well-defined.
            let clamped = x.clamp(-1e18, 1e18);
            let fixed = type_fix(&Value::Float(clamped), t).unwrap();
            prop_assert!(type_matches(&fixed, t));
        }
    }

    #[test]
    fn complex_strings_round_trip_through_the_retry(
        re in -1e6f64..1e6, im in -1e6f64..1e6,
    ) {
        use tessella_validate::{retry_complex, ScalarType, TypeName};

        let text = if im < 0.0 {
            format!("{re:?}-{:?}j", -im)
        } else {
            format!("{re:?}+{im:?}j")
        };
        let t = TypeName::Scalar(ScalarType::Complex);
        let fixed = retry_complex(&Value::Str(text), t);
        prop_assert_eq!(fixed, Some(Value::Complex(Complex64::new(re, im))));
    }
}
