//! Default resolution and type fixation.
//!
//! Walks the merged tree in template order, keeping a mutable start
//! tree that begins as a copy of the input. Every successfully resolved
//! keyword is written back into the start tree at its address before
//! the next keyword is visited, so a default expression always sees the
//! *resolved* values of the keywords it references, never their raw
//! expression strings. The checker's per-section reordering guarantees
//! sibling dependencies are visited in the right order.

use tracing::trace;

use tessella_core::{Address, Diagnostic, DiagnosticKind, Value};
use tessella_expr::{ExprError, ROOT_BINDING};

use crate::types::{retry_complex, type_fix, type_matches, TypeName};
use crate::views::{SectionView, View};

/// Resolve defaults and fix types over a merged tree.
///
/// Failing keywords are reported and left null; the walk never stops at
/// the first error.
pub fn fix_defaults(
    merged: &Value,
    types: &SectionView<TypeName>,
) -> (Value, Vec<Diagnostic>) {
    let mut start = merged.clone();
    let mut diagnostics = Vec::new();
    fix_node(merged, types, &Address::root(), &mut start, &mut diagnostics);
    (start, diagnostics)
}

fn fix_node(
    node: &Value,
    types: &SectionView<TypeName>,
    address: &Address,
    start: &mut Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(map) = node.as_section() else {
        return;
    };
    for (key, value) in map {
        let at = address.join(key);
        match types.get(key) {
            Some(View::Leaf(declared)) => {
                let resolved = fix_keyword(value, *declared, &at, start, diagnostics);
                start.set_at(&at, resolved);
            }
            Some(View::Branch(sub)) => fix_node(value, sub, &at, start, diagnostics),
            // Merging walks the same template views, so every key here
            // has a type entry; an absent one means the caller mixed
            // views from different templates.
            None => {}
        }
    }
}

fn fix_keyword(
    value: &Value,
    declared: TypeName,
    address: &Address,
    start: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) -> Value {
    if type_matches(value, declared) {
        match type_fix(value, declared) {
            Ok(fixed) => return fixed,
            Err(err) => {
                diagnostics.push(Diagnostic::new(
                    address.clone(),
                    DiagnosticKind::TypeMismatch {
                        actual: err.actual,
                        declared: declared.to_string(),
                    },
                ));
                return Value::Null;
            }
        }
    }

    if let Value::Str(text) = value {
        if text.contains(ROOT_BINDING) {
            trace!(address = %address, closure = %text, "resolving default expression");
            return run_default(text, declared, address, start, diagnostics);
        }
    }

    if let Some(fixed) = retry_complex(value, declared) {
        return fixed;
    }

    diagnostics.push(Diagnostic::new(
        address.clone(),
        DiagnosticKind::TypeMismatch {
            actual: value.display_type(),
            declared: declared.to_string(),
        },
    ));
    Value::Null
}

/// Evaluate a default expression against the start tree and coerce the
/// result. Every failure mode becomes one categorized diagnostic
/// quoting the closure text.
fn run_default(
    closure: &str,
    declared: TypeName,
    address: &Address,
    start: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) -> Value {
    let kind = match tessella_expr::run(closure, start) {
        Ok(result) => match type_fix(&result, declared) {
            Ok(fixed) => return fixed,
            Err(err) => DiagnosticKind::ExpressionType {
                detail: err.to_string(),
                closure: closure.to_string(),
            },
        },
        Err(ExprError::Reference(key)) => DiagnosticKind::ExpressionReference {
            key,
            closure: closure.to_string(),
        },
        Err(ExprError::Syntax(detail)) => DiagnosticKind::ExpressionSyntax {
            detail,
            closure: closure.to_string(),
        },
        Err(ExprError::Type(detail)) => DiagnosticKind::ExpressionType {
            detail,
            closure: closure.to_string(),
        },
    };
    diagnostics.push(Diagnostic::new(address.clone(), kind));
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check_template;
    use crate::merge::merge_ours;
    use crate::template::Template;
    use crate::views::{view_by_default, view_by_type};
    use num_complex::Complex64;
    use pretty_assertions::assert_eq;

    fn fixed_tree(template_yaml: &str, input: Value) -> (Value, Vec<Diagnostic>) {
        let template = Template::from_yaml(template_yaml).unwrap();
        let ordered = check_template(&template).unwrap();
        let (merged, errs) = merge_ours(&view_by_default(&ordered), &input);
        assert!(errs.is_empty(), "unexpected merge errors: {errs:?}");
        fix_defaults(&merged, &view_by_type(&ordered).unwrap())
    }

    const SCF: &str = r#"
sections:
  - name: scf
    docstring: SCF options.
    keywords:
      - name: another_number
        type: int
        docstring: Computed from the iteration cap.
        default: "user['scf']['max_num_iterations'] / 10"
      - name: max_num_iterations
        type: int
        default: 20
        docstring: Iteration cap.
"#;

    #[test]
    fn cross_referenced_default_sees_the_resolved_sibling() {
        let (fixed, diagnostics) = fixed_tree(SCF, Value::Section(Default::default()));
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(
            fixed.get_at(&Address::of(["scf", "max_num_iterations"])),
            Some(&Value::Int(20))
        );
        assert_eq!(
            fixed.get_at(&Address::of(["scf", "another_number"])),
            Some(&Value::Int(2))
        );
    }

    #[test]
    fn user_override_feeds_the_computed_default() {
        let input: Value = serde_json::from_value(serde_json::json!({
            "scf": {"max_num_iterations": 40}
        }))
        .unwrap();
        let (fixed, diagnostics) = fixed_tree(SCF, input);
        assert!(diagnostics.is_empty());
        assert_eq!(
            fixed.get_at(&Address::of(["scf", "another_number"])),
            Some(&Value::Int(4))
        );
    }

    #[test]
    fn reference_to_a_nonexistent_keyword_is_reported_not_fatal() {
        let yaml = r#"
sections:
  - name: scf
    docstring: SCF options.
    keywords:
      - name: another_number
        type: int
        docstring: References a keyword that does not exist.
        default: "user['scf']['min_num_iterations'] / 10"
      - name: max_num_iterations
        type: int
        default: 20
        docstring: Iteration cap.
"#;
        let (fixed, diagnostics) = fixed_tree(yaml, Value::Section(Default::default()));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::ExpressionReference {
                key: "min_num_iterations".into(),
                closure: "user['scf']['min_num_iterations'] / 10".into(),
            }
        );
        assert_eq!(
            fixed.get_at(&Address::of(["scf", "another_number"])),
            Some(&Value::Null)
        );
    }

    #[test]
    fn type_mismatch_reports_actual_and_declared() {
        let yaml = r#"
keywords:
  - name: count
    type: int
    docstring: An integer.
"#;
        let input: Value =
            serde_json::from_value(serde_json::json!({"count": [1, 2]})).unwrap();
        let (fixed, diagnostics) = fixed_tree(yaml, input);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::TypeMismatch {
                actual: "List[int, int]".into(),
                declared: "int".into(),
            }
        );
        assert_eq!(fixed.get_at(&Address::of(["count"])), Some(&Value::Null));
    }

    #[test]
    fn string_shaped_complex_values_are_retried() {
        let yaml = r#"
keywords:
  - name: shift
    type: complex
    docstring: A complex shift.
"#;
        let input: Value =
            serde_json::from_value(serde_json::json!({"shift": "0.5 - 2j"})).unwrap();
        let (fixed, diagnostics) = fixed_tree(yaml, input);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(
            fixed.get_at(&Address::of(["shift"])),
            Some(&Value::Complex(Complex64::new(0.5, -2.0)))
        );
    }

    #[test]
    fn every_broken_default_is_reported_in_one_run() {
        let yaml = r#"
keywords:
  - name: bad_syntax
    type: int
    docstring: Unparseable default.
    default: "user['a'] +"
  - name: bad_type
    type: int
    docstring: Wrong shape.
    default: off
"#;
        let (_, diagnostics) = fixed_tree(yaml, Value::Section(Default::default()));
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics[0].kind,
            DiagnosticKind::ExpressionSyntax { .. }
        ));
        assert!(matches!(
            diagnostics[1].kind,
            DiagnosticKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn matching_values_are_coerced_in_place() {
        let yaml = r#"
keywords:
  - name: methods
    type: List[str]
    docstring: Method names.
    default: [diis]
"#;
        let (fixed, diagnostics) = fixed_tree(yaml, Value::Section(Default::default()));
        assert!(diagnostics.is_empty());
        assert_eq!(
            fixed.get_at(&Address::of(["methods"])),
            Some(&Value::List(vec![Value::Str("diis".into())]))
        );
    }
}
