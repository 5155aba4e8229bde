//! Predicate checking over the fully defaulted tree.
//!
//! A predicate is written against the placeholder `value`, standing for
//! the keyword's own final value. Before evaluation the placeholder is
//! substituted with the keyword's full address in reference syntax, so
//! `0 <= value <= 40` on `scf.damping` runs as
//! `0 <= user['scf']['damping'] <= 40` against the whole tree — which
//! also lets predicates read other keywords directly.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use tessella_core::{Address, Diagnostic, DiagnosticKind, Value};
use tessella_expr::ExprError;

use crate::views::{SectionView, View};

/// The placeholder is substituted only as a whole word, so identifiers
/// like `values` or quoted text containing `value` survive.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bvalue\b").expect("pattern is well-formed"))
}

/// Evaluate every declared predicate against the fixed tree.
///
/// Predicates within one keyword run in declaration order; failures
/// accumulate across keywords and across predicates alike.
pub fn check_predicates(
    fixed: &Value,
    predicates: &SectionView<Option<Vec<String>>>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_node(fixed, predicates, &Address::root(), fixed, &mut diagnostics);
    diagnostics
}

fn check_node(
    node: &Value,
    predicates: &SectionView<Option<Vec<String>>>,
    address: &Address,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(map) = node.as_section() else {
        return;
    };
    for (key, value) in map {
        let at = address.join(key);
        match predicates.get(key) {
            Some(View::Leaf(Some(list))) => {
                for predicate in list {
                    check_one(predicate, &at, root, diagnostics);
                }
            }
            Some(View::Branch(sub)) => check_node(value, sub, &at, root, diagnostics),
            _ => {}
        }
    }
}

fn check_one(
    predicate: &str,
    address: &Address,
    root: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let where_ = address.to_string();
    let closure = placeholder_pattern().replace_all(predicate, regex::NoExpand(&where_));
    trace!(address = %address, predicate, "checking predicate");

    let kind = match tessella_expr::run(&closure, root) {
        Ok(result) => {
            if result.is_truthy() {
                return;
            }
            DiagnosticKind::PredicateNotSatisfied(predicate.to_string())
        }
        Err(ExprError::Reference(key)) => DiagnosticKind::ExpressionReference {
            key,
            closure: predicate.to_string(),
        },
        Err(ExprError::Syntax(detail)) => DiagnosticKind::ExpressionSyntax {
            detail,
            closure: predicate.to_string(),
        },
        Err(ExprError::Type(detail)) => DiagnosticKind::ExpressionType {
            detail,
            closure: predicate.to_string(),
        },
    };
    diagnostics.push(Diagnostic::new(address.clone(), kind));
}
