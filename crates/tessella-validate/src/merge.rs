//! Merging user input with template defaults ("ours" strategy).
//!
//! The default view of the template is the authoritative shape. User
//! input wins wherever present; defaults fill the gaps; unknown keys
//! and missing required keywords are diagnostics, never silently
//! dropped. A missing required keyword leaves a null hole so the walk
//! can keep going and report every problem in one pass.

use tessella_core::{Address, Diagnostic, DiagnosticKind, KeyKind, Value};

use crate::views::{SectionView, View};

/// Merge user input over the template's default view.
///
/// The returned tree is complete (every declared keyword present) but
/// not yet validated: values are verbatim user input or raw defaults,
/// including unresolved default expressions.
pub fn merge_ours(theirs: &SectionView<Option<Value>>, ours: &Value) -> (Value, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let merged = merge_node(theirs, ours, &Address::root(), &mut diagnostics);
    (merged, diagnostics)
}

fn merge_node(
    theirs: &SectionView<Option<Value>>,
    ours: &Value,
    address: &Address,
    diagnostics: &mut Vec<Diagnostic>,
) -> Value {
    let ours_map = match ours.as_section() {
        Some(map) => Some(map),
        // A scalar where a section is expected: report and carry on
        // against an empty section so nested requirements still surface.
        None => {
            if !address.is_root() && !matches!(ours, Value::Null) {
                diagnostics.push(Diagnostic::new(
                    address.clone(),
                    DiagnosticKind::TypeMismatch {
                        actual: ours.display_type(),
                        declared: "dict".to_string(),
                    },
                ));
            }
            None
        }
    };

    if let Some(map) = ours_map {
        for (key, value) in map {
            if !theirs.contains_key(key) {
                let kind = if value.is_section() {
                    KeyKind::Section
                } else {
                    KeyKind::Keyword
                };
                diagnostics.push(Diagnostic::new(
                    address.join(key),
                    DiagnosticKind::UnexpectedKey {
                        kind,
                        name: key.clone(),
                    },
                ));
            }
        }
    }

    let mut outgoing = indexmap::IndexMap::new();
    for (key, view) in theirs {
        let at = address.join(key);
        let supplied = ours_map.and_then(|map| map.get(key));
        let slot = match (view, supplied) {
            (View::Leaf(_), Some(value)) => value.clone(),
            (View::Leaf(Some(default)), None) => default.clone(),
            (View::Leaf(None), None) => {
                diagnostics.push(Diagnostic::new(
                    at,
                    DiagnosticKind::MissingRequired(key.clone()),
                ));
                Value::Null
            }
            (View::Branch(sub), supplied) => {
                merge_node(sub, supplied.unwrap_or(&Value::Null), &at, diagnostics)
            }
        };
        outgoing.insert(key.clone(), slot);
    }
    Value::Section(outgoing)
}
