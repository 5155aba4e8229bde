//! The validation pipeline.
//!
//! Phases run in a fixed order; every diagnostic a phase can produce is
//! collected before the phase reports, but a failing phase stops the
//! pipeline. Garbage from a failed merge is not worth defaulting, and a
//! malformed template is not worth merging against.

use tracing::debug;

use tessella_core::{ErrorReport, Phase, Value};

use crate::check::check_template;
use crate::defaults::fix_defaults;
use crate::merge::merge_ours;
use crate::predicates::check_predicates;
use crate::template::Template;
use crate::views::{view_by_default, view_by_predicates, view_by_type};

/// Validate user input against a template.
///
/// Runs template checking, merging, default resolution and predicate
/// checking in sequence, returning the fully defaulted and type-checked
/// result tree, or the first failing phase's aggregated report.
pub fn validate(input: &Value, template: &Template) -> Result<Value, ErrorReport> {
    let ordered = check_template(template)?;
    debug!("template checked and reordered");

    let defaults = view_by_default(&ordered);
    let types = view_by_type(&ordered)
        .map_err(|diagnostics| ErrorReport::new(Phase::CheckingTemplate, diagnostics))?;
    let predicates = view_by_predicates(&ordered);

    let (merged, diagnostics) = merge_ours(&defaults, input);
    if !diagnostics.is_empty() {
        return Err(ErrorReport::new(Phase::Merging, diagnostics));
    }
    debug!("merged user input over template defaults");

    let (fixed, diagnostics) = fix_defaults(&merged, &types);
    if !diagnostics.is_empty() {
        return Err(ErrorReport::new(Phase::FixingDefaults, diagnostics));
    }
    debug!("defaults resolved and types fixed");

    let diagnostics = check_predicates(&fixed, &predicates);
    if !diagnostics.is_empty() {
        return Err(ErrorReport::new(Phase::CheckingPredicates, diagnostics));
    }
    debug!("all predicates satisfied");

    Ok(fixed)
}
