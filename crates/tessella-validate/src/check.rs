//! Template well-formedness checking.
//!
//! Every violation in the whole tree is collected before reporting, so
//! one run surfaces every problem. On success the checker returns a
//! reordered clone of the template in which keywords whose defaults
//! depend on siblings come after the keywords they depend on; the
//! default-resolution engine relies on that order.

use std::collections::HashMap;
use std::sync::OnceLock;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;

use tessella_core::{Address, Diagnostic, DiagnosticKind, ErrorReport, Phase, Value};
use tessella_expr::ROOT_BINDING;

use crate::template::{Keyword, Section, Template};
use crate::types::TypeName;

/// The indexing pattern a default expression uses to reference another
/// keyword, e.g. the two captures `scf` and `max_num_iterations` in
/// `user['scf']['max_num_iterations'] / 10`.
///
/// This is a textual heuristic: references spelled through variables or
/// computed keys are invisible to it, and bracket patterns inside string
/// literals are false positives. It exactly determines which templates
/// the cycle check accepts, so it stays a plain scan.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\[['"](.*?)['"]\]"#).expect("pattern is well-formed"))
}

/// Check a template for well-formedness and cyclic defaults.
///
/// Returns a clone of the template with keywords reordered per section
/// so that defaulting dependencies resolve before their dependents.
pub fn check_template(template: &Template) -> Result<Template, ErrorReport> {
    let mut diagnostics = Vec::new();
    check_node(
        &template.keywords,
        &template.sections,
        &Address::root(),
        &mut diagnostics,
    );
    diagnostics.extend(check_cyclic_defaults(template));

    if !diagnostics.is_empty() {
        return Err(ErrorReport::new(Phase::CheckingTemplate, diagnostics));
    }

    let mut ordered = template.clone();
    reorder_node(&mut ordered.keywords, &mut ordered.sections);
    Ok(ordered)
}

fn check_node(
    keywords: &[Keyword],
    sections: &[Section],
    address: &Address,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for kw in keywords {
        let at = address.join(&kw.name);
        if kw.sections.is_some() {
            diagnostics.push(Diagnostic::new(at.clone(), DiagnosticKind::SectionUnderKeyword));
        }
        if untyped(kw) {
            diagnostics.push(Diagnostic::new(at.clone(), DiagnosticKind::InvalidType));
        }
        if kw.docstring.as_deref().unwrap_or("").trim().is_empty() {
            diagnostics.push(Diagnostic::new(at, DiagnosticKind::UndocumentedKeyword));
        }
    }
    for section in sections {
        let at = address.join(&section.name);
        if section.docstring.as_deref().unwrap_or("").trim().is_empty() {
            diagnostics.push(Diagnostic::new(at.clone(), DiagnosticKind::UndocumentedSection));
        }
        check_node(&section.keywords, &section.sections, &at, diagnostics);
    }
}

fn untyped(kw: &Keyword) -> bool {
    !matches!(kw.kw_type.as_deref().map(str::parse::<TypeName>), Some(Ok(_)))
}

/// A defaulting dependency: the keyword at `from` references the
/// keyword at `to` in its default expression. Both are root-relative
/// key paths.
type Dependency = (Vec<String>, Vec<String>);

fn check_cyclic_defaults(template: &Template) -> Vec<Diagnostic> {
    let mut dependencies = Vec::new();
    collect_dependencies(&template.keywords, &template.sections, &[], &mut dependencies);

    let mut graph: DiGraph<Vec<String>, ()> = DiGraph::new();
    let mut nodes: HashMap<Vec<String>, NodeIndex> = HashMap::new();
    let mut intern = |graph: &mut DiGraph<Vec<String>, ()>, path: &Vec<String>| {
        *nodes
            .entry(path.clone())
            .or_insert_with(|| graph.add_node(path.clone()))
    };
    for (from, to) in &dependencies {
        let a = intern(&mut graph, from);
        let b = intern(&mut graph, to);
        graph.add_edge(a, b, ());
    }

    let mut diagnostics = Vec::new();
    for component in tarjan_scc(&graph) {
        let cyclic =
            component.len() > 1 || graph.find_edge(component[0], component[0]).is_some();
        if !cyclic {
            continue;
        }
        for (i, &node) in component.iter().enumerate() {
            let next = component[(i + 1) % component.len()];
            let member = Address::of(graph[node].iter().cloned());
            let depends_on = Address::of(graph[next].iter().cloned());
            diagnostics.push(Diagnostic::new(
                member,
                DiagnosticKind::CyclicDefault(depends_on.to_string()),
            ));
        }
    }
    diagnostics
}

/// Collect defaulting dependencies below one node.
///
/// The regex captures of a referencing default are read as one key path
/// into the tree, matching the textual heuristic of
/// [`reference_pattern`].
fn collect_dependencies(
    keywords: &[Keyword],
    sections: &[Section],
    parents: &[String],
    out: &mut Vec<Dependency>,
) {
    for kw in keywords {
        if let Some(target) = keyword_dependency(kw) {
            let mut from = parents.to_vec();
            from.push(kw.name.clone());
            out.push((from, target));
        }
    }
    for section in sections {
        let mut parents = parents.to_vec();
        parents.push(section.name.clone());
        collect_dependencies(&section.keywords, &section.sections, &parents, out);
    }
}

fn keyword_dependency(kw: &Keyword) -> Option<Vec<String>> {
    let Some(Value::Str(default)) = &kw.default else {
        return None;
    };
    if !default.contains(ROOT_BINDING) {
        return None;
    }
    let target: Vec<String> = reference_pattern()
        .captures_iter(default)
        .map(|c| c[1].to_string())
        .collect();
    (!target.is_empty()).then_some(target)
}

/// Reorder keywords within each section so dependencies come first.
///
/// Only keywords participating in a sibling dependency move; they are
/// appended at the end in topological order, everything else keeps
/// document order. Cross-section references need no reordering because
/// the resolution engine walks whole sections in template order.
fn reorder_node(keywords: &mut Vec<Keyword>, sections: &mut [Section]) {
    let names: Vec<String> = keywords.iter().map(|kw| kw.name.clone()).collect();

    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
    let mut intern = |graph: &mut DiGraph<String, ()>, name: &str| {
        *nodes
            .entry(name.to_string())
            .or_insert_with(|| graph.add_node(name.to_string()))
    };
    for kw in keywords.iter() {
        if let Some(target) = keyword_dependency(kw) {
            // Only the last path element can name a sibling.
            let Some(dep) = target.last() else { continue };
            if names.iter().any(|n| n == dep) && dep != &kw.name {
                let a = intern(&mut graph, dep);
                let b = intern(&mut graph, &kw.name);
                graph.add_edge(a, b, ());
            }
        }
    }

    // The checker has already rejected cycles; if one slipped through
    // anyway, leave the document order alone.
    if let Ok(order) = toposort(&graph, None) {
        let involved: Vec<String> = order.into_iter().map(|n| graph[n].clone()).collect();
        let mut moved: Vec<Keyword> = Vec::new();
        for name in &involved {
            if let Some(pos) = keywords.iter().position(|kw| &kw.name == name) {
                moved.push(keywords.remove(pos));
            }
        }
        keywords.extend(moved);
    }

    for section in sections.iter_mut() {
        reorder_node(&mut section.keywords, &mut section.sections);
    }
}
