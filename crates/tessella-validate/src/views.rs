//! Attribute views over a template.
//!
//! A view keeps the nested shape of the template but holds exactly one
//! keyword attribute per leaf: the declared type, the default, the
//! docstring, or the predicate list. The engines all walk views instead
//! of the template itself.

use indexmap::IndexMap;

use tessella_core::{Address, Diagnostic, DiagnosticKind, Value};

use crate::template::{Keyword, Section, Template};
use crate::types::TypeName;

/// One node of a view: a keyword attribute or a nested section view.
#[derive(Debug, Clone, PartialEq)]
pub enum View<T> {
    Leaf(T),
    Branch(SectionView<T>),
}

/// The keyed children of one section, in template order.
pub type SectionView<T> = IndexMap<String, View<T>>;

/// Project the default of every keyword; keywords without a default map
/// to `None`. This view doubles as the authoritative shape for merging.
pub fn view_by_default(template: &Template) -> SectionView<Option<Value>> {
    build(&template.keywords, &template.sections, &mut |kw, _| {
        Some(kw.default.clone())
    })
}

/// Project the predicate list of every keyword; `None` where absent.
pub fn view_by_predicates(template: &Template) -> SectionView<Option<Vec<String>>> {
    build(&template.keywords, &template.sections, &mut |kw, _| {
        Some(kw.predicates.clone())
    })
}

/// Project the declared type of every keyword.
///
/// Every keyword must carry a valid type, so a missing or unknown type
/// is a diagnostic. After [`crate::check::check_template`] has accepted
/// the template this cannot fail.
pub fn view_by_type(template: &Template) -> Result<SectionView<TypeName>, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    let view = build(&template.keywords, &template.sections, &mut |kw, address| {
        match kw.kw_type.as_deref().map(str::parse::<TypeName>) {
            Some(Ok(t)) => Some(t),
            _ => {
                diagnostics.push(Diagnostic::new(address.clone(), DiagnosticKind::InvalidType));
                None
            }
        }
    });
    if diagnostics.is_empty() {
        Ok(view)
    } else {
        Err(diagnostics)
    }
}

/// Project the docstring of every keyword, trailing whitespace trimmed.
///
/// Hosts use this view to render help text. Empty and missing
/// docstrings are diagnostics, mirroring the checker.
pub fn view_by_docstring(template: &Template) -> Result<SectionView<String>, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    let view = build(&template.keywords, &template.sections, &mut |kw, address| {
        match kw.docstring.as_deref() {
            Some(doc) if !doc.trim().is_empty() => Some(doc.trim_end().to_string()),
            _ => {
                diagnostics.push(Diagnostic::new(
                    address.clone(),
                    DiagnosticKind::UndocumentedKeyword,
                ));
                None
            }
        }
    });
    if diagnostics.is_empty() {
        Ok(view)
    } else {
        Err(diagnostics)
    }
}

fn build<T>(
    keywords: &[Keyword],
    sections: &[Section],
    extract: &mut impl FnMut(&Keyword, &Address) -> Option<T>,
) -> SectionView<T> {
    build_at(keywords, sections, &Address::root(), extract)
}

fn build_at<T>(
    keywords: &[Keyword],
    sections: &[Section],
    address: &Address,
    extract: &mut impl FnMut(&Keyword, &Address) -> Option<T>,
) -> SectionView<T> {
    let mut view = SectionView::new();
    for kw in keywords {
        if let Some(leaf) = extract(kw, &address.join(&kw.name)) {
            view.insert(kw.name.clone(), View::Leaf(leaf));
        }
    }
    for section in sections {
        let sub = build_at(
            &section.keywords,
            &section.sections,
            &address.join(&section.name),
            extract,
        );
        view.insert(section.name.clone(), View::Branch(sub));
    }
    view
}
