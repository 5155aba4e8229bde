//! # Diagnostics and Error Reports
//!
//! Validation never aborts a tree walk on the first problem. Each engine
//! pass records `Diagnostic` value objects — an address plus a categorized
//! message — and keeps going. A phase that produced any diagnostics raises
//! a single `ErrorReport` quoting every one of them; phases after a failed
//! phase do not run.

use std::fmt;

use thiserror::Error;

use crate::address::Address;

/// Whether an unexpected key held a nested mapping or a plain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Keyword,
    Section,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Keyword => f.write_str("keyword"),
            KeyKind::Section => f.write_str("section"),
        }
    }
}

/// The closed taxonomy of validation failures.
///
/// Expression failures come in three categories regardless of whether the
/// expression was a computed default or a predicate: a reference to a path
/// that does not exist, a syntax error, or an operand type error. All
/// three quote the offending closure text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    #[error("Sections cannot be nested under keywords.")]
    SectionUnderKeyword,

    #[error("Keywords must have a valid type.")]
    InvalidType,

    #[error("Keywords must have a non-empty docstring.")]
    UndocumentedKeyword,

    #[error("Sections must have a non-empty docstring.")]
    UndocumentedSection,

    #[error("Keyword depends cyclically on keyword {0}.")]
    CyclicDefault(String),

    #[error("Found unexpected {kind}: '{name}'.")]
    UnexpectedKey { kind: KeyKind, name: String },

    #[error("Keyword '{0}' is required but has no value.")]
    MissingRequired(String),

    #[error("Actual ({actual}) and declared ({declared}) types do not match.")]
    TypeMismatch { actual: String, declared: String },

    #[error("KeyError '{key}' in closure '{closure}'.")]
    ExpressionReference { key: String, closure: String },

    #[error("SyntaxError {detail} in closure '{closure}'.")]
    ExpressionSyntax { detail: String, closure: String },

    #[error("TypeError {detail} in closure '{closure}'.")]
    ExpressionType { detail: String, closure: String },

    #[error("Predicate '{0}' not satisfied.")]
    PredicateNotSatisfied(String),
}

/// One validation problem, located in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub address: Address,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(address: Address, kind: DiagnosticKind) -> Self {
        Diagnostic { address, kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- At {}:\n    {}", self.address, self.kind)
    }
}

/// The validation phase a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CheckingTemplate,
    Merging,
    FixingDefaults,
    CheckingPredicates,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::CheckingTemplate => f.write_str("checking the template"),
            Phase::Merging => f.write_str("merging"),
            Phase::FixingDefaults => f.write_str("fixing defaults"),
            Phase::CheckingPredicates => f.write_str("checking predicates"),
        }
    }
}

/// Aggregate of every diagnostic one phase produced.
///
/// Renders as a multi-line report:
///
/// ```text
/// Error(s) occurred when fixing defaults:
/// - At user['scf']['another_number']:
///     KeyError 'min_num_iterations' in closure 'user['scf']['min_num_iterations'] / 2'.
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    phase: Phase,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReport {
    pub fn new(phase: Phase, diagnostics: Vec<Diagnostic>) -> Self {
        ErrorReport { phase, diagnostics }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error(s) occurred when {}:", self.phase)?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_renders_phase_and_every_diagnostic() {
        let report = ErrorReport::new(
            Phase::FixingDefaults,
            vec![
                Diagnostic::new(
                    Address::of(["scf", "another_number"]),
                    DiagnosticKind::ExpressionReference {
                        key: "min_num_iterations".to_string(),
                        closure: "user['scf']['min_num_iterations'] / 2".to_string(),
                    },
                ),
                Diagnostic::new(
                    Address::of(["title"]),
                    DiagnosticKind::TypeMismatch {
                        actual: "int".to_string(),
                        declared: "str".to_string(),
                    },
                ),
            ],
        );
        let rendered = report.to_string();
        assert!(rendered.starts_with("Error(s) occurred when fixing defaults:"));
        assert!(rendered.contains("- At user['scf']['another_number']:"));
        assert!(rendered.contains("KeyError 'min_num_iterations'"));
        assert!(rendered.contains("- At user['title']:"));
        assert!(rendered.contains("Actual (int) and declared (str) types do not match."));
    }

    #[test]
    fn diagnostics_compare_by_value() {
        let a = Diagnostic::new(Address::of(["x"]), DiagnosticKind::InvalidType);
        let b = Diagnostic::new(Address::of(["x"]), DiagnosticKind::InvalidType);
        assert_eq!(a, b);
    }

    #[test]
    fn unexpected_key_message_distinguishes_kinds() {
        let kind = DiagnosticKind::UnexpectedKey {
            kind: KeyKind::Section,
            name: "scg".to_string(),
        };
        assert_eq!(kind.to_string(), "Found unexpected section: 'scg'.");
    }
}
