//! # tessella-expr — Template Expression Language
//!
//! Computed defaults and keyword predicates in a template are small
//! expressions over the result tree, written against a single reserved
//! binding (`user`) that denotes the tree root:
//!
//! ```text
//! user['scf']['max_num_iterations'] / 10
//! 0 <= user['scf']['damping'] <= 40
//! len(user['geometry']) % 3 == 0
//! ```
//!
//! This crate deliberately does **not** embed a general-purpose
//! interpreter. Templates are data, often third-party data, and handing
//! them an arbitrary evaluator is an arbitrary-code-execution hazard.
//! Instead a closed expression AST is parsed and walked: literals,
//! indexing, arithmetic, chained comparisons, boolean connectives,
//! membership tests, and a `len` builtin. Nothing else parses.
//!
//! Failures are categorized so the validation engines can report them
//! precisely:
//!
//! - [`ExprError::Reference`] — indexing a key that does not exist, or an
//!   unbound name;
//! - [`ExprError::Syntax`] — the expression does not parse;
//! - [`ExprError::Type`] — an operand has the wrong type for an operator.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use thiserror::Error;

pub use ast::{BinaryOp, CmpOp, Expr, LogicalOp, UnaryOp};
pub use eval::evaluate;
pub use parser::parse;

/// The reserved name expressions use to address the result tree root.
pub const ROOT_BINDING: &str = "user";

/// Expression failure, categorized for diagnostic reporting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// A lookup referenced a key or name that does not exist.
    #[error("KeyError '{0}'")]
    Reference(String),

    /// The expression text does not parse.
    #[error("SyntaxError {0}")]
    Syntax(String),

    /// An operator was applied to operands of the wrong type.
    #[error("TypeError {0}")]
    Type(String),
}

/// Parse and evaluate `text` against `root` in one step.
///
/// Convenience for callers that do not keep the AST around; the engines
/// use it for both defaults and predicates.
pub fn run(text: &str, root: &tessella_core::Value) -> Result<tessella_core::Value, ExprError> {
    let expr = parse(text)?;
    evaluate(&expr, root)
}
