//! # tessella-validate — Template Validation Engine
//!
//! Validates a nested keyword/section input tree against a declarative
//! template: unknown keys and missing required keywords are rejected,
//! defaults are filled in — including computed defaults that reference
//! other keywords — values are coerced to their declared types, and
//! per-keyword predicates are checked.
//!
//! The entry point is [`validate`]:
//!
//! ```
//! use tessella_core::Value;
//! use tessella_validate::{validate, Template};
//!
//! let template = Template::from_yaml(r#"
//! sections:
//!   - name: scf
//!     docstring: SCF options.
//!     keywords:
//!       - name: max_num_iterations
//!         type: int
//!         default: 20
//!         docstring: Iteration cap.
//!       - name: another_number
//!         type: int
//!         default: "user['scf']['max_num_iterations'] / 10"
//!         docstring: Computed from the cap.
//! "#).unwrap();
//!
//! let input: Value = serde_json::from_str("{}").unwrap();
//! let result = validate(&input, &template).unwrap();
//! assert_eq!(
//!     result.get_at(&tessella_core::Address::of(["scf", "another_number"])),
//!     Some(&Value::Int(2)),
//! );
//! ```
//!
//! Each pipeline phase aggregates every diagnostic it finds before
//! failing; nothing in this crate stops at the first broken keyword.

pub mod check;
pub mod defaults;
pub mod merge;
pub mod predicates;
pub mod template;
pub mod types;
pub mod validate;
pub mod views;

pub use check::check_template;
pub use defaults::fix_defaults;
pub use merge::merge_ours;
pub use predicates::check_predicates;
pub use template::{Keyword, Section, Template, TemplateReadError};
pub use types::{
    parse_complex, retry_complex, type_fix, type_matches, CoercionError, ScalarType, TypeName,
    UnknownType, FALSEY, TRUTHY,
};
pub use validate::validate;
pub use views::{
    view_by_default, view_by_docstring, view_by_predicates, view_by_type, SectionView, View,
};
