//! The declarative template model.
//!
//! A template is a tree of sections and keywords, usually authored in
//! YAML:
//!
//! ```yaml
//! keywords:
//!   - name: title
//!     type: str
//!     docstring: Title of the calculation.
//! sections:
//!   - name: scf
//!     docstring: Self-consistent field options.
//!     keywords:
//!       - name: max_num_iterations
//!         type: int
//!         default: 20
//!         docstring: Maximum number of iterations.
//! ```
//!
//! Deserialization is deliberately permissive: `type` and `docstring`
//! are optional here and `sections` may appear under a keyword, so the
//! checker can report every malformation instead of dying on the first
//! parse error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessella_core::Value;

/// The root of a template document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<Keyword>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

/// A named interior node grouping keywords and sub-sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<Keyword>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

/// A template leaf describing one configurable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    /// Declared type string; must name one of the allowed types.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kw_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    /// A literal default, or a string expression over the result tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicates: Option<Vec<String>>,
    /// Sections are not allowed under keywords; this slot only exists so
    /// the checker can flag documents that try.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<serde_json::Value>,
}

/// A template document that could not be deserialized at all.
#[derive(Debug, Error)]
pub enum TemplateReadError {
    #[error("malformed YAML template: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed JSON template: {0}")]
    Json(#[from] serde_json::Error),
}

impl Template {
    /// Deserialize a template from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, TemplateReadError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Deserialize a template from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TemplateReadError> {
        Ok(serde_json::from_str(text)?)
    }
}
