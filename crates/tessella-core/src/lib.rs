//! # tessella-core — Foundational Types for tessella
//!
//! This crate is the leaf of the tessella workspace DAG. It defines the
//! data model every validation phase operates on:
//!
//! 1. **`Value`** — a tagged recursive union over the scalars the engine
//!    understands (`bool`, `int`, `float`, `complex`, `str`), homogeneous
//!    lists, nested sections, and the `Null` placeholder used for missing
//!    required keywords. Sections are insertion-ordered maps: the order
//!    keywords appear in a template is semantic (computed defaults must be
//!    resolved after the keywords they reference).
//!
//! 2. **`Address`** — a path of keys locating a node in a value tree,
//!    rendered in error messages as `user['section']['keyword']`.
//!
//! 3. **`Diagnostic` / `ErrorReport`** — validation problems are value
//!    objects collected into lists, never thrown individually during a
//!    tree walk. Only the per-phase aggregate becomes an error.
//!
//! `Value` serializes to JSON with complex numbers tagged as
//! `{"__complex__": [re, im]}`, since JSON (like YAML) has no native
//! complex literal. Deserialization reverses the tagging, so result trees
//! round-trip exactly.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tessella-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod error;
pub mod value;

pub use address::Address;
pub use error::{Diagnostic, DiagnosticKind, ErrorReport, KeyKind, Phase};
pub use value::Value;
