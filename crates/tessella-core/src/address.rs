//! # Tree Addresses
//!
//! An `Address` is the ordered sequence of keys locating a node in a value
//! tree, starting from the root. Diagnostics carry addresses so that a
//! multi-line report can point at the exact offending keyword, and the
//! same rendering (`user['section']['keyword']`) doubles as the indexing
//! syntax accepted by the expression language.

use std::fmt;

/// Path of keys from the root of a value tree to one of its nodes.
///
/// The empty address denotes the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Vec<String>);

impl Address {
    /// The root address (no segments).
    pub fn root() -> Self {
        Address(Vec::new())
    }

    /// Build an address from an iterable of key segments.
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Address(segments.into_iter().map(Into::into).collect())
    }

    /// Returns a new address with `key` appended.
    pub fn join(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Address(segments)
    }

    /// The key segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The final segment, i.e. the keyword name, if any.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// True for the root address.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    /// Renders as the indexing expression rooted at the reserved `user`
    /// binding, e.g. `user['scf']['max_num_iterations']`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user")?;
        for segment in &self.0 {
            write!(f, "['{segment}']")?;
        }
        Ok(())
    }
}

impl From<Vec<String>> for Address {
    fn from(segments: Vec<String>) -> Self {
        Address(segments)
    }
}

impl FromIterator<String> for Address {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Address(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_bare_binding() {
        assert_eq!(Address::root().to_string(), "user");
    }

    #[test]
    fn nested_address_renders_as_indexing_chain() {
        let addr = Address::of(["scf", "max_num_iterations"]);
        assert_eq!(addr.to_string(), "user['scf']['max_num_iterations']");
    }

    #[test]
    fn join_appends_a_segment() {
        let addr = Address::root().join("scf").join("energy");
        assert_eq!(addr.segments(), ["scf", "energy"]);
        assert_eq!(addr.last(), Some("energy"));
    }
}
