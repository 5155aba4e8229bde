//! # The Input Value Tree
//!
//! `Value` is the tagged union every engine pass traverses: the raw parse
//! result from a host lexer, the merged tree, and the final validated
//! representation are all `Value` trees. The variant is decided once, when
//! the tree is built, and matched exhaustively everywhere — no runtime
//! "is this a dict" probing inside the engines.
//!
//! Sections preserve insertion order (`IndexMap`): the template checker
//! reorders keywords so that computed defaults come after the keywords
//! they reference, and the merge engine must not destroy that order.
//!
//! JSON/YAML interop: `Value` implements `Serialize`/`Deserialize`
//! directly. Complex numbers are tagged as `{"__complex__": [re, im]}` on
//! the wire, because neither JSON nor YAML has a complex literal.

use std::fmt;

use indexmap::IndexMap;
use num_complex::Complex64;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Key used to tag complex numbers in JSON/YAML documents.
pub const COMPLEX_TAG: &str = "__complex__";

/// A node in an input, merged, or validated tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Placeholder for a required keyword with no value. Only ever present
    /// in trees that already produced a missing-required diagnostic.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
    Str(String),
    List(Vec<Value>),
    /// Interior node grouping keywords and sub-sections.
    Section(IndexMap<String, Value>),
}

impl Value {
    /// Runtime type name, matching the names templates declare.
    ///
    /// Lists report their element types, e.g. `List[int, str]` for a
    /// heterogeneous list, so mismatch diagnostics show what was found.
    pub fn display_type(&self) -> String {
        match self {
            Value::Null => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Complex(_) => "complex".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::display_type).collect();
                format!("List[{}]", inner.join(", "))
            }
            Value::Section(_) => "dict".to_string(),
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Value::Section(_))
    }

    pub fn as_section(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Section(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_section_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Section(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric view for `Int` and `Float` (not `Bool`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Truthiness, with the semantics expression evaluation expects:
    /// zero, empty, and `Null` are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Complex(z) => z.re != 0.0 || z.im != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Section(map) => !map.is_empty(),
        }
    }

    /// Borrow the node at `address`, or `None` if the path does not exist
    /// or crosses a non-section node.
    pub fn get_at(&self, address: &Address) -> Option<&Value> {
        let mut current = self;
        for key in address.segments() {
            current = current.as_section()?.get(key)?;
        }
        Some(current)
    }

    /// Replace the node at `address`. Returns `false` when the path does
    /// not exist; no intermediate sections are created.
    pub fn set_at(&mut self, address: &Address, value: Value) -> bool {
        let Some((leaf, parents)) = address.segments().split_last() else {
            *self = value;
            return true;
        };
        let mut current = self;
        for key in parents {
            current = match current.as_section_mut().and_then(|map| map.get_mut(key)) {
                Some(next) => next,
                None => return false,
            };
        }
        match current.as_section_mut() {
            Some(map) if map.contains_key(leaf) => {
                map.insert(leaf.to_string(), value);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Complex(z) => {
                if z.im < 0.0 {
                    write!(f, "({:?}{:?}j)", z.re, z.im)
                } else {
                    write!(f, "({:?}+{:?}j)", z.re, z.im)
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Section(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Complex64> for Value {
    fn from(z: Complex64) -> Self {
        Value::Complex(z)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Complex(z) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(COMPLEX_TAG, &[z.re, z.im])?;
                map.end()
            }
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Section(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, list, or mapping")
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        // No lossy demotion to float for oversized integers.
        i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| E::custom(format_args!("integer {u} does not fit a signed 64-bit value")))
    }

    fn visit_f64<E>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Str(s.to_string()))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E> {
        Ok(Value::Str(s))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut entries: IndexMap<String, Value> = IndexMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            entries.insert(key, value);
        }
        if let Some(z) = untag_complex(&entries) {
            return Ok(Value::Complex(z));
        }
        Ok(Value::Section(entries))
    }
}

/// Recognize the `{"__complex__": [re, im]}` wire form.
fn untag_complex(entries: &IndexMap<String, Value>) -> Option<Complex64> {
    if entries.len() != 1 {
        return None;
    }
    let Value::List(parts) = entries.get(COMPLEX_TAG)? else {
        return None;
    };
    match parts.as_slice() {
        [re, im] => Some(Complex64::new(re.as_f64()?, im.as_f64()?)),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
