//! The closed type registry.
//!
//! A template may only declare types from a fixed set: the five scalars
//! `bool`, `int`, `float`, `complex`, `str` and their homogeneous list
//! forms `List[T]`. Matching is exact on runtime type (an `int` value is
//! never accepted where `float` is declared); fixation applies the
//! constructor-style coercions described on [`type_fix`].

use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use thiserror::Error;

use tessella_core::Value;

/// String forms that coerce to `true` under the `bool` fixer.
///
/// These mirror the case-insensitive boolean spellings accepted by
/// keyword/section input grammars, so a host lexing `on` or `YES` gets
/// the same value the grammar would have produced.
pub const TRUTHY: [&str; 4] = ["TRUE", "ON", "YES", "Y"];

/// String forms that coerce to `false` under the `bool` fixer.
pub const FALSEY: [&str; 4] = ["FALSE", "OFF", "NO", "N"];

/// One of the five scalar types a keyword may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Complex,
    Str,
}

impl ScalarType {
    fn as_str(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Complex => "complex",
            ScalarType::Str => "str",
        }
    }
}

/// A declared keyword type: a scalar or a homogeneous list of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Scalar(ScalarType),
    List(ScalarType),
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Scalar(s) => write!(f, "{}", s.as_str()),
            TypeName::List(s) => write!(f, "List[{}]", s.as_str()),
        }
    }
}

/// A declared type string outside the allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not recognize declared type: {0}")]
pub struct UnknownType(pub String);

impl FromStr for TypeName {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let scalar = |name: &str| match name {
            "bool" => Some(ScalarType::Bool),
            "int" => Some(ScalarType::Int),
            "float" => Some(ScalarType::Float),
            "complex" => Some(ScalarType::Complex),
            "str" => Some(ScalarType::Str),
            _ => None,
        };
        if let Some(element) = s
            .strip_prefix("List[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(scalar)
        {
            return Ok(TypeName::List(element));
        }
        scalar(s)
            .map(TypeName::Scalar)
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

/// A coercion that cannot be performed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not coerce {actual} into {declared}")]
pub struct CoercionError {
    /// Runtime type of the rejected value.
    pub actual: String,
    /// The type the template declared.
    pub declared: TypeName,
}

/// Exact runtime-type match of a value against a declared type.
///
/// Scalars match only their own variant; lists match when the value is a
/// list and every element matches the declared element type. An empty
/// list matches any list type.
pub fn type_matches(value: &Value, declared: TypeName) -> bool {
    match declared {
        TypeName::Scalar(s) => scalar_matches(value, s),
        TypeName::List(s) => match value {
            Value::List(items) => items.iter().all(|item| scalar_matches(item, s)),
            _ => false,
        },
    }
}

fn scalar_matches(value: &Value, declared: ScalarType) -> bool {
    matches!(
        (value, declared),
        (Value::Bool(_), ScalarType::Bool)
            | (Value::Int(_), ScalarType::Int)
            | (Value::Float(_), ScalarType::Float)
            | (Value::Complex(_), ScalarType::Complex)
            | (Value::Str(_), ScalarType::Str)
    )
}

/// Coerce a value to its declared type.
///
/// The coercions follow constructor semantics:
///
/// - `bool`: booleans pass through; strings go through the
///   [`TRUTHY`]/[`FALSEY`] tables (case-insensitive), any other
///   non-empty string is `true`; numbers are `true` when non-zero.
/// - `int`: truncates floats, parses trimmed strings.
/// - `float`: widens bools and ints, parses trimmed strings.
/// - `complex`: widens any real number; parses strings after stripping
///   embedded whitespace (YAML has no complex literal, so `"1 + 2j"`
///   arrives as a string).
/// - `str`: renders the value.
/// - `List[T]`: requires a list, fixes every element to `T`.
pub fn type_fix(value: &Value, declared: TypeName) -> Result<Value, CoercionError> {
    let mismatch = || CoercionError {
        actual: value.display_type(),
        declared,
    };
    match declared {
        TypeName::Scalar(s) => fix_scalar(value, s).ok_or_else(mismatch),
        TypeName::List(s) => match value {
            Value::List(items) => {
                let fixed: Option<Vec<Value>> =
                    items.iter().map(|item| fix_scalar(item, s)).collect();
                fixed.map(Value::List).ok_or_else(mismatch)
            }
            _ => Err(mismatch()),
        },
    }
}

fn fix_scalar(value: &Value, declared: ScalarType) -> Option<Value> {
    match declared {
        ScalarType::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Int(i) => Some(Value::Bool(*i != 0)),
            Value::Float(x) => Some(Value::Bool(*x != 0.0)),
            Value::Str(s) => {
                let upper = s.trim().to_uppercase();
                if FALSEY.contains(&upper.as_str()) {
                    Some(Value::Bool(false))
                } else if TRUTHY.contains(&upper.as_str()) {
                    Some(Value::Bool(true))
                } else {
                    Some(Value::Bool(!s.is_empty()))
                }
            }
            _ => None,
        },
        ScalarType::Int => match value {
            Value::Bool(b) => Some(Value::Int(i64::from(*b))),
            Value::Int(i) => Some(Value::Int(*i)),
            Value::Float(x) => Some(Value::Int(x.trunc() as i64)),
            Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            _ => None,
        },
        ScalarType::Float => match value {
            Value::Bool(b) => Some(Value::Float(f64::from(u8::from(*b)))),
            Value::Int(i) => Some(Value::Float(*i as f64)),
            Value::Float(x) => Some(Value::Float(*x)),
            Value::Str(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        },
        ScalarType::Complex => match value {
            Value::Bool(b) => Some(Value::Complex(Complex64::new(f64::from(u8::from(*b)), 0.0))),
            Value::Int(i) => Some(Value::Complex(Complex64::new(*i as f64, 0.0))),
            Value::Float(x) => Some(Value::Complex(Complex64::new(*x, 0.0))),
            Value::Complex(z) => Some(Value::Complex(*z)),
            Value::Str(s) => parse_complex(s).map(Value::Complex),
            _ => None,
        },
        ScalarType::Str => match value {
            Value::Null | Value::Section(_) => None,
            // Capitalized, matching the textual form templates use.
            Value::Bool(b) => Some(Value::Str(if *b { "True" } else { "False" }.into())),
            other => Some(Value::Str(other.to_string())),
        },
    }
}

/// Parse a complex number from its textual form, e.g. `1+2j`, `-3.5j`,
/// `1e-3-2J` or a plain real like `4.2`. Embedded whitespace is
/// stripped first.
pub fn parse_complex(text: &str) -> Option<Complex64> {
    let s: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return None;
    }

    let (body, imaginary) = match s.strip_suffix(['j', 'J']) {
        Some(body) => (body, true),
        None => (s.as_str(), false),
    };

    if !imaginary {
        return body.parse::<f64>().ok().map(|re| Complex64::new(re, 0.0));
    }

    // Split `a+bj` / `a-bj` at a sign not opening the string and not part
    // of an exponent.
    let chars: Vec<char> = body.chars().collect();
    let mut split = None;
    for i in (1..chars.len()).rev() {
        if (chars[i] == '+' || chars[i] == '-')
            && chars[i - 1] != 'e'
            && chars[i - 1] != 'E'
        {
            split = Some(i);
            break;
        }
    }

    match split {
        Some(i) => {
            let re: f64 = chars[..i].iter().collect::<String>().parse().ok()?;
            let im: f64 = chars[i..].iter().collect::<String>().parse().ok()?;
            Some(Complex64::new(re, im))
        }
        None => body.parse::<f64>().ok().map(|im| Complex64::new(0.0, im)),
    }
}

/// Retry coercion of string-shaped complex values.
///
/// YAML parses `1+2j` as a string, so a value declared `complex` (or
/// `List[complex]`) that failed the exact match gets one more chance:
/// coerce it, and accept only if the coerced value round-trips through
/// [`type_matches`].
pub fn retry_complex(value: &Value, declared: TypeName) -> Option<Value> {
    if !matches!(
        declared,
        TypeName::Scalar(ScalarType::Complex) | TypeName::List(ScalarType::Complex)
    ) {
        return None;
    }
    let fixed = type_fix(value, declared).ok()?;
    type_matches(&fixed, declared).then_some(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_parse_and_render() {
        let t: TypeName = "List[complex]".parse().unwrap();
        assert_eq!(t, TypeName::List(ScalarType::Complex));
        assert_eq!(t.to_string(), "List[complex]");
        assert_eq!("int".parse::<TypeName>().unwrap().to_string(), "int");
        assert!("List[dict]".parse::<TypeName>().is_err());
        assert!("tuple".parse::<TypeName>().is_err());
    }

    #[test]
    fn matching_is_exact_not_promoting() {
        assert!(type_matches(&Value::Int(3), TypeName::Scalar(ScalarType::Int)));
        assert!(!type_matches(&Value::Int(3), TypeName::Scalar(ScalarType::Float)));
        assert!(!type_matches(&Value::Bool(true), TypeName::Scalar(ScalarType::Int)));
        assert!(!type_matches(
            &Value::Str("20".into()),
            TypeName::Scalar(ScalarType::Int)
        ));
    }

    #[test]
    fn list_matching_is_elementwise() {
        let homogeneous = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let mixed = Value::List(vec![Value::Int(1), Value::Str("two".into())]);
        assert!(type_matches(&homogeneous, TypeName::List(ScalarType::Int)));
        assert!(!type_matches(&mixed, TypeName::List(ScalarType::Int)));
        assert!(!type_matches(&Value::Int(1), TypeName::List(ScalarType::Int)));
        assert!(type_matches(&Value::List(vec![]), TypeName::List(ScalarType::Str)));
    }

    #[test]
    fn bool_fixer_honors_the_truthy_and_falsey_tables() {
        let t = TypeName::Scalar(ScalarType::Bool);
        assert_eq!(type_fix(&Value::Str("on".into()), t).unwrap(), Value::Bool(true));
        assert_eq!(type_fix(&Value::Str("No".into()), t).unwrap(), Value::Bool(false));
        assert_eq!(type_fix(&Value::Str("OFF".into()), t).unwrap(), Value::Bool(false));
        assert_eq!(type_fix(&Value::Str("whatever".into()), t).unwrap(), Value::Bool(true));
        assert_eq!(type_fix(&Value::Int(0), t).unwrap(), Value::Bool(false));
    }

    #[test]
    fn numeric_fixers_follow_constructor_semantics() {
        assert_eq!(
            type_fix(&Value::Float(3.7), TypeName::Scalar(ScalarType::Int)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            type_fix(&Value::Int(3), TypeName::Scalar(ScalarType::Float)).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            type_fix(&Value::Float(2.5), TypeName::Scalar(ScalarType::Complex)).unwrap(),
            Value::Complex(Complex64::new(2.5, 0.0))
        );
        assert!(type_fix(&Value::Str("abc".into()), TypeName::Scalar(ScalarType::Int)).is_err());
    }

    #[test]
    fn str_fixer_renders_values() {
        let t = TypeName::Scalar(ScalarType::Str);
        assert_eq!(type_fix(&Value::Bool(true), t).unwrap(), Value::Str("True".into()));
        assert_eq!(type_fix(&Value::Bool(false), t).unwrap(), Value::Str("False".into()));
        assert_eq!(type_fix(&Value::Float(2.0), t).unwrap(), Value::Str("2.0".into()));
        assert_eq!(type_fix(&Value::Int(20), t).unwrap(), Value::Str("20".into()));
    }

    #[test]
    fn complex_strings_parse_in_all_shapes() {
        assert_eq!(parse_complex("1+2j"), Some(Complex64::new(1.0, 2.0)));
        assert_eq!(parse_complex("1 - 2J"), Some(Complex64::new(1.0, -2.0)));
        assert_eq!(parse_complex("-3.5j"), Some(Complex64::new(0.0, -3.5)));
        assert_eq!(parse_complex("4.2"), Some(Complex64::new(4.2, 0.0)));
        assert_eq!(parse_complex("1e-3+2e+1j"), Some(Complex64::new(1e-3, 20.0)));
        assert_eq!(parse_complex("nonsense"), None);
        assert_eq!(parse_complex(""), None);
    }

    #[test]
    fn complex_retry_accepts_strings_and_lists_of_strings() {
        let t = TypeName::Scalar(ScalarType::Complex);
        let fixed = retry_complex(&Value::Str("0.0+0.0j".into()), t).unwrap();
        assert_eq!(fixed, Value::Complex(Complex64::new(0.0, 0.0)));

        let list = Value::List(vec![Value::Str("1+2j".into()), Value::Str("3j".into())]);
        let fixed = retry_complex(&list, TypeName::List(ScalarType::Complex)).unwrap();
        assert!(type_matches(&fixed, TypeName::List(ScalarType::Complex)));

        assert_eq!(retry_complex(&Value::Str("1+2j".into()), TypeName::Scalar(ScalarType::Int)), None);
        assert_eq!(retry_complex(&Value::Str("no".into()), t), None);
    }

    #[test]
    fn list_fixation_is_elementwise() {
        let list = Value::List(vec![Value::Int(1), Value::Float(2.5)]);
        let fixed = type_fix(&list, TypeName::List(ScalarType::Float)).unwrap();
        assert_eq!(fixed, Value::List(vec![Value::Float(1.0), Value::Float(2.5)]));
        assert!(type_fix(&Value::Int(1), TypeName::List(ScalarType::Int)).is_err());
    }
}
