//! Tree-walking evaluator.
//!
//! Expressions are evaluated against a single bound value tree; the
//! reserved name `user` resolves to its root. Numeric operands promote
//! `bool -> int -> float -> complex` as needed; `/` is true division,
//! `//` floors, and `and`/`or` short-circuit returning the deciding
//! operand (so non-boolean predicates still work through truthiness).

use num_complex::Complex64;
use tessella_core::Value;

use crate::ast::{BinaryOp, CmpOp, Expr, LogicalOp, UnaryOp};
use crate::{ExprError, ROOT_BINDING};

/// Evaluate `expr` with `root` bound to the reserved `user` name.
pub fn evaluate(expr: &Expr, root: &Value) -> Result<Value, ExprError> {
    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Imag(f) => Ok(Value::Complex(Complex64::new(0.0, *f))),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::List(items) => {
            let values: Result<Vec<Value>, ExprError> =
                items.iter().map(|item| evaluate(item, root)).collect();
            Ok(Value::List(values?))
        }
        Expr::Name(name) => {
            if name == ROOT_BINDING {
                Ok(root.clone())
            } else {
                Err(ExprError::Reference(name.clone()))
            }
        }
        Expr::Index { base, key } => {
            let base = evaluate(base, root)?;
            let key = evaluate(key, root)?;
            index(&base, &key)
        }
        Expr::Call { func, args } => call(func, args, root),
        Expr::Unary { op, operand } => {
            let operand = evaluate(operand, root)?;
            unary(*op, operand)
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, root)?;
            let rhs = evaluate(rhs, root)?;
            binary(*op, lhs, rhs)
        }
        Expr::Logical { op, lhs, rhs } => {
            let lhs = evaluate(lhs, root)?;
            match op {
                LogicalOp::And if !lhs.is_truthy() => Ok(lhs),
                LogicalOp::Or if lhs.is_truthy() => Ok(lhs),
                _ => evaluate(rhs, root),
            }
        }
        Expr::Not(operand) => {
            let operand = evaluate(operand, root)?;
            Ok(Value::Bool(!operand.is_truthy()))
        }
        Expr::Compare { first, rest } => {
            let mut lhs = evaluate(first, root)?;
            for (op, rhs_expr) in rest {
                let rhs = evaluate(rhs_expr, root)?;
                if !compare(*op, &lhs, &rhs)? {
                    return Ok(Value::Bool(false));
                }
                lhs = rhs;
            }
            Ok(Value::Bool(true))
        }
    }
}

fn index(base: &Value, key: &Value) -> Result<Value, ExprError> {
    match (base, key) {
        (Value::Section(map), Value::Str(name)) => map
            .get(name)
            .cloned()
            .ok_or_else(|| ExprError::Reference(name.clone())),
        (Value::List(items), Value::Int(i)) => {
            let len = items.len() as i64;
            let idx = if *i < 0 { i + len } else { *i };
            if (0..len).contains(&idx) {
                Ok(items[idx as usize].clone())
            } else {
                Err(ExprError::Type(format!("list index {i} out of range")))
            }
        }
        (Value::Section(_), other) => Err(ExprError::Type(format!(
            "section keys must be strings, not {}",
            other.display_type()
        ))),
        (other, _) => Err(ExprError::Type(format!(
            "{} is not indexable",
            other.display_type()
        ))),
    }
}

fn call(func: &str, args: &[Expr], root: &Value) -> Result<Value, ExprError> {
    match func {
        "len" => {
            let [arg] = args else {
                return Err(ExprError::Type(format!(
                    "len() takes exactly one argument ({} given)",
                    args.len()
                )));
            };
            match evaluate(arg, root)? {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                Value::Section(map) => Ok(Value::Int(map.len() as i64)),
                other => Err(ExprError::Type(format!(
                    "object of type {} has no len()",
                    other.display_type()
                ))),
            }
        }
        other => Err(ExprError::Reference(other.to_string())),
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, ExprError> {
    let num = as_number(&operand).ok_or_else(|| {
        ExprError::Type(format!(
            "bad operand type for unary sign: {}",
            operand.display_type()
        ))
    })?;
    Ok(match (op, num) {
        (UnaryOp::Pos, n) => number_value(n),
        (UnaryOp::Neg, Number::Int(i)) => match i.checked_neg() {
            Some(n) => Value::Int(n),
            None => Value::Float(-(i as f64)),
        },
        (UnaryOp::Neg, Number::Float(f)) => Value::Float(-f),
        (UnaryOp::Neg, Number::Complex(z)) => Value::Complex(-z),
    })
}

/// Numeric promotion ladder used by arithmetic and comparisons.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
    Complex(Complex64),
}

fn as_number(v: &Value) -> Option<Number> {
    match v {
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Int(i) => Some(Number::Int(*i)),
        Value::Float(f) => Some(Number::Float(*f)),
        Value::Complex(z) => Some(Number::Complex(*z)),
        _ => None,
    }
}

fn number_value(n: Number) -> Value {
    match n {
        Number::Int(i) => Value::Int(i),
        Number::Float(f) => Value::Float(f),
        Number::Complex(z) => Value::Complex(z),
    }
}

fn promote(a: Number, b: Number) -> (Number, Number) {
    use Number::*;
    match (a, b) {
        (Int(_), Int(_)) | (Float(_), Float(_)) | (Complex(_), Complex(_)) => (a, b),
        (Int(x), Float(_)) => (Float(x as f64), b),
        (Float(_), Int(y)) => (a, Float(y as f64)),
        (Complex(_), _) => (a, Complex(to_complex(b))),
        (_, Complex(_)) => (Complex(to_complex(a)), b),
    }
}

fn to_complex(n: Number) -> Complex64 {
    match n {
        Number::Int(i) => Complex64::new(i as f64, 0.0),
        Number::Float(f) => Complex64::new(f, 0.0),
        Number::Complex(z) => z,
    }
}

fn to_f64(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
        Number::Complex(z) => z.re,
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ExprError> {
    // String and list concatenation come before numeric promotion.
    if op == BinaryOp::Add {
        match (&lhs, &rhs) {
            (Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut items = a.clone();
                items.extend(b.iter().cloned());
                return Ok(Value::List(items));
            }
            _ => {}
        }
    }

    let type_error = || {
        ExprError::Type(format!(
            "unsupported operand type(s): {} and {}",
            lhs.display_type(),
            rhs.display_type()
        ))
    };
    let (a, b) = match (as_number(&lhs), as_number(&rhs)) {
        (Some(a), Some(b)) => promote(a, b),
        _ => return Err(type_error()),
    };

    // Integer results that overflow i64 widen to float, as `**` does.
    use Number::*;
    match op {
        BinaryOp::Add => Ok(match (a, b) {
            (Int(x), Int(y)) => match x.checked_add(y) {
                Some(i) => Value::Int(i),
                None => Value::Float(x as f64 + y as f64),
            },
            (Float(x), Float(y)) => Value::Float(x + y),
            (Complex(x), Complex(y)) => Value::Complex(x + y),
            _ => unreachable!("operands are promoted"),
        }),
        BinaryOp::Sub => Ok(match (a, b) {
            (Int(x), Int(y)) => match x.checked_sub(y) {
                Some(i) => Value::Int(i),
                None => Value::Float(x as f64 - y as f64),
            },
            (Float(x), Float(y)) => Value::Float(x - y),
            (Complex(x), Complex(y)) => Value::Complex(x - y),
            _ => unreachable!("operands are promoted"),
        }),
        BinaryOp::Mul => Ok(match (a, b) {
            (Int(x), Int(y)) => match x.checked_mul(y) {
                Some(i) => Value::Int(i),
                None => Value::Float(x as f64 * y as f64),
            },
            (Float(x), Float(y)) => Value::Float(x * y),
            (Complex(x), Complex(y)) => Value::Complex(x * y),
            _ => unreachable!("operands are promoted"),
        }),
        BinaryOp::Div => match (a, b) {
            (Complex(x), Complex(y)) => {
                if y.re == 0.0 && y.im == 0.0 {
                    Err(ExprError::Type("complex division by zero".into()))
                } else {
                    Ok(Value::Complex(x / y))
                }
            }
            (x, y) => {
                let y = to_f64(y);
                if y == 0.0 {
                    Err(ExprError::Type("division by zero".into()))
                } else {
                    Ok(Value::Float(to_f64(x) / y))
                }
            }
        },
        BinaryOp::FloorDiv => match (a, b) {
            (Complex(_), _) | (_, Complex(_)) => {
                Err(ExprError::Type("can't take floor of complex number".into()))
            }
            (Int(x), Int(y)) => {
                if y == 0 {
                    Err(ExprError::Type("integer division by zero".into()))
                } else {
                    Ok(Value::Int((x as f64 / y as f64).floor() as i64))
                }
            }
            (x, y) => {
                let y = to_f64(y);
                if y == 0.0 {
                    Err(ExprError::Type("float floor division by zero".into()))
                } else {
                    Ok(Value::Float((to_f64(x) / y).floor()))
                }
            }
        },
        BinaryOp::Mod => match (a, b) {
            (Complex(_), _) | (_, Complex(_)) => {
                Err(ExprError::Type("can't mod complex numbers".into()))
            }
            (Int(x), Int(y)) => {
                if y == 0 {
                    Err(ExprError::Type("integer modulo by zero".into()))
                } else {
                    // Result takes the sign of the divisor.
                    Ok(Value::Int(((x % y) + y) % y))
                }
            }
            (x, y) => {
                let (x, y) = (to_f64(x), to_f64(y));
                if y == 0.0 {
                    Err(ExprError::Type("float modulo by zero".into()))
                } else {
                    Ok(Value::Float(x - y * (x / y).floor()))
                }
            }
        },
        BinaryOp::Pow => Ok(match (a, b) {
            (Int(x), Int(y)) if y >= 0 => match u32::try_from(y).ok().and_then(|y| x.checked_pow(y)) {
                Some(i) => Value::Int(i),
                None => Value::Float((x as f64).powf(y as f64)),
            },
            (Complex(x), y) => Value::Complex(x.powc(to_complex(y))),
            (x, Complex(y)) => Value::Complex(to_complex(x).powc(y)),
            (x, y) => Value::Float(to_f64(x).powf(to_f64(y))),
        }),
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, ExprError> {
    match op {
        CmpOp::Eq => Ok(values_equal(lhs, rhs)),
        CmpOp::Ne => Ok(!values_equal(lhs, rhs)),
        CmpOp::In => contains(rhs, lhs),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ordering = order(lhs, rhs)?;
            Ok(match op {
                CmpOp::Lt => ordering == std::cmp::Ordering::Less,
                CmpOp::Le => ordering != std::cmp::Ordering::Greater,
                CmpOp::Gt => ordering == std::cmp::Ordering::Greater,
                CmpOp::Ge => ordering != std::cmp::Ordering::Less,
                _ => unreachable!("handled above"),
            })
        }
    }
}

/// Equality with numeric cross-type semantics: `1 == 1.0` holds.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        let (a, b) = promote(a, b);
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => x == y,
            (Number::Float(x), Number::Float(y)) => x == y,
            (Number::Complex(x), Number::Complex(y)) => x == y,
            _ => false,
        };
    }
    match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => lhs == rhs,
    }
}

fn order(lhs: &Value, rhs: &Value) -> Result<std::cmp::Ordering, ExprError> {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        if matches!(a, Number::Complex(_)) || matches!(b, Number::Complex(_)) {
            return Err(ExprError::Type(
                "complex numbers have no ordering".into(),
            ));
        }
        let (x, y) = (to_f64(a), to_f64(b));
        return x.partial_cmp(&y).ok_or_else(|| {
            ExprError::Type("ordering comparison with NaN".into())
        });
    }
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    Err(ExprError::Type(format!(
        "'{}' and '{}' are not orderable",
        lhs.display_type(),
        rhs.display_type()
    )))
}

fn contains(haystack: &Value, needle: &Value) -> Result<bool, ExprError> {
    match haystack {
        Value::List(items) => Ok(items.iter().any(|item| values_equal(item, needle))),
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(s.contains(sub.as_str())),
            other => Err(ExprError::Type(format!(
                "'in <str>' requires a string, not {}",
                other.display_type()
            ))),
        },
        Value::Section(map) => match needle {
            Value::Str(key) => Ok(map.contains_key(key)),
            other => Err(ExprError::Type(format!(
                "'in <section>' requires a string key, not {}",
                other.display_type()
            ))),
        },
        other => Err(ExprError::Type(format!(
            "{} is not a container",
            other.display_type()
        ))),
    }
}
