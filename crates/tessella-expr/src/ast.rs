//! Expression AST types.
//!
//! The grammar is a closed subset of a conventional expression language:
//! indexing into the result tree, arithmetic, chained comparisons,
//! boolean connectives, membership tests, list displays, and `len`.

/// A parsed template expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Imaginary literal; `2j` is `Imag(2.0)`.
    Imag(f64),
    Str(String),
    List(Vec<Expr>),
    /// A bare name. Only the reserved root binding resolves.
    Name(String),
    /// `base[key]` indexing into sections (string keys) or lists (integers).
    Index { base: Box<Expr>, key: Box<Expr> },
    /// Builtin call, e.g. `len(user['geometry'])`.
    Call { func: String, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// Short-circuiting `and` / `or`.
    Logical { op: LogicalOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Not(Box<Expr>),
    /// Chained comparison: `0 <= x <= 40` keeps every link.
    Compare { first: Box<Expr>, rest: Vec<(CmpOp, Expr)> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    In,
}
