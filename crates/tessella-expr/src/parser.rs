//! Recursive-descent parser for template expressions.
//!
//! Precedence, loosest to tightest: `or`, `and`, `not`, comparisons
//! (chained), additive, multiplicative, unary sign, power, indexing.

use crate::ast::{BinaryOp, CmpOp, Expr, LogicalOp, UnaryOp};
use crate::lexer::{tokenize, Token};
use crate::ExprError;

/// Parse an expression string into an AST.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.pos += 1;
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), ExprError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(what))
        }
    }

    fn expect_eof(&mut self) -> Result<(), ExprError> {
        if self.check(&Token::Eof) {
            Ok(())
        } else {
            Err(self.error("expected end of expression"))
        }
    }

    fn error(&self, what: &str) -> ExprError {
        ExprError::Syntax(format!("{what}, found {:?}", self.current()))
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            expr = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_not()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_not()?;
            expr = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.comparison_op() {
            self.pos += 1;
            let rhs = self.parse_additive()?;
            rest.push((op, rhs));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn comparison_op(&self) -> Option<CmpOp> {
        match self.current() {
            Token::Lt => Some(CmpOp::Lt),
            Token::Le => Some(CmpOp::Le),
            Token::Gt => Some(CmpOp::Gt),
            Token::Ge => Some(CmpOp::Ge),
            Token::EqEq => Some(CmpOp::Eq),
            Token::Ne => Some(CmpOp::Ne),
            Token::In => Some(CmpOp::In),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::SlashSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.current() {
            Token::Minus => Some(UnaryOp::Neg),
            Token::Plus => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::StarStar) {
            // Right-associative; the exponent may carry a sign.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::LBracket) {
            let key = self.parse_or()?;
            self.expect(Token::RBracket, "expected ']'")?;
            expr = Expr::Index {
                base: Box::new(expr),
                key: Box::new(key),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            Token::Int(i) => Ok(Expr::Int(i)),
            Token::Float(f) => Ok(Expr::Float(f)),
            Token::Imag(f) => Ok(Expr::Imag(f)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call { func: name, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::LParen => {
                let expr = self.parse_or()?;
                self.expect(Token::RParen, "expected ')'")?;
                Ok(expr)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.check(&Token::RBracket) {
                    loop {
                        items.push(self.parse_or()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                        // allow a trailing comma
                        if self.check(&Token::RBracket) {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket, "expected ']'")?;
                Ok(Expr::List(items))
            }
            other => Err(ExprError::Syntax(format!(
                "expected an expression, found {other:?}"
            ))),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                args.push(self.parse_or()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "expected ')'")?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tree_indexing() {
        let expr = parse("user['scf']['max_num_iterations']").unwrap();
        let Expr::Index { base, key } = expr else {
            panic!("expected an index node");
        };
        assert_eq!(*key, Expr::Str("max_num_iterations".into()));
        let Expr::Index { base, key } = *base else {
            panic!("expected a nested index node");
        };
        assert_eq!(*base, Expr::Name("user".into()));
        assert_eq!(*key, Expr::Str("scf".into()));
    }

    #[test]
    fn division_binds_tighter_than_addition() {
        let expr = parse("1 + 2 / 4").unwrap();
        let Expr::Binary { op: BinaryOp::Add, rhs, .. } = expr else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Div, .. }));
    }

    #[test]
    fn chained_comparison_keeps_every_link() {
        let expr = parse("0 <= value_ <= 40").unwrap();
        let Expr::Compare { rest, .. } = expr else {
            panic!("expected a comparison chain");
        };
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].0, CmpOp::Le);
        assert_eq!(rest[1].0, CmpOp::Le);
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("2 ** 3 ** 2").unwrap();
        let Expr::Binary { op: BinaryOp::Pow, rhs, .. } = expr else {
            panic!("expected power at the root");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn parses_len_call_and_list_display() {
        let expr = parse("len([1, 2, 3]) == 3").unwrap();
        let Expr::Compare { first, .. } = expr else {
            panic!("expected a comparison");
        };
        let Expr::Call { func, args } = *first else {
            panic!("expected a call");
        };
        assert_eq!(func, "len");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn rejects_dangling_operators_and_stray_tokens() {
        assert!(matches!(parse("1 +"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("user['a'"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse("1 2"), Err(ExprError::Syntax(_))));
        assert!(matches!(parse(""), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn boolean_precedence_or_is_loosest() {
        let expr = parse("not a and b or c").unwrap();
        let Expr::Logical { op: LogicalOp::Or, lhs, .. } = expr else {
            panic!("expected or at the root");
        };
        assert!(matches!(*lhs, Expr::Logical { op: LogicalOp::And, .. }));
    }
}
