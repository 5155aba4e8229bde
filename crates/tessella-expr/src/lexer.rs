//! Tokenizer for the template expression language.

use crate::ExprError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    /// Imaginary literal, e.g. `2j` or `1.5J`.
    Imag(f64),
    Str(String),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    In,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            ' ' | '\t' | '\n' | '\r' => pos += 1,
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                pos += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                pos += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                pos += 1;
            }
            '*' => {
                if chars.get(pos + 1) == Some(&'*') {
                    tokens.push(Token::StarStar);
                    pos += 2;
                } else {
                    tokens.push(Token::Star);
                    pos += 1;
                }
            }
            '/' => {
                if chars.get(pos + 1) == Some(&'/') {
                    tokens.push(Token::SlashSlash);
                    pos += 2;
                } else {
                    tokens.push(Token::Slash);
                    pos += 1;
                }
            }
            '<' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    pos += 2;
                } else {
                    tokens.push(Token::Lt);
                    pos += 1;
                }
            }
            '>' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    pos += 2;
                } else {
                    tokens.push(Token::Gt);
                    pos += 1;
                }
            }
            '=' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    pos += 2;
                } else {
                    return Err(ExprError::Syntax("unexpected '=' (did you mean '==')".into()));
                }
            }
            '!' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    pos += 2;
                } else {
                    return Err(ExprError::Syntax("unexpected '!'".into()));
                }
            }
            '\'' | '"' => {
                let (token, next) = lex_string(&chars, pos, c)?;
                tokens.push(token);
                pos = next;
            }
            _ if c.is_ascii_digit() || (c == '.' && next_is_digit(&chars, pos)) => {
                let (token, next) = lex_number(&chars, pos)?;
                tokens.push(token);
                pos = next;
            }
            _ if c.is_alphabetic() || c == '_' => {
                let (token, next) = lex_word(&chars, pos);
                tokens.push(token);
                pos = next;
            }
            _ => return Err(ExprError::Syntax(format!("unexpected character '{c}'"))),
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

fn next_is_digit(chars: &[char], pos: usize) -> bool {
    chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit())
}

fn lex_string(chars: &[char], start: usize, quote: char) -> Result<(Token, usize), ExprError> {
    let mut text = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' if pos + 1 < chars.len() => {
                text.push(chars[pos + 1]);
                pos += 2;
            }
            c if c == quote => return Ok((Token::Str(text), pos + 1)),
            c => {
                text.push(c);
                pos += 1;
            }
        }
    }
    Err(ExprError::Syntax("unterminated string literal".into()))
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ExprError> {
    let mut pos = start;
    let mut is_float = false;

    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len() && chars[pos] == '.' {
        is_float = true;
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
        let mut exp = pos + 1;
        if exp < chars.len() && (chars[exp] == '+' || chars[exp] == '-') {
            exp += 1;
        }
        if exp < chars.len() && chars[exp].is_ascii_digit() {
            is_float = true;
            pos = exp;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text: String = chars[start..pos].iter().collect();

    if pos < chars.len() && (chars[pos] == 'j' || chars[pos] == 'J') {
        let im: f64 = text
            .parse()
            .map_err(|_| ExprError::Syntax(format!("invalid imaginary literal '{text}j'")))?;
        return Ok((Token::Imag(im), pos + 1));
    }

    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| ExprError::Syntax(format!("invalid float literal '{text}'")))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| ExprError::Syntax(format!("invalid integer literal '{text}'")))?,
        )
    };
    Ok((token, pos))
}

fn lex_word(chars: &[char], start: usize) -> (Token, usize) {
    let mut pos = start;
    while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
        pos += 1;
    }
    let word: String = chars[start..pos].iter().collect();
    let token = match word.as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "True" | "true" => Token::True,
        "False" | "false" => Token::False,
        _ => Token::Ident(word),
    };
    (token, pos)
}
