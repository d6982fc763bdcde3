//! Restricted filter grammar compiled to polars expressions.
//!
//! ```text
//! expr       := or
//! or         := and (("|" | "or") and)*
//! and        := not (("&" | "and") not)*
//! not        := ("!" | "~" | "not") not | comparison
//! comparison := sum (("=" | "==" | "!=" | "<>" | "<" | "<=" | ">" | ">=") sum)?
//! sum        := product (("+" | "-") product)*
//! product    := unary (("*" | "/" | "%") unary)*
//! unary      := "-" unary | term
//! term       := number | string | true | false | null | "(" expr ")"
//!             | col[name] | function[expr] | count[table] | identifier
//! ```
//!
//! Identifiers resolve only through the column bindings handed in by the
//! caller; anything unbound is an error. The table itself is visible under
//! its own name, but only as the argument of `count[..]` / `len[..]`, which
//! yield its row count.

use indexmap::IndexMap;
use polars::prelude::*;
use std::ops::{Add, Div, Mul, Rem, Sub};

use crate::filter::FilterError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    Int(i64),
    Float(f64),
    String(String),
    Op(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
}

fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '[' => {
                tokens.push(Token::LBracket);
                chars.next();
            }
            ']' => {
                tokens.push(Token::RBracket);
                chars.next();
            }
            '"' | '\'' => {
                let quote = c;
                chars.next(); // consume opening quote
                let mut string_val = String::new();
                let mut found_closing_quote = false;
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        match chars.next() {
                            Some('n') => string_val.push('\n'),
                            Some('t') => string_val.push('\t'),
                            Some('r') => string_val.push('\r'),
                            Some(next_c) if next_c == '\\' || next_c == quote => {
                                string_val.push(next_c)
                            }
                            Some(next_c) => {
                                // Unknown escape, keep the backslash
                                string_val.push('\\');
                                string_val.push(next_c);
                            }
                            None => {
                                return Err(FilterError::Parse(
                                    "Unterminated escape sequence in string".to_string(),
                                ))
                            }
                        }
                    } else if c == quote {
                        found_closing_quote = true;
                        break;
                    } else {
                        string_val.push(c);
                    }
                }
                if !found_closing_quote {
                    return Err(FilterError::Parse("Unterminated string literal".to_string()));
                }
                tokens.push(Token::String(string_val));
            }
            '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '~' => {
                let mut op = c.to_string();
                chars.next();
                if let Some(&next_c) = chars.peek() {
                    if (c == '<' && (next_c == '=' || next_c == '>'))
                        || (c == '>' && next_c == '=')
                        || (c == '!' && next_c == '=')
                        || (c == '=' && next_c == '=')
                    {
                        op.push(next_c);
                        chars.next();
                    }
                }
                tokens.push(Token::Op(op));
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&nc) = chars.peek() {
                    if nc.is_ascii_digit() || nc == '.' || nc == '_' {
                        if nc != '_' {
                            num_str.push(nc);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !num_str.contains('.') {
                    if let Ok(n) = num_str.parse::<i64>() {
                        tokens.push(Token::Int(n));
                        continue;
                    }
                }
                match num_str.parse::<f64>() {
                    Ok(n) => tokens.push(Token::Float(n)),
                    Err(_) => {
                        return Err(FilterError::Parse(format!("Invalid number: {}", num_str)))
                    }
                }
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&nc) = chars.peek() {
                    if nc.is_alphanumeric() || nc == '_' {
                        ident.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Identifier(ident));
            }
            _ => return Err(FilterError::Parse(format!("Unexpected character: {}", c))),
        }
    }
    Ok(tokens)
}

fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
    matches!(token, Some(Token::Identifier(name)) if name.eq_ignore_ascii_case(keyword))
}

fn is_op(token: Option<&Token>, ops: &[&str]) -> bool {
    matches!(token, Some(Token::Op(op)) if ops.contains(&op.as_str()))
}

fn apply_op(left: Expr, op: &str, right: Expr) -> Result<Expr, FilterError> {
    match op {
        "+" => Ok(left.add(right)),
        "-" => Ok(left.sub(right)),
        "*" => Ok(left.mul(right)),
        "/" => Ok(left.div(right)),
        "%" => Ok(left.rem(right)),
        "=" | "==" => Ok(left.eq(right)),
        "<" => Ok(left.lt(right)),
        ">" => Ok(left.gt(right)),
        "<=" => Ok(left.lt_eq(right)),
        ">=" => Ok(left.gt_eq(right)),
        "<>" | "!=" => Ok(left.neq(right)),
        "&" | "and" => Ok(left.and(right)),
        "|" | "or" => Ok(left.or(right)),
        _ => Err(FilterError::Parse(format!("Unknown operator: {}", op))),
    }
}

// Bracket-call functions like max[salary] or not[a = b]
fn apply_function(name: &str, arg: Expr) -> Option<Expr> {
    match name.to_lowercase().as_str() {
        "avg" | "mean" => Some(arg.mean()),
        "min" => Some(arg.min()),
        "max" => Some(arg.max()),
        "count" => Some(arg.count()),
        "len" => Some(arg.len()),
        "std" | "stddev" => Some(arg.std(1)),
        "med" | "median" => Some(arg.median()),
        "sum" => Some(arg.sum()),
        "not" => Some(arg.not()),
        "is_null" => Some(arg.is_null()),
        "is_not_null" => Some(arg.is_not_null()),
        _ => None,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    bindings: &'a IndexMap<String, Expr>,
    table: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    /// Whether `name` refers to the table rather than a column.
    fn is_table(&self, name: &str) -> bool {
        name == self.table && !self.bindings.contains_key(name)
    }

    /// `count[df]` / `len[df]`: the row count of the whole table.
    fn table_function(&mut self, name: &str) -> Result<Expr, FilterError> {
        self.advance();
        self.expect(Token::RBracket)?;
        match name.to_lowercase().as_str() {
            "count" | "len" => Ok(len()),
            _ => Err(FilterError::Parse(format!(
                "{}[] does not accept the table {}",
                name, self.table
            ))),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FilterError> {
        match self.advance() {
            Some(token) if *token == expected => Ok(()),
            Some(token) => Err(FilterError::Parse(format!(
                "Expected {:?}, found {:?}",
                expected, token
            ))),
            None => Err(FilterError::Parse(format!(
                "Expected {:?} at end of expression",
                expected
            ))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_and()?;
        while is_op(self.peek(), &["|"]) || is_keyword(self.peek(), "or") {
            self.advance();
            let right = self.parse_and()?;
            left = apply_op(left, "|", right)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_not()?;
        while is_op(self.peek(), &["&"]) || is_keyword(self.peek(), "and") {
            self.advance();
            let right = self.parse_not()?;
            left = apply_op(left, "&", right)?;
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, FilterError> {
        let bracket_call = matches!(self.tokens.get(self.pos + 1), Some(Token::LBracket));
        if is_op(self.peek(), &["!", "~"]) || (is_keyword(self.peek(), "not") && !bracket_call) {
            self.advance();
            return Ok(self.parse_not()?.not());
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, FilterError> {
        let left = self.parse_sum()?;
        if let Some(Token::Op(op)) = self.peek() {
            if matches!(op.as_str(), "=" | "==" | "!=" | "<>" | "<" | "<=" | ">" | ">=") {
                self.advance();
                let right = self.parse_sum()?;
                return apply_op(left, op, right);
            }
        }
        Ok(left)
    }

    fn parse_sum(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_product()?;
        while let Some(Token::Op(op)) = self.peek() {
            if op != "+" && op != "-" {
                break;
            }
            self.advance();
            let right = self.parse_product()?;
            left = apply_op(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_product(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_unary()?;
        while let Some(Token::Op(op)) = self.peek() {
            if op != "*" && op != "/" && op != "%" {
                break;
            }
            self.advance();
            let right = self.parse_unary()?;
            left = apply_op(left, op, right)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, FilterError> {
        if is_op(self.peek(), &["-"]) {
            self.advance();
            return match self.peek() {
                Some(Token::Int(n)) => {
                    self.advance();
                    Ok(lit(-*n))
                }
                Some(Token::Float(n)) => {
                    self.advance();
                    Ok(lit(-*n))
                }
                _ => Ok(lit(0).sub(self.parse_unary()?)),
            };
        }
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expr, FilterError> {
        let token = self
            .advance()
            .ok_or_else(|| FilterError::Parse("Unexpected end of expression".to_string()))?;
        match token {
            Token::Int(n) => Ok(lit(*n)),
            Token::Float(n) => Ok(lit(*n)),
            Token::String(s) => Ok(lit(s.as_str())),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Identifier(name) if self.peek() == Some(&Token::LBracket) => {
                self.advance();
                if name == "col" {
                    // col["name with spaces"] for names that are not identifiers
                    let col_name = match self.advance() {
                        Some(Token::String(s)) | Some(Token::Identifier(s)) => s.clone(),
                        _ => {
                            return Err(FilterError::Parse(
                                "col[] must contain a string or identifier".to_string(),
                            ))
                        }
                    };
                    self.expect(Token::RBracket)?;
                    return self.resolve(&col_name);
                }
                if let Some(Token::Identifier(arg)) = self.peek() {
                    let closes = self.tokens.get(self.pos + 1) == Some(&Token::RBracket);
                    if closes && self.is_table(arg) {
                        return self.table_function(name);
                    }
                }
                let arg = self.parse_or()?;
                self.expect(Token::RBracket)?;
                apply_function(name, arg)
                    .ok_or_else(|| FilterError::Parse(format!("Unknown function: {}", name)))
            }
            Token::Identifier(name) => match name.to_lowercase().as_str() {
                "true" => Ok(lit(true)),
                "false" => Ok(lit(false)),
                "null" => Ok(lit(NULL)),
                _ => self.resolve(name),
            },
            other => Err(FilterError::Parse(format!(
                "Unexpected token in term: {:?}",
                other
            ))),
        }
    }

    fn resolve(&self, name: &str) -> Result<Expr, FilterError> {
        if self.is_table(name) {
            return Err(FilterError::Parse(format!(
                "{} is the whole table; use count[{}] for its size",
                name, name
            )));
        }
        self.bindings
            .get(name)
            .cloned()
            .ok_or_else(|| FilterError::UnknownIdentifier(name.to_string()))
    }
}

/// Compile `input` into an expression, resolving identifiers through
/// `bindings` (column name → column expression). `table` names the whole
/// table.
pub fn parse_filter(
    input: &str,
    bindings: &IndexMap<String, Expr>,
    table: &str,
) -> Result<Expr, FilterError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FilterError::Parse("Empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        bindings,
        table,
    };
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.peek() {
        return Err(FilterError::Parse(format!(
            "Unexpected trailing input: {:?}",
            extra
        )));
    }
    Ok(expr)
}
