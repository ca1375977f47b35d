//! Recursive-descent parser for template expressions.
//!
//! Precedence, loosest first: `a if c else b`, `or`, `and`, `not`,
//! `==`/`!=`, `~`, then literals, calls and parentheses.

use super::lexer::{tokenize, Spanned, Token};
use super::Value;
use crate::constants::TEMPLATE_MAX_DEPTH;
use crate::error::TemplateError;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// Function call
    Call {
        /// Function name
        name: String,
        /// Arguments in order
        args: Vec<Expr>,
    },
    /// `lhs ~ rhs`
    Concat(Box<Expr>, Box<Expr>),
    /// `lhs == rhs` / `lhs != rhs`
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    /// `not expr`
    Not(Box<Expr>),
    /// `lhs and rhs`
    And(Box<Expr>, Box<Expr>),
    /// `lhs or rhs`
    Or(Box<Expr>, Box<Expr>),
    /// `then if cond else otherwise`
    Conditional {
        /// Value when the condition holds
        then: Box<Expr>,
        /// Condition
        cond: Box<Expr>,
        /// Value otherwise; `none` when the `else` branch is omitted
        otherwise: Box<Expr>,
    },
}

/// Parses a complete expression.
///
/// # Errors
///
/// Returns [`TemplateError::Syntax`] when the expression is empty, malformed,
/// nested deeper than [`TEMPLATE_MAX_DEPTH`] or followed by trailing tokens.
pub fn parse(source: &str) -> Result<Expr, TemplateError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.conditional()?;
    if let Some((offset, token)) = parser.tokens.get(parser.pos) {
        return Err(TemplateError::Syntax {
            offset: *offset,
            message: format!("unexpected {token:?}"),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(word)) if word == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), TemplateError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}")))
        }
    }

    /// Enters one nesting level; the caller leaves it with `self.depth -= n`.
    fn descend(&mut self) -> Result<(), TemplateError> {
        self.depth += 1;
        if self.depth > TEMPLATE_MAX_DEPTH {
            return Err(self.error(format!(
                "expression nested deeper than {TEMPLATE_MAX_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn conditional(&mut self) -> Result<Expr, TemplateError> {
        self.descend()?;
        let expr = self.conditional_inner();
        self.depth -= 1;
        expr
    }

    fn conditional_inner(&mut self) -> Result<Expr, TemplateError> {
        let then = self.or()?;
        if !self.eat_keyword("if") {
            return Ok(then);
        }
        let cond = self.or()?;
        let otherwise = if self.eat_keyword("else") {
            self.conditional()?
        } else {
            Expr::Literal(Value::None)
        };
        Ok(Expr::Conditional {
            then: Box::new(then),
            cond: Box::new(cond),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.and()?;
        let mut chain = 0;
        while self.eat_keyword("or") {
            self.descend()?;
            chain += 1;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.not()?;
        let mut chain = 0;
        while self.eat_keyword("and") {
            self.descend()?;
            chain += 1;
            let rhs = self.not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, TemplateError> {
        let mut count = 0;
        while self.eat_keyword("not") {
            self.descend()?;
            count += 1;
        }
        let mut expr = self.compare()?;
        self.depth -= count;
        for _ in 0..count {
            expr = Expr::Not(Box::new(expr));
        }
        Ok(expr)
    }

    fn compare(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.concat()?;
        let mut chain = 0;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            self.descend()?;
            chain += 1;
            let rhs = self.concat()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn concat(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.primary()?;
        let mut chain = 0;
        while self.peek() == Some(&Token::Tilde) {
            self.pos += 1;
            self.descend()?;
            chain += 1;
            let rhs = self.primary()?;
            lhs = Expr::Concat(Box::new(lhs), Box::new(rhs));
        }
        self.depth -= chain;
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Expr, TemplateError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of expression"));
        };
        match token {
            Token::Str(value) => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Str(value)))
            }
            Token::Num(value) => {
                self.pos += 1;
                Ok(Expr::Literal(Value::Num(value)))
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.conditional()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(word) => {
                match word.to_ascii_lowercase().as_str() {
                    "true" => {
                        self.pos += 1;
                        return Ok(Expr::Literal(Value::Bool(true)));
                    }
                    "false" => {
                        self.pos += 1;
                        return Ok(Expr::Literal(Value::Bool(false)));
                    }
                    "none" => {
                        self.pos += 1;
                        return Ok(Expr::Literal(Value::None));
                    }
                    "and" | "or" | "not" | "if" | "else" => {
                        return Err(self.error(format!("unexpected keyword '{word}'")));
                    }
                    _ => {}
                }
                self.pos += 1;
                self.expect(&Token::LParen)?;
                let mut args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    loop {
                        args.push(self.conditional()?);
                        if self.peek() == Some(&Token::Comma) {
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(&Token::RParen)?;
                Ok(Expr::Call { name: word, args })
            }
            other => Err(self.error(format!("unexpected {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[&str]) -> Expr {
        Expr::Call {
            name: name.into(),
            args: args
                .iter()
                .map(|a| Expr::Literal(Value::Str((*a).into())))
                .collect(),
        }
    }

    #[test]
    fn test_parse_call() {
        assert_eq!(parse("states('light.x')").unwrap(), call("states", &["light.x"]));
        assert_eq!(parse("self_states()").unwrap(), call("self_states", &[]));
    }

    #[test]
    fn test_concat_binds_tighter_than_compare() {
        let expr = parse("'a' ~ 'b' == 'ab'").unwrap();
        assert!(matches!(expr, Expr::Compare(CompareOp::Eq, lhs, _) if matches!(*lhs, Expr::Concat(..))));
    }

    #[test]
    fn test_conditional_without_else() {
        let expr = parse("'x' if true").unwrap();
        assert_eq!(
            expr,
            Expr::Conditional {
                then: Box::new(Expr::Literal(Value::Str("x".into()))),
                cond: Box::new(Expr::Literal(Value::Bool(true))),
                otherwise: Box::new(Expr::Literal(Value::None)),
            }
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(parse("True").unwrap(), Expr::Literal(Value::Bool(true)));
        assert_eq!(parse("None").unwrap(), Expr::Literal(Value::None));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse(""), Err(TemplateError::Syntax { offset: 0, .. })));
        assert!(matches!(parse("states('a'"), Err(TemplateError::Syntax { .. })));
        assert!(matches!(parse("'a' 'b'"), Err(TemplateError::Syntax { offset: 4, .. })));
        assert!(matches!(parse("bare"), Err(TemplateError::Syntax { .. })));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(TEMPLATE_MAX_DEPTH - 1)).is_ok());

        // deep input fails cleanly instead of exhausting the stack
        let deep = std::thread::Builder::new()
            .stack_size(1024 * 1024)
            .spawn(move || {
                [
                    parse(&nested(3000)),
                    parse(&format!("{}true", "not ".repeat(3000))),
                    parse(&vec!["'a'"; 3000].join(" ~ ")),
                    parse(&vec!["true"; 3000].join(" or ")),
                    parse(&format!("{}1{}", "states(".repeat(3000), ")".repeat(3000))),
                ]
            })
            .unwrap()
            .join()
            .unwrap();
        for result in deep {
            match result {
                Err(TemplateError::Syntax { message, .. }) => assert!(message.contains("nested")),
                other => panic!("expected a nesting error, got {other:?}"),
            }
        }
    }
}
