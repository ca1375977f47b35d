//! Tokenizer for template expressions.

use crate::error::TemplateError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Quoted string literal (quotes removed, escapes applied)
    Str(String),
    /// Numeric literal
    Num(f64),
    /// Identifier or keyword (`and`, `or`, `not`, `if`, `else`, `true`, ...)
    Ident(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `~`
    Tilde,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
}

/// A token and the byte offset where it starts.
pub type Spanned = (usize, Token);

/// Splits an expression into tokens.
///
/// # Errors
///
/// Returns [`TemplateError::Syntax`] on an unterminated string, a malformed
/// number or a character outside the grammar.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' | '~' => {
                chars.next();
                tokens.push((
                    offset,
                    match c {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        ',' => Token::Comma,
                        _ => Token::Tilde,
                    },
                ));
            }
            '=' | '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => tokens.push((
                        offset,
                        if c == '=' { Token::EqEq } else { Token::NotEq },
                    )),
                    _ => {
                        return Err(syntax(offset, format!("expected '=' after '{c}'")));
                    }
                }
            }
            '\'' | '"' => {
                chars.next();
                let quote = c;
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, escaped)) => value.push(escaped),
                            None => break,
                        },
                        ch if ch == quote => {
                            closed = true;
                            break;
                        }
                        ch => value.push(ch),
                    }
                }
                if !closed {
                    return Err(syntax(offset, "unterminated string literal"));
                }
                tokens.push((offset, Token::Str(value)));
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        text.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = text
                    .parse::<f64>()
                    .map_err(|_| syntax(offset, format!("invalid number '{text}'")))?;
                tokens.push((offset, Token::Num(number)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((offset, Token::Ident(ident)));
            }
            other => {
                return Err(syntax(offset, format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

fn syntax(offset: usize, message: impl Into<String>) -> TemplateError {
    TemplateError::Syntax {
        offset,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_call_with_strings() {
        assert_eq!(
            kinds("states('light.x') ~ \"!\""),
            vec![
                Token::Ident("states".into()),
                Token::LParen,
                Token::Str("light.x".into()),
                Token::RParen,
                Token::Tilde,
                Token::Str("!".into()),
            ]
        );
    }

    #[test]
    fn test_operators_and_numbers() {
        assert_eq!(
            kinds("1 == 2.5 != -3"),
            vec![
                Token::Num(1.0),
                Token::EqEq,
                Token::Num(2.5),
                Token::NotEq,
                Token::Num(-3.0),
            ]
        );
    }

    #[test]
    fn test_errors_carry_offset() {
        assert_eq!(
            tokenize("'open"),
            Err(TemplateError::Syntax {
                offset: 0,
                message: "unterminated string literal".into()
            })
        );
        assert!(matches!(
            tokenize("a + b"),
            Err(TemplateError::Syntax { offset: 2, .. })
        ));
    }
}
