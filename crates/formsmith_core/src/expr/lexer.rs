//! Tokenizer for custom validation rules.

use crate::expr::ExprFault;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Splits `source` into tokens.
///
/// Accepts `===`/`!==` as aliases of `==`/`!=`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExprFault> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit)) {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            let number = text.parse::<f64>().map_err(|_| ExprFault::Lex)?;
            tokens.push(Token::Number(number));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
            {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "null" => Token::Null,
                _ => Token::Ident(word),
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            pos += 1;
            let mut text = String::new();
            loop {
                match chars.get(pos) {
                    None => return Err(ExprFault::Lex),
                    Some(&ch) if ch == quote => {
                        pos += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = chars.get(pos + 1).ok_or(ExprFault::Lex)?;
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => *other,
                        });
                        pos += 2;
                    }
                    Some(&ch) => {
                        text.push(ch);
                        pos += 1;
                    }
                }
            }
            tokens.push(Token::Str(text));
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let after = chars.get(pos + 2).copied();
        let (token, width) = match (c, next, after) {
            ('=', Some('='), Some('=')) => (Token::StrictEq, 3),
            ('!', Some('='), Some('=')) => (Token::StrictNotEq, 3),
            ('=', Some('='), _) => (Token::EqEq, 2),
            ('!', Some('='), _) => (Token::NotEq, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('&', Some('&'), _) => (Token::AndAnd, 2),
            ('|', Some('|'), _) => (Token::OrOr, 2),
            ('<', _, _) => (Token::Lt, 1),
            ('>', _, _) => (Token::Gt, 1),
            ('!', _, _) => (Token::Bang, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            // Assignment, member access, calls separators, etc.
            _ => return Err(ExprFault::Lex),
        };
        tokens.push(token);
        pos += width;
    }

    Ok(tokens)
}
