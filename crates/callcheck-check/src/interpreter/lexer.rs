//! Tokenizer for candidate call expressions.
//!
//! Accepts the subset of Python expression syntax that function calls with
//! literal arguments need: identifiers, integer and float literals, quoted
//! strings (single, double, triple, with an optional `r` prefix) and
//! punctuation.

use super::error::ExecError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Equals,
    Dot,
    Minus,
    Plus,
}

/// A token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ExecError> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
    };
    let mut tokens = Vec::new();
    while let Some(spanned) = lexer.next_token()? {
        tokens.push(spanned);
    }
    Ok(tokens)
}

struct Lexer<'s> {
    source: &'s str,
    chars: std::iter::Peekable<std::str::CharIndices<'s>>,
}

impl<'s> Lexer<'s> {
    fn next_token(&mut self) -> Result<Option<Spanned>, ExecError> {
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.chars.next();
        }
        let Some(&(offset, c)) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | '=' | '-' | '+' => {
                self.chars.next();
                match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '=' => Token::Equals,
                    '-' => Token::Minus,
                    _ => Token::Plus,
                }
            }
            '.' if !self.digit_follows(offset) => {
                self.chars.next();
                Token::Dot
            }
            '\'' | '"' => self.string(offset, false)?,
            c if c.is_ascii_digit() || c == '.' => self.number(offset)?,
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.ident();
                let raw = matches!(ident.as_str(), "r" | "R");
                match self.chars.peek() {
                    Some(&(quote_at, '\'' | '"')) if raw => self.string(quote_at, true)?,
                    _ => Token::Ident(ident),
                }
            }
            other => {
                return Err(ExecError::Lex {
                    offset,
                    message: format!("unexpected character '{}'", other),
                })
            }
        };
        Ok(Some(Spanned { token, offset }))
    }

    fn digit_follows(&self, offset: usize) -> bool {
        self.source[offset + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        ident
    }

    fn number(&mut self, offset: usize) -> Result<Token, ExecError> {
        let mut text = String::new();
        let mut is_float = false;
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '0'..='9' => text.push(c),
                '_' => {}
                '.' => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.chars.next();
                    if let Some(&(_, sign @ ('+' | '-'))) = self.chars.peek() {
                        text.push(sign);
                    } else {
                        continue;
                    }
                }
                _ => break,
            }
            self.chars.next();
        }

        let invalid = || ExecError::Lex {
            offset,
            message: format!("invalid number literal '{}'", text),
        };
        if is_float {
            text.parse::<f64>().map(Token::Float).map_err(|_| invalid())
        } else {
            text.parse::<i64>().map(Token::Int).map_err(|_| invalid())
        }
    }

    fn string(&mut self, offset: usize, raw: bool) -> Result<Token, ExecError> {
        let Some((_, quote)) = self.chars.next() else {
            return Err(unterminated(offset));
        };
        let triple = self.source[offset..].starts_with(&quote.to_string().repeat(3));
        if triple {
            self.chars.next();
            self.chars.next();
        }

        let mut out = String::new();
        loop {
            let Some((at, c)) = self.chars.next() else {
                return Err(unterminated(offset));
            };
            if c == quote {
                if !triple {
                    break;
                }
                if self.source[at..].starts_with(&quote.to_string().repeat(3)) {
                    self.chars.next();
                    self.chars.next();
                    break;
                }
                out.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(unterminated(offset));
            }
            if c == '\\' && !raw {
                let Some((_, escaped)) = self.chars.next() else {
                    return Err(unterminated(offset));
                };
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' | '\'' | '"' => out.push(escaped),
                    '\n' => {}
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
                continue;
            }
            out.push(c);
        }
        Ok(Token::Str(out))
    }
}

fn unterminated(offset: usize) -> ExecError {
    ExecError::Lex {
        offset,
        message: "unterminated string literal".to_string(),
    }
}
