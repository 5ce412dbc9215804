//! Recursive-descent parser for candidate call expressions.
//!
//! The grammar covers what a function call with literal arguments needs:
//!
//! ```text
//! expr    := ('-' | '+') expr | postfix
//! postfix := primary ('.' IDENT | '(' args ')')*
//! primary := INT | FLOAT | STR+ | IDENT | list | tuple | dict | set
//! args    := (arg (',' arg)* ','?)?
//! arg     := IDENT '=' expr | expr
//! ```
//!
//! Only dotted names can be called. Operators other than unary sign are
//! rejected, so evaluation cannot do anything but call registered helpers.

use callcheck_core::Value;

use super::error::ExecError;
use super::lexer::{tokenize, Spanned, Token};

/// Maximum nesting of brackets and calls.
pub const MAX_DEPTH: usize = 64;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// A possibly dotted name: `x`, `math.pi`.
    Name(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Neg(Box<Expr>),
    Call {
        function: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
}

/// Parses a complete expression; trailing tokens are an error.
pub fn parse(source: &str) -> Result<Expr, ExecError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: source.len(),
    };
    let expr = parser.expr()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(ExecError::Parse {
            offset: extra.offset,
            message: format!("unexpected {:?} after expression", extra.token),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |spanned| spanned.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|spanned| spanned.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExecError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}", expected)))
        }
    }

    fn error(&self, message: String) -> ExecError {
        ExecError::Parse {
            offset: self.offset(),
            message,
        }
    }

    fn enter(&mut self) -> Result<(), ExecError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExecError::NestingLimitExceeded { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, ExecError> {
        self.enter()?;
        let expr = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Expr::Neg(Box::new(self.expr()?))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.expr()?
            }
            _ => self.postfix()?,
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn postfix(&mut self) -> Result<Expr, ExecError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let Expr::Name(base) = expr else {
                    return Err(self.error("attribute access is only allowed on names".into()));
                };
                match self.advance() {
                    Some(Token::Ident(attr)) => expr = Expr::Name(format!("{}.{}", base, attr)),
                    _ => return Err(self.error("expected attribute name".into())),
                }
            } else if self.peek() == Some(&Token::LParen) {
                let Expr::Name(function) = expr else {
                    return Err(self.error("only named functions can be called".into()));
                };
                self.pos += 1;
                let (args, kwargs) = self.arguments()?;
                expr = Expr::Call {
                    function,
                    args,
                    kwargs,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ExecError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        while !self.eat(&Token::RParen) {
            let keyword = match (self.peek(), self.tokens.get(self.pos + 1)) {
                (Some(Token::Ident(name)), Some(next)) if next.token == Token::Equals => {
                    Some(name.clone())
                }
                _ => None,
            };
            match keyword {
                Some(name) => {
                    self.pos += 2;
                    kwargs.push((name, self.expr()?));
                }
                None if !kwargs.is_empty() => {
                    return Err(self.error("positional argument follows keyword argument".into()))
                }
                None => args.push(self.expr()?),
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen)?;
                break;
            }
        }
        Ok((args, kwargs))
    }

    fn primary(&mut self) -> Result<Expr, ExecError> {
        let offset = self.offset();
        let Some(token) = self.advance() else {
            return Err(self.error("unexpected end of expression".into()));
        };
        Ok(match token {
            Token::Int(i) => Expr::Literal(Value::Int(i)),
            Token::Float(f) => Expr::Literal(Value::Float(f)),
            Token::Str(mut s) => {
                // Adjacent literals concatenate.
                while let Some(Token::Str(next)) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Expr::Literal(Value::Str(s))
            }
            Token::Ident(name) => match name.as_str() {
                "True" => Expr::Literal(Value::Bool(true)),
                "False" => Expr::Literal(Value::Bool(false)),
                "None" => Expr::Literal(Value::None),
                _ => Expr::Name(name),
            },
            Token::LBracket => Expr::List(self.sequence(&Token::RBracket)?.0),
            Token::LParen => {
                let (mut items, trailing_comma) = self.sequence(&Token::RParen)?;
                if items.len() == 1 && !trailing_comma {
                    items.remove(0)
                } else {
                    Expr::Tuple(items)
                }
            }
            Token::LBrace => self.brace()?,
            other => {
                return Err(ExecError::Parse {
                    offset,
                    message: format!("unexpected {:?}", other),
                })
            }
        })
    }

    /// Parses comma-separated expressions up to `close`. Also reports whether
    /// the last element was followed by a comma.
    fn sequence(&mut self, close: &Token) -> Result<(Vec<Expr>, bool), ExecError> {
        self.enter()?;
        let mut items = Vec::new();
        let mut trailing_comma = false;
        while !self.eat(close) {
            items.push(self.expr()?);
            trailing_comma = self.eat(&Token::Comma);
            if !trailing_comma {
                self.expect(close)?;
                break;
            }
        }
        self.depth -= 1;
        Ok((items, trailing_comma))
    }

    /// `{}` is an empty dict; `{k: v, ...}` a dict; `{a, b}` a set.
    fn brace(&mut self) -> Result<Expr, ExecError> {
        self.enter()?;
        if self.eat(&Token::RBrace) {
            self.depth -= 1;
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.expr()?;
        let expr = if self.eat(&Token::Colon) {
            let mut entries = vec![(first, self.expr()?)];
            while self.eat(&Token::Comma) {
                if self.peek() == Some(&Token::RBrace) {
                    break;
                }
                let key = self.expr()?;
                self.expect(&Token::Colon)?;
                entries.push((key, self.expr()?));
            }
            self.expect(&Token::RBrace)?;
            Expr::Dict(entries)
        } else {
            let mut items = vec![first];
            while self.eat(&Token::Comma) {
                if self.peek() == Some(&Token::RBrace) {
                    break;
                }
                items.push(self.expr()?);
            }
            self.expect(&Token::RBrace)?;
            Expr::Set(items)
        };
        self.depth -= 1;
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    #[test]
    fn parses_call_with_positional_and_keyword_arguments() {
        let expr = parse("calculate_triangle_area(10, height=5.5)").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                function: "calculate_triangle_area".into(),
                args: vec![lit(10)],
                kwargs: vec![("height".into(), lit(5.5))],
            }
        );
    }

    #[test]
    fn parses_dotted_function_names_and_nested_calls() {
        let expr = parse("geometry.area(side=math.sqrt(4))").unwrap();
        let Expr::Call { function, kwargs, .. } = expr else {
            panic!("expected call");
        };
        assert_eq!(function, "geometry.area");
        assert!(matches!(&kwargs[0].1, Expr::Call { function, .. } if function == "math.sqrt"));
    }

    #[test]
    fn parses_collections() {
        assert_eq!(parse("[1, 'a',]").unwrap(), Expr::List(vec![lit(1), lit("a")]));
        assert_eq!(parse("(1,)").unwrap(), Expr::Tuple(vec![lit(1)]));
        assert_eq!(parse("(1)").unwrap(), lit(1));
        assert_eq!(parse("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(parse("{}").unwrap(), Expr::Dict(vec![]));
        assert_eq!(parse("{'k': None}").unwrap(), Expr::Dict(vec![(lit("k"), lit(Value::None))]));
        assert_eq!(parse("{1, 2}").unwrap(), Expr::Set(vec![lit(1), lit(2)]));
    }

    #[test]
    fn concatenates_adjacent_strings() {
        assert_eq!(parse("'a' \"b\"").unwrap(), lit("ab"));
    }

    #[test]
    fn rejects_operators_and_trailing_input() {
        assert!(parse("f(1) + 2").is_err());
        assert!(parse("f(1) g(2)").is_err());
        assert!(parse("f(a=1, 2)").is_err());
        assert!(parse("[1, 2](3)").is_err());
        assert!(parse("f(").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse(&deep), Err(ExecError::NestingLimitExceeded { .. })));
    }
}
