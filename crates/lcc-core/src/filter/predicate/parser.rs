//! Recursive-descent parser from tokens to [`Expr`].

use super::lexer::{Spanned, Token};
use super::{CompareOp, Expr, Segment, SyntaxError};
use serde_json::Value;

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "true", "false", "null", "True", "False", "None",
];

/// Deepest allowed nesting of parentheses and `not`.
pub(super) const MAX_NESTING: usize = 64;

pub(super) fn parse(tokens: &[Spanned]) -> Result<Expr, SyntaxError> {
    if tokens.is_empty() {
        return Err(SyntaxError::Empty);
    }
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = p.or()?;
    match p.peek() {
        Some((tok, pos)) => Err(unexpected(tok, *pos)),
        None => Ok(expr),
    }
}

fn unexpected(tok: &Token, pos: usize) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        found: tok.to_string(),
        pos,
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, offset: usize, kw: &str) -> bool {
        matches!(self.tokens.get(self.pos + offset), Some((Token::Ident(s), _)) if s == kw)
    }

    fn next(&mut self) -> Result<&'a Spanned, SyntaxError> {
        let tok = self.tokens.get(self.pos).ok_or(SyntaxError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, want: Token) -> Result<(), SyntaxError> {
        let (tok, pos) = self.next()?;
        if *tok == want {
            Ok(())
        } else {
            Err(unexpected(tok, *pos))
        }
    }

    /// Runs `f` one nesting level deeper; `pos` is where the level opens.
    fn nested<T>(
        &mut self,
        pos: usize,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::TooDeep {
                max: MAX_NESTING,
                pos,
            });
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn or(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.and()?;
        while self.peek_keyword(0, "or") {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.not()?;
        while self.peek_keyword(0, "and") {
            self.pos += 1;
            let rhs = self.not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, SyntaxError> {
        if self.peek_keyword(0, "not") {
            let pos = self.tokens[self.pos].1;
            self.pos += 1;
            let inner = self.nested(pos, Self::not)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let lhs = self.primary()?;
        let op = match self.peek() {
            Some((Token::Eq, _)) => CompareOp::Eq,
            Some((Token::Ne, _)) => CompareOp::Ne,
            Some((Token::Lt, _)) => CompareOp::Lt,
            Some((Token::Le, _)) => CompareOp::Le,
            Some((Token::Gt, _)) => CompareOp::Gt,
            Some((Token::Ge, _)) => CompareOp::Ge,
            Some((Token::Ident(s), _)) if s == "in" => CompareOp::In,
            Some((Token::Ident(s), _)) if s == "not" && self.peek_keyword(1, "in") => {
                self.pos += 1;
                CompareOp::NotIn
            }
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.primary()?;
        Ok(Expr::Compare {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let (tok, pos) = self.next()?;
        match tok {
            Token::LParen => {
                let inner = self.nested(*pos, Self::or)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Str(s) => Ok(Expr::Literal(Value::String(s.clone()))),
            Token::Num(n) => Ok(Expr::Literal(number(*n))),
            Token::Ident(s) => match s.as_str() {
                "true" | "True" => Ok(Expr::Literal(Value::Bool(true))),
                "false" | "False" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "None" => Ok(Expr::Literal(Value::Null)),
                kw if KEYWORDS.contains(&kw) => Err(unexpected(tok, *pos)),
                root => self.path(root),
            },
            _ => Err(unexpected(tok, *pos)),
        }
    }

    fn path(&mut self, root: &str) -> Result<Expr, SyntaxError> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some((Token::Dot, _)) => {
                    self.pos += 1;
                    match self.next()? {
                        (Token::Ident(key), _) => segments.push(Segment::Key(key.clone())),
                        (tok, pos) => return Err(unexpected(tok, *pos)),
                    }
                }
                Some((Token::LBracket, _)) => {
                    self.pos += 1;
                    match self.next()? {
                        (Token::Str(key), _) => segments.push(Segment::Key(key.clone())),
                        (Token::Num(n), _) if *n >= 0.0 && n.fract() == 0.0 => {
                            segments.push(Segment::Index(*n as usize))
                        }
                        (tok, pos) => return Err(unexpected(tok, *pos)),
                    }
                    self.expect(Token::RBracket)?;
                }
                _ => break,
            }
        }
        Ok(Expr::Path {
            root: root.to_string(),
            segments,
        })
    }
}

/// Integral literals become JSON integers so `==` against body integers is exact.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn p(src: &str) -> Expr {
        parse(&tokenize(src).unwrap()).unwrap()
    }

    fn path(root: &str, segments: Vec<Segment>) -> Expr {
        Expr::Path {
            root: root.into(),
            segments,
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let e = p("a or b and c");
        assert_eq!(
            e,
            Expr::Or(
                Box::new(path("a", vec![])),
                Box::new(Expr::And(
                    Box::new(path("b", vec![])),
                    Box::new(path("c", vec![]))
                ))
            )
        );
    }

    #[test]
    fn mixed_path_segments() {
        let e = p("decoded_response['errors'][0].code");
        assert_eq!(
            e,
            path(
                "decoded_response",
                vec![
                    Segment::Key("errors".into()),
                    Segment::Index(0),
                    Segment::Key("code".into()),
                ]
            )
        );
    }

    #[test]
    fn not_in_is_a_single_operator() {
        let e = p("'x' not in response");
        assert!(matches!(e, Expr::Compare { op: CompareOp::NotIn, .. }));
        let e = p("not 'x' in response");
        assert!(matches!(e, Expr::Not(_)));
    }

    #[test]
    fn python_style_literals() {
        assert_eq!(p("True"), Expr::Literal(Value::Bool(true)));
        assert_eq!(p("None"), Expr::Literal(Value::Null));
        assert_eq!(p("42"), Expr::Literal(Value::from(42)));
    }

    #[test]
    fn unbalanced_parenthesis() {
        assert_eq!(
            parse(&tokenize("(a == 1").unwrap()),
            Err(SyntaxError::UnexpectedEnd)
        );
    }

    #[test]
    fn nesting_limit_is_a_syntax_error() {
        let ok = format!("{}a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(p(&ok), path("a", vec![]));

        let deep = format!("{}a{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(
            parse(&tokenize(&deep).unwrap()),
            Err(SyntaxError::TooDeep {
                max: MAX_NESTING,
                pos: MAX_NESTING
            })
        );

        let nots = format!("{}true", "not ".repeat(MAX_NESTING + 1));
        assert!(matches!(
            parse(&tokenize(&nots).unwrap()),
            Err(SyntaxError::TooDeep { .. })
        ));
    }

    #[test]
    fn very_deep_input_does_not_overflow() {
        let deep = format!("{}a{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            parse(&tokenize(&deep).unwrap()),
            Err(SyntaxError::TooDeep { .. })
        ));
    }

    #[test]
    fn keyword_cannot_start_an_operand() {
        assert!(matches!(
            parse(&tokenize("and a").unwrap()),
            Err(SyntaxError::UnexpectedToken { pos: 0, .. })
        ));
    }
}
