//! Boolean predicate expressions evaluated against response bodies.
//!
//! Expressions are parsed once into an [`Expr`] tree and evaluated over
//! `serde_json::Value`s. The language is deliberately small: paths into the
//! body, literals, comparisons, membership (`in`) and `and`/`or`/`not`.
//! Expressions may be wrapped in `{{ ... }}`.
//!
//! ```text
//! {{ 'code' in decoded_response }}
//! decoded_response.error.type == 'rate_limited' and status_code == 403
//! ```

mod eval;
mod lexer;
mod parser;

use serde_json::Value;
use thiserror::Error;

pub use eval::EvalContext;

/// Error raised while parsing a predicate expression.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unterminated string starting at offset {pos}")]
    UnterminatedString { pos: usize },
    #[error("invalid number '{text}' at offset {pos}")]
    InvalidNumber { text: String, pos: usize },
    #[error("unexpected '{found}' at offset {pos}")]
    UnexpectedToken { found: String, pos: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("empty expression")]
    Empty,
    #[error("expression nested deeper than {max} levels at offset {pos}")]
    TooDeep { max: usize, pos: usize },
}

/// Error raised while evaluating a parsed predicate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredicateError {
    #[error("response body is not JSON")]
    NoBody,
    #[error("no value at '{0}'")]
    MissingField(String),
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
}

/// One step of a path into a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        }
    }
}

/// Parsed predicate expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path { root: String, segments: Vec<Segment> },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        lhs: Box<Expr>,
        op: CompareOp,
        rhs: Box<Expr>,
    },
}

/// A compiled predicate, ready to be evaluated against many exchanges.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// Parses `source`, stripping an optional `{{ ... }}` wrapper.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let inner = strip_template(source);
        let tokens = lexer::tokenize(inner)?;
        let expr = parser::parse(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates the predicate and reduces the result to its truthiness.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<bool, PredicateError> {
        eval::evaluate(&self.expr, ctx).map(|v| eval::truthy(&v))
    }
}

fn strip_template(source: &str) -> &str {
    let trimmed = source.trim();
    trimmed
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
