//! Condition language: parsing and evaluation of rule predicates.
//!
//! Conditions look like `CHR>=10 & (TLT?[1001,1002] | EVT![20010])`.
//! `&` binds tighter than `|` and parentheses group. A condition that cannot
//! be parsed is kept around for linting but never matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("empty expression")]
    Empty,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("no comparison operator in '{0}'")]
    MissingOperator(String),
    #[error("missing variable name in '{0}'")]
    MissingVariable(String),
    #[error("invalid comparison value '{0}'")]
    InvalidValue(String),
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
    /// `?`: the variable shares at least one element with the array.
    IncludesAny,
    /// `!`: the variable shares no element with the array.
    ExcludesAll,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i32),
    Float(f64),
    List(Vec<i32>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        variable: String,
        op: Operator,
        operand: Operand,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A variable value as seen by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int(i32),
    List(&'a [i32]),
}

/// Anything conditions can be evaluated against.
pub trait Variables {
    /// Returns `None` for names the source does not know.
    fn lookup(&self, name: &str) -> Option<Value<'_>>;
}

impl Expr {
    pub fn parse(input: &str) -> Result<Expr, ConditionError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(ConditionError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(ConditionError::UnexpectedToken(format!("{:?}", tok))),
        }
    }

    pub fn eval(&self, vars: &dyn Variables) -> bool {
        match self {
            Expr::And(left, right) => left.eval(vars) && right.eval(vars),
            Expr::Or(left, right) => left.eval(vars) || right.eval(vars),
            Expr::Compare {
                variable,
                op,
                operand,
            } => match vars.lookup(variable) {
                Some(value) => compare(value, *op, operand),
                None => false,
            },
        }
    }
}

fn compare(value: Value<'_>, op: Operator, operand: &Operand) -> bool {
    use Operator::*;
    match (value, operand) {
        (Value::Int(v), Operand::Int(c)) => match op {
            Greater => v > *c,
            Less => v < *c,
            GreaterEqual => v >= *c,
            LessEqual => v <= *c,
            Equal => v == *c,
            NotEqual => v != *c,
            IncludesAny | ExcludesAll => false,
        },
        (Value::Int(v), Operand::Float(c)) => {
            let v = v as f64;
            match op {
                Greater => v > *c,
                Less => v < *c,
                GreaterEqual => v >= *c,
                LessEqual => v <= *c,
                Equal => v == *c,
                NotEqual => v != *c,
                IncludesAny | ExcludesAll => false,
            }
        }
        (Value::Int(v), Operand::List(arr)) => match op {
            IncludesAny => arr.contains(&v),
            ExcludesAll => !arr.contains(&v),
            _ => false,
        },
        (Value::List(list), Operand::Int(c)) => match op {
            Equal => list.contains(c),
            NotEqual => !list.contains(c),
            _ => false,
        },
        (Value::List(list), Operand::List(arr)) => match op {
            IncludesAny => list.iter().any(|v| arr.contains(v)),
            ExcludesAll => list.iter().all(|v| !arr.contains(v)),
            _ => false,
        },
        (Value::List(_), Operand::Float(_)) => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Atom(String),
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut atom = String::new();
    let mut depth = 0i32;

    fn flush(atom: &mut String, tokens: &mut Vec<Token>) {
        if !atom.is_empty() {
            tokens.push(Token::Atom(std::mem::take(atom)));
        }
    }

    for c in input.chars() {
        match c {
            '&' => {
                flush(&mut atom, &mut tokens);
                tokens.push(Token::And);
            }
            '|' => {
                flush(&mut atom, &mut tokens);
                tokens.push(Token::Or);
            }
            '(' => {
                flush(&mut atom, &mut tokens);
                tokens.push(Token::Open);
                depth += 1;
            }
            ')' => {
                flush(&mut atom, &mut tokens);
                tokens.push(Token::Close);
                depth -= 1;
                if depth < 0 {
                    return Err(ConditionError::UnbalancedParens);
                }
            }
            c if c.is_whitespace() => {}
            c => atom.push(c),
        }
    }
    flush(&mut atom, &mut tokens);

    if depth != 0 {
        return Err(ConditionError::UnbalancedParens);
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_factor()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_factor()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ConditionError> {
        match self.next() {
            Some(Token::Atom(atom)) => parse_comparison(&atom),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(ConditionError::UnbalancedParens),
                }
            }
            Some(tok) => Err(ConditionError::UnexpectedToken(format!("{:?}", tok))),
            None => Err(ConditionError::Empty),
        }
    }
}

fn parse_comparison(atom: &str) -> Result<Expr, ConditionError> {
    let pos = atom
        .find(&['>', '<', '=', '!', '?'][..])
        .ok_or_else(|| ConditionError::MissingOperator(atom.to_string()))?;
    let variable = &atom[..pos];
    if variable.is_empty() || !variable.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConditionError::MissingVariable(atom.to_string()));
    }

    let rest = &atom[pos..];
    let (op, width) = if rest.starts_with(">=") {
        (Operator::GreaterEqual, 2)
    } else if rest.starts_with("<=") {
        (Operator::LessEqual, 2)
    } else if rest.starts_with("!=") {
        (Operator::NotEqual, 2)
    } else {
        match rest.as_bytes()[0] {
            b'>' => (Operator::Greater, 1),
            b'<' => (Operator::Less, 1),
            b'=' => (Operator::Equal, 1),
            b'?' => (Operator::IncludesAny, 1),
            _ => (Operator::ExcludesAll, 1),
        }
    };

    let operand = parse_operand(&rest[width..])?;
    Ok(Expr::Compare {
        variable: variable.to_string(),
        op,
        operand,
    })
}

fn parse_operand(raw: &str) -> Result<Operand, ConditionError> {
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        if inner.is_empty() {
            return Ok(Operand::List(Vec::new()));
        }
        return inner
            .split(',')
            .map(|s| s.parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Operand::List)
            .map_err(|_| ConditionError::InvalidValue(raw.to_string()));
    }
    if let Ok(i) = raw.parse::<i32>() {
        return Ok(Operand::Int(i));
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Operand::Float(f)),
        _ => Err(ConditionError::InvalidValue(raw.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Compiled {
    Always,
    Expr(Expr),
    Invalid(ConditionError),
}

/// A predicate from configuration, compiled once and evaluated many times.
///
/// An empty source always matches; a malformed one never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Condition {
    source: String,
    compiled: Compiled,
}

impl Condition {
    pub fn parse(source: &str) -> Condition {
        let compiled = if source.trim().is_empty() {
            Compiled::Always
        } else {
            match Expr::parse(source) {
                Ok(expr) => Compiled::Expr(expr),
                Err(err) => Compiled::Invalid(err),
            }
        };
        Condition {
            source: source.to_string(),
            compiled,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parse error, if this condition is malformed.
    pub fn error(&self) -> Option<&ConditionError> {
        match &self.compiled {
            Compiled::Invalid(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error().is_none()
    }

    pub fn check(&self, vars: &dyn Variables) -> bool {
        match &self.compiled {
            Compiled::Always => true,
            Compiled::Expr(expr) => expr.eval(vars),
            Compiled::Invalid(_) => false,
        }
    }
}

impl From<String> for Condition {
    fn from(source: String) -> Self {
        Condition::parse(&source)
    }
}

impl From<&str> for Condition {
    fn from(source: &str) -> Self {
        Condition::parse(source)
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.source
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
