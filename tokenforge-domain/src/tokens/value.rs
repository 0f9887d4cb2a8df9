//! Token values and their parser.
//!
//! Raw JSON values are classified once, when a token is read:
//!
//! - `"$colors.red"` / `"{colors.red}"` covering the whole value: [`TokenValue::AliasRef`]
//! - arithmetic with at least one operator (`"$sizing.sm * 2"`, `"(4px + $gap) / 2"`):
//!   [`ExpressionBody::Arithmetic`]
//! - text that mentions aliases (`"1px solid $colors.red"`): [`ExpressionBody::Template`]
//! - objects and arrays: [`TokenValue::Composite`] / [`TokenValue::List`]
//! - anything else: [`TokenValue::Literal`]
//!
//! Alias names may contain `-`, so `$a-2` is the alias `a-2`. Write `$a - 2`
//! for subtraction. A `-` with space on one side only is a sign, so
//! `"0 -4px"` stays a literal.
//!
//! Text nested deeper than [`MAX_EXPRESSION_NESTING`] parentheses, or with
//! more than [`MAX_EXPRESSION_OPERATORS`] operators, is never parsed as
//! arithmetic.

use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize, verify},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Deepest parenthesis nesting accepted in arithmetic.
pub const MAX_EXPRESSION_NESTING: usize = 32;

/// Largest operator count accepted in arithmetic.
pub const MAX_EXPRESSION_OPERATORS: usize = 256;

static ALIAS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([\w.\-]+)|\{\s*([^{}]*?)\s*\}").expect("alias pattern is a valid regex")
});

/// A scalar JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Literal {
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(n.clone()),
            Literal::Text(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_char(c: char) -> Self {
        match c {
            '+' => Operator::Add,
            '-' => Operator::Sub,
            '*' => Operator::Mul,
            _ => Operator::Div,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        };
        f.write_str(symbol)
    }
}

/// Arithmetic expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number { value: f64, unit: Option<String> },
    Alias(String),
    Binary { op: Operator, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    fn collect_aliases<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number { .. } => {}
            Expr::Alias(name) => out.push(name),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_aliases(out);
                rhs.collect_aliases(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Alias(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionBody {
    Arithmetic(Expr),
    Template(Vec<TemplatePart>),
}

/// A parsed expression together with the text it was written as.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub source: String,
    pub body: ExpressionBody,
}

/// The value of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Literal(Literal),
    AliasRef { target: String, braced: bool },
    Expression(Expression),
    /// Object values such as typography or a single shadow.
    Composite(IndexMap<String, TokenValue>),
    /// Array values such as multiple shadows.
    List(Vec<TokenValue>),
}

impl TokenValue {
    pub fn text(s: impl Into<String>) -> Self {
        TokenValue::Literal(Literal::Text(s.into()))
    }

    pub fn alias(target: impl Into<String>) -> Self {
        TokenValue::AliasRef {
            target: target.into(),
            braced: false,
        }
    }

    /// Classifies a string value.
    pub fn parse(input: &str) -> Self {
        if let Ok((_, (target, braced))) = all_consuming(delimited(multispace0, whole_alias, multispace0))(input) {
            return TokenValue::AliasRef {
                target: target.to_string(),
                braced,
            };
        }
        if within_expression_limits(input) {
            let parsed = all_consuming(terminated(expression, multispace0))(input);
            if let Ok((_, expr @ Expr::Binary { .. })) = parsed {
                return TokenValue::Expression(Expression {
                    source: input.to_string(),
                    body: ExpressionBody::Arithmetic(expr),
                });
            }
        }
        let parts = template_parts(input);
        if parts.iter().any(|part| matches!(part, TemplatePart::Alias(_))) {
            return TokenValue::Expression(Expression {
                source: input.to_string(),
                body: ExpressionBody::Template(parts),
            });
        }
        TokenValue::text(input)
    }

    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => TokenValue::Literal(Literal::Null),
            Value::Bool(b) => TokenValue::Literal(Literal::Bool(b)),
            Value::Number(n) => TokenValue::Literal(Literal::Number(n)),
            Value::String(s) => TokenValue::parse(&s),
            Value::Array(items) => TokenValue::List(items.into_iter().map(TokenValue::from_json).collect()),
            Value::Object(map) => {
                TokenValue::Composite(map.into_iter().map(|(k, v)| (k, TokenValue::from_json(v))).collect())
            }
        }
    }

    /// The wire form; aliases and expressions are written as authored.
    pub fn to_json(&self) -> Value {
        match self {
            TokenValue::Literal(literal) => literal.to_json(),
            TokenValue::AliasRef { target, braced: false } => Value::String(format!("${}", target)),
            TokenValue::AliasRef { target, braced: true } => Value::String(format!("{{{}}}", target)),
            TokenValue::Expression(expression) => Value::String(expression.source.clone()),
            TokenValue::Composite(fields) => {
                Value::Object(fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            TokenValue::List(items) => Value::Array(items.iter().map(TokenValue::to_json).collect()),
        }
    }

    /// Every alias name this value mentions, in order of appearance.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TokenValue::Literal(_) => {}
            TokenValue::AliasRef { target, .. } => out.push(target),
            TokenValue::Expression(Expression {
                body: ExpressionBody::Arithmetic(expr),
                ..
            }) => expr.collect_aliases(out),
            TokenValue::Expression(Expression {
                body: ExpressionBody::Template(parts),
                ..
            }) => out.extend(parts.iter().filter_map(|part| match part {
                TemplatePart::Alias(name) => Some(name.as_str()),
                TemplatePart::Text(_) => None,
            })),
            TokenValue::Composite(fields) => fields.values().for_each(|v| v.collect_references(out)),
            TokenValue::List(items) => items.iter().for_each(|v| v.collect_references(out)),
        }
    }

    /// Rewrites alias names for which `rename` returns a replacement.
    /// Returns whether anything changed.
    pub fn rename_references(&mut self, rename: &dyn Fn(&str) -> Option<String>) -> bool {
        match self {
            TokenValue::Literal(_) => false,
            TokenValue::AliasRef { target, .. } => match rename(target) {
                Some(new_target) => {
                    *target = new_target;
                    true
                }
                None => false,
            },
            TokenValue::Expression(expression) => {
                let mut changed = false;
                let rewritten = ALIAS_PATTERN.replace_all(&expression.source, |caps: &Captures| {
                    let (name, braced) = match (caps.get(1), caps.get(2)) {
                        (Some(m), _) => (m.as_str(), false),
                        (None, Some(m)) => (m.as_str(), true),
                        (None, None) => return caps[0].to_string(),
                    };
                    match rename(name) {
                        Some(new_name) => {
                            changed = true;
                            if braced {
                                format!("{{{}}}", new_name)
                            } else {
                                format!("${}", new_name)
                            }
                        }
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();
                if changed {
                    *self = TokenValue::parse(&rewritten);
                }
                changed
            }
            TokenValue::Composite(fields) => fields
                .values_mut()
                .fold(false, |changed, v| v.rename_references(rename) || changed),
            TokenValue::List(items) => items.iter_mut().fold(false, |changed, v| v.rename_references(rename) || changed),
        }
    }
}

impl From<Value> for TokenValue {
    fn from(value: Value) -> Self {
        TokenValue::from_json(value)
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue::parse(value)
    }
}

impl Serialize for TokenValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TokenValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(TokenValue::from_json)
    }
}

fn is_alias_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn dollar_alias(input: &str) -> IResult<&str, &str> {
    preceded(char('$'), take_while1(is_alias_char))(input)
}

fn braced_alias(input: &str) -> IResult<&str, &str> {
    verify(
        map(delimited(char('{'), take_while1(|c: char| c != '{' && c != '}'), char('}')), str::trim),
        |name: &str| !name.is_empty(),
    )(input)
}

fn alias(input: &str) -> IResult<&str, &str> {
    alt((dollar_alias, braced_alias))(input)
}

fn whole_alias(input: &str) -> IResult<&str, (&str, bool)> {
    alt((map(dollar_alias, |n| (n, false)), map(braced_alias, |n| (n, true))))(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    let digits = recognize(tuple((
        opt(char('-')),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    )));
    map_res(pair(digits, opt(alt((tag("%"), alpha1)))), |(digits, unit): (&str, Option<&str>)| {
        digits.parse::<f64>().map(|value| Expr::Number {
            value,
            unit: unit.map(str::to_string),
        })
    })(input)
}

/// Parses a numeric scalar with an optional unit suffix (`4`, `1.5rem`, `50%`).
pub fn parse_quantity(input: &str) -> Option<(f64, Option<String>)> {
    match all_consuming(delimited(multispace0, number, multispace0))(input) {
        Ok((_, Expr::Number { value, unit })) => Some((value, unit)),
        _ => None,
    }
}

fn within_expression_limits(input: &str) -> bool {
    let mut depth = 0usize;
    let mut operators = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_EXPRESSION_NESTING {
                    return false;
                }
            }
            ')' => depth = depth.saturating_sub(1),
            '+' | '-' | '*' | '/' => {
                operators += 1;
                if operators > MAX_EXPRESSION_OPERATORS {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

fn factor(input: &str) -> IResult<&str, Expr> {
    preceded(
        multispace0,
        alt((
            number,
            map(alias, |name| Expr::Alias(name.to_string())),
            delimited(char('('), terminated(expression, multispace0), char(')')),
        )),
    )(input)
}

/// An operator from `ops`. `-` needs space on both sides or on neither,
/// otherwise it signs the following number.
fn operator<'a>(ops: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    move |input: &'a str| {
        let parsed: IResult<&'a str, (&'a str, char, &'a str)> =
            tuple((multispace0, one_of(ops), multispace0))(input);
        let (rest, (before, op, after)) = parsed?;
        if op == '-' && before.is_empty() != after.is_empty() {
            return Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::Verify)));
        }
        Ok((rest, op))
    }
}

fn fold_binary(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op: Operator::from_char(op),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn term(input: &str) -> IResult<&str, Expr> {
    map(pair(factor, many0(pair(operator("*/"), factor))), |(first, rest)| fold_binary(first, rest))(input)
}

fn expression(input: &str) -> IResult<&str, Expr> {
    map(pair(term, many0(pair(operator("+-"), term))), |(first, rest)| fold_binary(first, rest))(input)
}

fn template_parts(input: &str) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = input;
    while !rest.is_empty() {
        if let Ok((next, name)) = alias(rest) {
            if !text.is_empty() {
                parts.push(TemplatePart::Text(std::mem::take(&mut text)));
            }
            parts.push(TemplatePart::Alias(name.to_string()));
            rest = next;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            text.push(c);
        }
        rest = chars.as_str();
    }
    if !text.is_empty() {
        parts.push(TemplatePart::Text(text));
    }
    parts
}
