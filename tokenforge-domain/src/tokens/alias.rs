//! Alias resolution.
//!
//! [`AliasResolver`] dereferences aliases against a lookup universe, evaluates
//! arithmetic once every operand is numeric and interpolates templates. Each
//! reference walk carries the current resolution path; meeting a name that is
//! already on the path fails with [`ResolutionError::Cycle`] for that token
//! only. Results are memoised per resolver instance.

use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

use super::errors::ResolutionError;
use super::types::{Token, TokenSet};
use super::value::{parse_quantity, Expr, Expression, ExpressionBody, Operator, TemplatePart, TokenValue};

/// Maximum length of an alias chain.
pub const MAX_ALIAS_DEPTH: usize = 32;

/// Decimal places kept in arithmetic results.
const RESULT_PRECISION: f64 = 1000.0;

/// Outcome of resolving one token.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Resolved(Value),
    Unresolved(ResolutionError),
}

impl ResolvedValue {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedValue::Resolved(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ResolvedValue::Resolved(value) => Some(value),
            ResolvedValue::Unresolved(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ResolutionError> {
        match self {
            ResolvedValue::Resolved(_) => None,
            ResolvedValue::Unresolved(err) => Some(err),
        }
    }
}

impl From<Result<Value, ResolutionError>> for ResolvedValue {
    fn from(result: Result<Value, ResolutionError>) -> Self {
        match result {
            Ok(value) => ResolvedValue::Resolved(value),
            Err(err) => ResolvedValue::Unresolved(err),
        }
    }
}

/// The universe aliases are looked up in.
pub trait TokenLookup {
    fn lookup(&self, name: &str) -> Option<&TokenValue>;
}

impl TokenLookup for TokenSet {
    fn lookup(&self, name: &str) -> Option<&TokenValue> {
        self.get(name).map(|token| &token.value)
    }
}

impl TokenLookup for IndexMap<String, Token> {
    fn lookup(&self, name: &str) -> Option<&TokenValue> {
        self.get(name).map(|token| &token.value)
    }
}

impl TokenLookup for IndexMap<String, TokenValue> {
    fn lookup(&self, name: &str) -> Option<&TokenValue> {
        self.get(name)
    }
}

impl TokenLookup for HashMap<String, TokenValue> {
    fn lookup(&self, name: &str) -> Option<&TokenValue> {
        self.get(name)
    }
}

/// Resolves `token` against `universe` with a fresh resolver.
pub fn resolve<L: TokenLookup + ?Sized>(token: &Token, universe: &L) -> ResolvedValue {
    AliasResolver::new(universe).resolve(token)
}

/// A numeric operand with an optional unit.
#[derive(Debug, Clone, PartialEq)]
struct Quantity {
    value: f64,
    unit: Option<String>,
}

impl Quantity {
    fn describe(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}{}", format_number(self.value), unit),
            None => format_number(self.value),
        }
    }

    fn apply(self, op: Operator, rhs: Quantity) -> Result<Quantity, ResolutionError> {
        let incompatible = |lhs: &Quantity, rhs: &Quantity| ResolutionError::IncompatibleUnits {
            op: op.to_string(),
            left: lhs.describe(),
            right: rhs.describe(),
        };
        let unit = match op {
            Operator::Add | Operator::Sub => match (&self.unit, &rhs.unit) {
                (Some(l), Some(r)) if l != r => return Err(incompatible(&self, &rhs)),
                (l, r) => l.clone().or_else(|| r.clone()),
            },
            Operator::Mul => match (&self.unit, &rhs.unit) {
                (Some(_), Some(_)) => return Err(incompatible(&self, &rhs)),
                (l, r) => l.clone().or_else(|| r.clone()),
            },
            Operator::Div => {
                if rhs.value == 0.0 {
                    return Err(ResolutionError::DivisionByZero);
                }
                match (&self.unit, &rhs.unit) {
                    (l, None) => l.clone(),
                    (Some(l), Some(r)) if l == r => None,
                    _ => return Err(incompatible(&self, &rhs)),
                }
            }
        };
        let value = match op {
            Operator::Add => self.value + rhs.value,
            Operator::Sub => self.value - rhs.value,
            Operator::Mul => self.value * rhs.value,
            Operator::Div => self.value / rhs.value,
        };
        if !value.is_finite() {
            return Err(ResolutionError::NonFiniteResult);
        }
        Ok(Quantity { value, unit })
    }

    fn into_json(self) -> Result<Value, ResolutionError> {
        let rounded = (self.value * RESULT_PRECISION).round() / RESULT_PRECISION;
        match self.unit {
            Some(unit) => Ok(Value::String(format!("{}{}", format_number(rounded), unit))),
            None if is_integral(rounded) => Ok(Value::from(rounded as i64)),
            None => Number::from_f64(rounded)
                .map(Value::Number)
                .ok_or(ResolutionError::NonFiniteResult),
        }
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < 9.0e15
}

fn format_number(value: f64) -> String {
    if is_integral(value) {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Memoising alias resolver over one lookup universe.
pub struct AliasResolver<'a, L: TokenLookup + ?Sized> {
    universe: &'a L,
    cache: HashMap<String, Result<Value, ResolutionError>>,
}

impl<'a, L: TokenLookup + ?Sized> AliasResolver<'a, L> {
    pub fn new(universe: &'a L) -> Self {
        Self {
            universe,
            cache: HashMap::new(),
        }
    }

    /// Resolves a token. When the token is part of the universe its result
    /// is shared with every alias that points at it.
    pub fn resolve(&mut self, token: &Token) -> ResolvedValue {
        let universe = self.universe;
        let result = match universe.lookup(&token.name) {
            Some(value) if value == &token.value => self.resolve_reference(&token.name, &mut Vec::new()),
            _ => {
                let mut path = vec![token.name.clone()];
                self.evaluate(&token.value, &mut path)
            }
        };
        if let Err(err) = &result {
            debug!("Token '{}' is unresolved: {}", token.name, err);
        }
        result.into()
    }

    /// Resolves a free-standing value, e.g. one being typed in an editor.
    pub fn resolve_value(&mut self, value: &TokenValue) -> ResolvedValue {
        self.evaluate(value, &mut Vec::new()).into()
    }

    fn resolve_reference(&mut self, name: &str, path: &mut Vec<String>) -> Result<Value, ResolutionError> {
        if path.iter().any(|visited| visited == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(ResolutionError::Cycle { path: cycle });
        }
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }
        if path.len() >= MAX_ALIAS_DEPTH {
            return Err(ResolutionError::DepthExceeded {
                max_depth: MAX_ALIAS_DEPTH,
            });
        }
        let universe = self.universe;
        let value = universe.lookup(name).ok_or_else(|| ResolutionError::MissingReference {
            name: name.to_string(),
        })?;

        trace!("Resolving '{}' (depth {})", name, path.len());
        path.push(name.to_string());
        let result = self.evaluate(value, path);
        path.pop();

        // Depth failures depend on where the walk started.
        if !matches!(result, Err(ResolutionError::DepthExceeded { .. })) {
            self.cache.insert(name.to_string(), result.clone());
        }
        result
    }

    fn evaluate(&mut self, value: &TokenValue, path: &mut Vec<String>) -> Result<Value, ResolutionError> {
        match value {
            TokenValue::Literal(literal) => Ok(literal.to_json()),
            TokenValue::AliasRef { target, .. } => self.resolve_reference(target, path),
            TokenValue::Expression(Expression {
                body: ExpressionBody::Arithmetic(expr),
                ..
            }) => self.evaluate_arithmetic(expr, path)?.into_json(),
            TokenValue::Expression(Expression {
                body: ExpressionBody::Template(parts),
                ..
            }) => self.interpolate(parts, path).map(Value::String),
            TokenValue::Composite(fields) => {
                let mut resolved = serde_json::Map::with_capacity(fields.len());
                for (key, field) in fields {
                    resolved.insert(key.clone(), self.evaluate(field, path)?);
                }
                Ok(Value::Object(resolved))
            }
            TokenValue::List(items) => items
                .iter()
                .map(|item| self.evaluate(item, path))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    fn evaluate_arithmetic(&mut self, expr: &Expr, path: &mut Vec<String>) -> Result<Quantity, ResolutionError> {
        match expr {
            Expr::Number { value, unit } => Ok(Quantity {
                value: *value,
                unit: unit.clone(),
            }),
            Expr::Alias(name) => {
                let resolved = self.resolve_reference(name, path)?;
                to_quantity(name, &resolved)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate_arithmetic(lhs, path)?;
                let rhs = self.evaluate_arithmetic(rhs, path)?;
                lhs.apply(*op, rhs)
            }
        }
    }

    fn interpolate(&mut self, parts: &[TemplatePart], path: &mut Vec<String>) -> Result<String, ResolutionError> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Alias(name) => match self.resolve_reference(name, path)? {
                    Value::String(s) => out.push_str(&s),
                    Value::Number(n) => out.push_str(&n.to_string()),
                    Value::Bool(b) => out.push_str(if b { "true" } else { "false" }),
                    _ => return Err(ResolutionError::NonScalarInterpolation { name: name.clone() }),
                },
            }
        }
        Ok(out)
    }
}

fn to_quantity(name: &str, value: &Value) -> Result<Quantity, ResolutionError> {
    let non_numeric = || ResolutionError::NonNumericOperand {
        name: name.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n.as_f64().map(|value| Quantity { value, unit: None }).ok_or_else(non_numeric),
        Value::String(s) => parse_quantity(s)
            .map(|(value, unit)| Quantity { value, unit })
            .ok_or_else(non_numeric),
        _ => Err(non_numeric()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::types::TokenType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(entries: &[(&str, Value)]) -> TokenSet {
        TokenSet::from_tokens(
            entries
                .iter()
                .map(|(name, value)| Token::new(*name, TokenType::Sizing, TokenValue::from(value.clone()))),
        )
    }

    fn resolve_in(universe: &TokenSet, name: &str) -> ResolvedValue {
        let token = universe.get(name).expect("token under test exists");
        resolve(token, universe)
    }

    #[test]
    fn test_arithmetic_over_alias() {
        let universe = set(&[("sizing.sm", json!(4)), ("sizing.md", json!("$sizing.sm * 2"))]);
        assert_eq!(resolve_in(&universe, "sizing.md"), ResolvedValue::Resolved(json!(8)));
    }

    #[test]
    fn test_missing_operand_is_unresolved() {
        let universe = set(&[("sizing.md", json!("$sizing.sm * 2"))]);
        assert_eq!(
            resolve_in(&universe, "sizing.md"),
            ResolvedValue::Unresolved(ResolutionError::MissingReference {
                name: "sizing.sm".into()
            })
        );
    }

    #[test]
    fn test_units_are_carried_and_checked() {
        let universe = set(&[
            ("base", json!("4px")),
            ("double", json!("$base * 2")),
            ("half", json!("$base / 2")),
            ("ratio", json!("$base / 2px")),
            ("sum", json!("$base + 1")),
            ("mixed", json!("$base + 1rem")),
            ("third", json!("10 / 3")),
        ]);
        assert_eq!(resolve_in(&universe, "double"), ResolvedValue::Resolved(json!("8px")));
        assert_eq!(resolve_in(&universe, "half"), ResolvedValue::Resolved(json!("2px")));
        assert_eq!(resolve_in(&universe, "ratio"), ResolvedValue::Resolved(json!(2)));
        assert_eq!(resolve_in(&universe, "sum"), ResolvedValue::Resolved(json!("5px")));
        assert_eq!(resolve_in(&universe, "third"), ResolvedValue::Resolved(json!(3.333)));
        assert!(matches!(
            resolve_in(&universe, "mixed"),
            ResolvedValue::Unresolved(ResolutionError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn test_division_by_zero() {
        let universe = set(&[("zero", json!(0)), ("broken", json!("4 / $zero"))]);
        assert_eq!(
            resolve_in(&universe, "broken"),
            ResolvedValue::Unresolved(ResolutionError::DivisionByZero)
        );
    }

    #[test]
    fn test_non_numeric_operand() {
        let universe = set(&[("font", json!("Inter")), ("bad", json!("$font * 2"))]);
        assert!(matches!(
            resolve_in(&universe, "bad"),
            ResolvedValue::Unresolved(ResolutionError::NonNumericOperand { ref name, .. }) if name == "font"
        ));
    }

    #[test]
    fn test_cycle_fails_only_members() {
        let universe = set(&[
            ("a", json!("$b")),
            ("b", json!("$c")),
            ("c", json!("$a")),
            ("d", json!(12)),
            ("e", json!("$d + 1")),
        ]);
        let mut resolver = AliasResolver::new(&universe);
        for name in ["a", "b", "c"] {
            let result = resolver.resolve(universe.get(name).unwrap());
            assert!(
                matches!(result, ResolvedValue::Unresolved(ref err) if err.is_cycle()),
                "{} should be cyclic, got {:?}",
                name,
                result
            );
        }
        assert_eq!(resolver.resolve(universe.get("e").unwrap()), ResolvedValue::Resolved(json!(13)));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let universe = set(&[("loop", json!("$loop + 1"))]);
        assert_eq!(
            resolve_in(&universe, "loop"),
            ResolvedValue::Unresolved(ResolutionError::Cycle {
                path: vec!["loop".into(), "loop".into()]
            })
        );
    }

    #[test]
    fn test_template_and_composite() {
        let universe = set(&[
            ("colors.red", json!("#ff0000")),
            ("border.default", json!("1px solid {colors.red}")),
            ("shadow", json!({"color": "$colors.red", "blur": "$blur * 2"})),
            ("blur", json!(3)),
            ("nested", json!("$shadow")),
            ("bad", json!("0 0 $shadow")),
        ]);
        assert_eq!(
            resolve_in(&universe, "border.default"),
            ResolvedValue::Resolved(json!("1px solid #ff0000"))
        );
        assert_eq!(
            resolve_in(&universe, "nested"),
            ResolvedValue::Resolved(json!({"color": "#ff0000", "blur": 6}))
        );
        assert_eq!(
            resolve_in(&universe, "bad"),
            ResolvedValue::Unresolved(ResolutionError::NonScalarInterpolation { name: "shadow".into() })
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut entries: Vec<(String, Value)> = (0..40).map(|i| (format!("t{}", i), json!(format!("$t{}", i + 1)))).collect();
        entries.push(("t40".to_string(), json!(1)));
        let universe = TokenSet::from_tokens(
            entries
                .into_iter()
                .map(|(name, value)| Token::new(name, TokenType::Other, TokenValue::from(value))),
        );
        assert_eq!(
            resolve_in(&universe, "t0"),
            ResolvedValue::Unresolved(ResolutionError::DepthExceeded {
                max_depth: MAX_ALIAS_DEPTH
            })
        );
        // A shorter chain from further down still resolves.
        assert_eq!(resolve_in(&universe, "t20"), ResolvedValue::Resolved(json!(1)));
    }

    #[test]
    fn test_resolve_value_outside_universe() {
        let universe = set(&[("sizing.sm", json!("4px"))]);
        let mut resolver = AliasResolver::new(&universe);
        assert_eq!(
            resolver.resolve_value(&TokenValue::parse("$sizing.sm + 2")),
            ResolvedValue::Resolved(json!("6px"))
        );
    }
}
