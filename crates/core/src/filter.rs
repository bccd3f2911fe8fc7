//! Payload filters for search
//!
//! A [`Filter`] is a conjunction: every condition must hold. Each condition
//! applies to one top-level payload key.
//!
//! Adapters translate filters into their backend's native syntax. A condition
//! the backend cannot express fails with
//! [`ValidationError::UnsupportedFilter`]; it is never dropped.
//!
//! Filters can be built in code or parsed from the JSON form callers pass
//! around as plain mappings:
//!
//! ```json
//! {"cat": "x", "year": {"$gte": 2020, "$lt": 2024}, "tag": {"$in": ["a", "b"]}}
//! ```

use crate::error::ValidationError;
use crate::record::{Payload, PayloadValue};
use crate::validate::RESERVED_PAYLOAD_KEYS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric range; every present bound must hold
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Range {
    /// Exclusive lower bound
    pub gt: Option<f64>,
    /// Inclusive lower bound
    pub gte: Option<f64>,
    /// Exclusive upper bound
    pub lt: Option<f64>,
    /// Inclusive upper bound
    pub lte: Option<f64>,
}

impl Range {
    /// Unbounded range (invalid until a bound is set)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exclusive lower bound
    pub fn gt(mut self, v: f64) -> Self {
        self.gt = Some(v);
        self
    }

    /// Set the inclusive lower bound
    pub fn gte(mut self, v: f64) -> Self {
        self.gte = Some(v);
        self
    }

    /// Set the exclusive upper bound
    pub fn lt(mut self, v: f64) -> Self {
        self.lt = Some(v);
        self
    }

    /// Set the inclusive upper bound
    pub fn lte(mut self, v: f64) -> Self {
        self.lte = Some(v);
        self
    }

    /// Whether no bound is set
    pub fn is_unbounded(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }

    /// Present bounds as `(operator, value)` pairs in a fixed order
    pub fn bounds(&self) -> Vec<(&'static str, f64)> {
        let mut out = Vec::with_capacity(4);
        if let Some(v) = self.gt {
            out.push(("$gt", v));
        }
        if let Some(v) = self.gte {
            out.push(("$gte", v));
        }
        if let Some(v) = self.lt {
            out.push(("$lt", v));
        }
        if let Some(v) = self.lte {
            out.push(("$lte", v));
        }
        out
    }

    /// Check a number against every bound
    pub fn contains(&self, n: f64) -> bool {
        self.gt.map_or(true, |b| n > b)
            && self.gte.map_or(true, |b| n >= b)
            && self.lt.map_or(true, |b| n < b)
            && self.lte.map_or(true, |b| n <= b)
    }
}

/// Constraint on one payload key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `payload[key] == value`
    Eq(PayloadValue),
    /// `payload[key] != value` (records without the key do not match)
    NotEq(PayloadValue),
    /// Numeric range
    Range(Range),
    /// `payload[key]` is one of the values
    AnyOf(Vec<PayloadValue>),
    /// String prefix match
    Prefix(String),
}

impl Condition {
    /// Operator name used in messages and in the JSON form
    pub fn operator(&self) -> &'static str {
        match self {
            Condition::Eq(_) => "$eq",
            Condition::NotEq(_) => "$ne",
            Condition::Range(_) => "$range",
            Condition::AnyOf(_) => "$in",
            Condition::Prefix(_) => "$prefix",
        }
    }

    /// Evaluate against one payload value (`None` when the key is absent)
    pub fn matches(&self, value: Option<&PayloadValue>) -> bool {
        match (self, value) {
            (Condition::Eq(expected), Some(actual)) => expected.loosely_equals(actual),
            (Condition::NotEq(expected), Some(actual)) => !expected.loosely_equals(actual),
            (Condition::Range(range), Some(actual)) => {
                actual.as_f64().is_some_and(|n| range.contains(n))
            }
            (Condition::AnyOf(values), Some(actual)) => {
                values.iter().any(|v| v.loosely_equals(actual))
            }
            (Condition::Prefix(prefix), Some(PayloadValue::String(s))) => s.starts_with(prefix),
            _ => false,
        }
    }

    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFilter {
            field: field.to_string(),
            reason: reason.to_string(),
        };
        match self {
            Condition::Range(range) => {
                if range.is_unbounded() {
                    return Err(invalid("range has no bounds"));
                }
                if range.bounds().iter().any(|(_, v)| !v.is_finite()) {
                    return Err(invalid("range bounds must be finite"));
                }
            }
            Condition::AnyOf(values) => {
                if values.is_empty() {
                    return Err(invalid("$in needs at least one value"));
                }
                let first = values[0].type_name();
                if values.iter().any(|v| v.type_name() != first) {
                    return Err(invalid("$in values must share one type"));
                }
            }
            Condition::Eq(PayloadValue::Float(f)) | Condition::NotEq(PayloadValue::Float(f))
                if !f.is_finite() =>
            {
                return Err(invalid("value must be finite"));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Conjunctive payload filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, replacing any existing condition on the key
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    /// Add an equality condition
    pub fn eq(self, field: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.with(field, Condition::Eq(value.into()))
    }

    /// Add an inequality condition
    pub fn not_eq(self, field: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.with(field, Condition::NotEq(value.into()))
    }

    /// Add a numeric range condition
    pub fn range(self, field: impl Into<String>, range: Range) -> Self {
        self.with(field, Condition::Range(range))
    }

    /// Add a membership condition
    pub fn any_of<V: Into<PayloadValue>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.with(
            field,
            Condition::AnyOf(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Add a string prefix condition
    pub fn prefix(self, field: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.with(field, Condition::Prefix(prefix.into()))
    }

    /// Conditions in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.conditions.iter()
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Check the filter is well-formed
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, condition) in &self.conditions {
            if field.is_empty() {
                return Err(ValidationError::InvalidFilter {
                    field: field.clone(),
                    reason: "empty key".to_string(),
                });
            }
            if RESERVED_PAYLOAD_KEYS.contains(&field.as_str()) {
                return Err(ValidationError::ReservedPayloadKey(field.clone()));
            }
            condition.validate(field)?;
        }
        Ok(())
    }

    /// Evaluate against a payload
    pub fn matches(&self, payload: &Payload) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(payload.get(field)))
    }

    /// Parse the JSON mapping form
    ///
    /// A scalar value means equality; an object holds operators (`$eq`,
    /// `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$prefix`). Range bounds
    /// on one key combine into one range. Any other operator fails with
    /// `UnsupportedFilter`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or_else(|| ValidationError::InvalidFilter {
            field: String::new(),
            reason: "filter must be a JSON object".to_string(),
        })?;

        let mut filter = Filter::new();
        for (field, spec) in object {
            let condition = match spec {
                serde_json::Value::Object(ops) => parse_operators(field, ops)?,
                other => Condition::Eq(scalar(field, other)?),
            };
            filter = filter.with(field.clone(), condition);
        }
        filter.validate()?;
        Ok(filter)
    }
}

fn scalar(field: &str, value: &serde_json::Value) -> Result<PayloadValue, ValidationError> {
    PayloadValue::from_json(value).ok_or_else(|| ValidationError::InvalidFilter {
        field: field.to_string(),
        reason: format!("expected a scalar, got {}", value),
    })
}

fn number(field: &str, value: &serde_json::Value) -> Result<f64, ValidationError> {
    value.as_f64().ok_or_else(|| ValidationError::InvalidFilter {
        field: field.to_string(),
        reason: format!("range bound must be a number, got {}", value),
    })
}

fn parse_operators(
    field: &str,
    ops: &serde_json::Map<String, serde_json::Value>,
) -> Result<Condition, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFilter {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let mut range = Range::new();
    let mut single: Option<Condition> = None;

    for (op, arg) in ops {
        let condition = match op.as_str() {
            "$gt" => {
                range.gt = Some(number(field, arg)?);
                None
            }
            "$gte" => {
                range.gte = Some(number(field, arg)?);
                None
            }
            "$lt" => {
                range.lt = Some(number(field, arg)?);
                None
            }
            "$lte" => {
                range.lte = Some(number(field, arg)?);
                None
            }
            "$eq" => Some(Condition::Eq(scalar(field, arg)?)),
            "$ne" => Some(Condition::NotEq(scalar(field, arg)?)),
            "$in" => {
                let items = arg.as_array().ok_or_else(|| invalid("$in expects an array"))?;
                let values = items
                    .iter()
                    .map(|v| scalar(field, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(Condition::AnyOf(values))
            }
            "$prefix" => {
                let prefix = arg.as_str().ok_or_else(|| invalid("$prefix expects a string"))?;
                Some(Condition::Prefix(prefix.to_string()))
            }
            other => {
                return Err(ValidationError::UnsupportedFilter {
                    field: field.to_string(),
                    operator: other.to_string(),
                    target: "filter syntax".to_string(),
                })
            }
        };
        if let Some(condition) = condition {
            if single.is_some() {
                return Err(invalid("only one non-range operator per key"));
            }
            single = Some(condition);
        }
    }

    match (single, range.is_unbounded()) {
        (Some(condition), true) => Ok(condition),
        (None, false) => Ok(Condition::Range(range)),
        (Some(_), false) => Err(invalid("range bounds cannot be combined with other operators")),
        (None, true) => Err(invalid("no operators given")),
    }
}
