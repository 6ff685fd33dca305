//! Value types used by layouts and tables
//!
//! The layout validator never parses cell text itself: it asks the type
//! object. Primitive types cover the built-in value kinds; constrained types
//! refine a primitive with user-declared constraints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::constraint::Constraint;
use super::result::{ExecutionError, ExecutionResult};

/// Contract every value type exposes to the validator.
pub trait ValueType: fmt::Debug + Send + Sync {
    /// Display name used in diagnostics
    fn name(&self) -> &str;

    /// Whether the raw cell text is a valid value of this type
    fn is_valid(&self, raw: &str) -> bool;

    /// Parse the raw cell text into a typed value
    fn parse(&self, raw: &str) -> Option<PrimitiveValue>;
}

/// Shared handle to a value type
pub type ValueTypeRef = Arc<dyn ValueType>;

/// Built-in value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveValueType {
    Text,
    Integer,
    Decimal,
    Boolean,
}

impl PrimitiveValueType {
    /// Wrap into a shared [`ValueTypeRef`]
    pub fn shared(self) -> ValueTypeRef {
        Arc::new(self)
    }

    /// Whether numeric constraints apply to this type
    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveValueType::Integer | PrimitiveValueType::Decimal)
    }

    fn display_name(self) -> &'static str {
        match self {
            PrimitiveValueType::Text => "text",
            PrimitiveValueType::Integer => "integer",
            PrimitiveValueType::Decimal => "decimal",
            PrimitiveValueType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PrimitiveValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl ValueType for PrimitiveValueType {
    fn name(&self) -> &str {
        self.display_name()
    }

    fn is_valid(&self, raw: &str) -> bool {
        self.parse(raw).is_some()
    }

    fn parse(&self, raw: &str) -> Option<PrimitiveValue> {
        match self {
            PrimitiveValueType::Text => Some(PrimitiveValue::Text(raw.to_string())),
            PrimitiveValueType::Integer => raw.parse::<i64>().ok().map(PrimitiveValue::Integer),
            PrimitiveValueType::Decimal => parse_decimal(raw).map(PrimitiveValue::Decimal),
            PrimitiveValueType::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(PrimitiveValue::Boolean(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(PrimitiveValue::Boolean(false))
                } else {
                    None
                }
            }
        }
    }
}

/// Parse a decimal, accepting `,` as the decimal separator.
///
/// Rust's float parser also accepts `inf`/`NaN`; cell values must start with
/// a digit or a separator after the optional sign.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    let unsigned = raw.strip_prefix(&['+', '-'][..]).unwrap_or(raw);
    let first = unsigned.chars().next()?;
    if !(first.is_ascii_digit() || first == '.' || first == ',') {
        return None;
    }
    let normalized = raw.replacen(',', ".", 1);
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Typed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl PrimitiveValue {
    /// Type of the value
    pub fn value_type(&self) -> PrimitiveValueType {
        match self {
            PrimitiveValue::Text(_) => PrimitiveValueType::Text,
            PrimitiveValue::Integer(_) => PrimitiveValueType::Integer,
            PrimitiveValue::Decimal(_) => PrimitiveValueType::Decimal,
            PrimitiveValue::Boolean(_) => PrimitiveValueType::Boolean,
        }
    }
}

/// User-declared value type: a primitive base refined by constraints.
#[derive(Debug, Clone)]
pub struct ConstrainedValueType {
    name: String,
    base: PrimitiveValueType,
    constraints: Vec<Constraint>,
}

impl ConstrainedValueType {
    /// Create a constrained type.
    ///
    /// Every constraint must apply to `base`; otherwise a validation error
    /// naming the offending constraint is returned.
    pub fn new(
        name: impl Into<String>,
        base: PrimitiveValueType,
        constraints: Vec<Constraint>,
    ) -> ExecutionResult<Self> {
        let name = name.into();
        for constraint in &constraints {
            if !constraint.applies_to(base) {
                return Err(ExecutionError::validation(format!(
                    "Constraint `{}` cannot be applied to value type `{}` based on {}",
                    constraint.name, name, base
                ))
                .with_hint("Only use constraints that are compatible with the base type"));
            }
        }
        Ok(Self {
            name,
            base,
            constraints,
        })
    }

    pub fn base(&self) -> PrimitiveValueType {
        self.base
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn shared(self) -> ValueTypeRef {
        Arc::new(self)
    }
}

impl ValueType for ConstrainedValueType {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self, raw: &str) -> bool {
        self.base.is_valid(raw) && self.constraints.iter().all(|c| c.is_satisfied(raw))
    }

    fn parse(&self, raw: &str) -> Option<PrimitiveValue> {
        if self.is_valid(raw) {
            self.base.parse(raw)
        } else {
            None
        }
    }
}
