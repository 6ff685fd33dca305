//! Evaluated property values of block definitions
//!
//! Property expressions are evaluated before the engine sees them; a block
//! only ever reads these literal values.

use std::fmt;
use std::sync::Arc;

use crate::layout::Layout;

/// Property value
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    /// List of values
    List(Vec<PropertyValue>),
    /// Layout declaration, shared between blocks that reference it
    Layout(Arc<Layout>),
    Null,
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to decimals
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            PropertyValue::Decimal(n) => Some(*n),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_layout(&self) -> Option<&Arc<Layout>> {
        match self {
            PropertyValue::Layout(layout) => Some(layout),
            _ => None,
        }
    }

    /// Name of the value's kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Text(_) => "text",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Decimal(_) => "decimal",
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::List(_) => "list",
            PropertyValue::Layout(_) => "layout",
            PropertyValue::Null => "null",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "\"{}\"", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Decimal(n) => write!(f, "{}", n),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            PropertyValue::Layout(layout) => {
                write!(f, "layout with {} section(s)", layout.sections().len())
            }
            PropertyValue::Null => f.write_str("null"),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Decimal(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Layout> for PropertyValue {
    fn from(layout: Layout) -> Self {
        PropertyValue::Layout(Arc::new(layout))
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}
