//! Constraint system for user-declared value types
//!
//! A constraint narrows the set of valid values of a primitive base type.
//! Constraints are checked against raw cell text, the same way the base type
//! is, so a constrained type stays a pure `is_valid(raw)` predicate.

use regex::Regex;

use super::result::{ExecutionError, ExecutionResult};
use super::value_type::{parse_decimal, PrimitiveValueType};

/// A named constraint
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name the constraint was declared with, used in diagnostics
    pub name: String,
    /// What the constraint checks
    pub constraint_type: ConstraintType,
}

/// Kinds of constraints a value type can carry
#[derive(Debug, Clone)]
pub enum ConstraintType {
    /// Character count within `[min_length, max_length]`
    Length {
        min_length: usize,
        max_length: Option<usize>,
    },
    /// Numeric value within the given bounds
    Range {
        lower: f64,
        lower_inclusive: bool,
        upper: f64,
        upper_inclusive: bool,
    },
    /// Whole value matches the pattern
    Regex(Regex),
    /// Value is one of the listed strings
    Allowlist(Vec<String>),
    /// Value is none of the listed strings
    Denylist(Vec<String>),
}

impl Constraint {
    /// Create a length constraint; `min_length` must not exceed `max_length`
    pub fn length(
        name: impl Into<String>,
        min_length: usize,
        max_length: Option<usize>,
    ) -> ExecutionResult<Self> {
        let name = name.into();
        if let Some(max) = max_length {
            if min_length > max {
                return Err(ExecutionError::validation(format!(
                    "Constraint `{}`: the minimum length needs to be smaller or equal to the maximum length",
                    name
                )));
            }
        }
        Ok(Self {
            name,
            constraint_type: ConstraintType::Length {
                min_length,
                max_length,
            },
        })
    }

    /// Create a range constraint; `lower` must not exceed `upper`
    pub fn range(
        name: impl Into<String>,
        lower: f64,
        lower_inclusive: bool,
        upper: f64,
        upper_inclusive: bool,
    ) -> ExecutionResult<Self> {
        let name = name.into();
        let empty = lower > upper || (lower == upper && !(lower_inclusive && upper_inclusive));
        if empty {
            return Err(ExecutionError::validation(format!(
                "Constraint `{}`: the lower bound needs to be smaller than the upper bound",
                name
            )));
        }
        Ok(Self {
            name,
            constraint_type: ConstraintType::Range {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            },
        })
    }

    /// Create a regex constraint. The pattern is anchored to the whole value.
    pub fn regex(name: impl Into<String>, pattern: &str) -> ExecutionResult<Self> {
        let name = name.into();
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored).map_err(|e| {
            ExecutionError::validation(format!(
                "Constraint `{}`: invalid regular expression: {}",
                name, e
            ))
        })?;
        Ok(Self {
            name,
            constraint_type: ConstraintType::Regex(regex),
        })
    }

    pub fn allowlist(name: impl Into<String>, allowed: Vec<String>) -> Self {
        Self {
            name: name.into(),
            constraint_type: ConstraintType::Allowlist(allowed),
        }
    }

    pub fn denylist(name: impl Into<String>, denied: Vec<String>) -> Self {
        Self {
            name: name.into(),
            constraint_type: ConstraintType::Denylist(denied),
        }
    }

    /// Whether the constraint can be attached to a value type with this base
    pub fn applies_to(&self, base: PrimitiveValueType) -> bool {
        match self.constraint_type {
            ConstraintType::Range { .. } => base.is_numeric(),
            ConstraintType::Length { .. }
            | ConstraintType::Regex(_)
            | ConstraintType::Allowlist(_)
            | ConstraintType::Denylist(_) => base == PrimitiveValueType::Text,
        }
    }

    /// Check a raw value against the constraint
    pub fn is_satisfied(&self, raw: &str) -> bool {
        match &self.constraint_type {
            ConstraintType::Length {
                min_length,
                max_length,
            } => {
                let len = raw.chars().count();
                len >= *min_length && max_length.map_or(true, |max| len <= max)
            }
            ConstraintType::Range {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => match parse_decimal(raw) {
                Some(value) => {
                    let above = if *lower_inclusive {
                        value >= *lower
                    } else {
                        value > *lower
                    };
                    let below = if *upper_inclusive {
                        value <= *upper
                    } else {
                        value < *upper
                    };
                    above && below
                }
                None => false,
            },
            ConstraintType::Regex(regex) => regex.is_match(raw),
            ConstraintType::Allowlist(allowed) => allowed.iter().any(|a| a == raw),
            ConstraintType::Denylist(denied) => !denied.iter().any(|d| d == raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_constraint() {
        let c = Constraint::length("Short", 1, Some(3)).unwrap();
        assert!(c.is_satisfied("ab"));
        assert!(c.is_satisfied("äöü"));
        assert!(!c.is_satisfied(""));
        assert!(!c.is_satisfied("abcd"));

        let unbounded = Constraint::length("NonEmpty", 1, None).unwrap();
        assert!(unbounded.is_satisfied(&"x".repeat(1000)));
    }

    #[test]
    fn test_length_constraint_rejects_inverted_bounds() {
        let err = Constraint::length("Broken", 5, Some(2)).unwrap_err();
        assert!(err.message.contains("minimum length"));
    }

    #[test]
    fn test_range_constraint_bounds() {
        let c = Constraint::range("Open", 0.0, false, 10.0, true).unwrap();
        assert!(!c.is_satisfied("0"));
        assert!(c.is_satisfied("0.1"));
        assert!(c.is_satisfied("10"));
        assert!(!c.is_satisfied("10.5"));
        assert!(!c.is_satisfied("ten"));
    }

    #[test]
    fn test_range_constraint_rejects_empty_range() {
        assert!(Constraint::range("Empty", 5.0, true, 1.0, true).is_err());
        assert!(Constraint::range("Point", 1.0, false, 1.0, true).is_err());
        assert!(Constraint::range("Point", 1.0, true, 1.0, true).is_ok());
    }

    #[test]
    fn test_regex_constraint_is_anchored() {
        let c = Constraint::regex("Code", "[A-Z]{2}[0-9]").unwrap();
        assert!(c.is_satisfied("AB1"));
        assert!(!c.is_satisfied("xAB1"));
        assert!(!c.is_satisfied("AB12"));
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let err = Constraint::regex("Bad", "(unclosed").unwrap_err();
        assert!(err.message.contains("invalid regular expression"));
    }

    #[test]
    fn test_allow_and_deny_lists() {
        let allow = Constraint::allowlist("Colors", vec!["red".into(), "green".into()]);
        assert!(allow.is_satisfied("red"));
        assert!(!allow.is_satisfied("blue"));

        let deny = Constraint::denylist("NoNulls", vec!["NULL".into(), "".into()]);
        assert!(deny.is_satisfied("value"));
        assert!(!deny.is_satisfied("NULL"));
    }

    #[test]
    fn test_applicability() {
        let range = Constraint::range("R", 0.0, true, 1.0, true).unwrap();
        assert!(range.applies_to(PrimitiveValueType::Integer));
        assert!(range.applies_to(PrimitiveValueType::Decimal));
        assert!(!range.applies_to(PrimitiveValueType::Text));

        let length = Constraint::length("L", 0, None).unwrap();
        assert!(length.applies_to(PrimitiveValueType::Text));
        assert!(!length.applies_to(PrimitiveValueType::Boolean));
    }
}
