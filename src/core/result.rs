//! Result protocol shared by every engine operation
//!
//! Failures are ordinary values: every block, the layout validator, composite
//! expansion and the pipeline driver return an [`ExecutionResult`]. An error
//! carries a human-readable message, an optional remediation hint and an
//! optional pointer into the pipeline source so that a presenter (CLI or IDE)
//! can show it next to the offending block or property.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type returned by engine operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Pointer into the pipeline source.
///
/// The AST layer produces these; the engine only carries them along. All
/// fields are optional because blocks synthesized during composite expansion
/// may not have a precise span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Name of the block the location belongs to
    pub block: Option<String>,
    /// Property of the block the location points at
    pub property: Option<String>,
    /// 1-based line in the source document
    pub line: Option<u32>,
    /// 1-based column in the source document
    pub column: Option<u32>,
}

impl SourceLocation {
    /// Location pointing at a whole block
    pub fn block(name: impl Into<String>) -> Self {
        Self {
            block: Some(name.into()),
            ..Self::default()
        }
    }

    /// Narrow the location to a property of the block
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Attach a line/column span
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(block) = &self.block {
            parts.push(format!("block `{}`", block));
        }
        if let Some(property) = &self.property {
            parts.push(format!("property `{}`", property));
        }
        if let (Some(line), Some(column)) = (self.line, self.column) {
            parts.push(format!("line {}, column {}", line, column));
        }
        if parts.is_empty() {
            write!(f, "<unknown location>")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Layout/type/property validation failed
    Validation,
    /// File not found, traversal rejected, sheet absent, ...
    Io,
    /// The value handed to a block does not have the declared IoType
    TypeMismatch,
    /// A composite block type could not be expanded
    Expansion,
    /// Any other block-level failure
    Execution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation error",
            ErrorKind::Io => "I/O error",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Expansion => "expansion error",
            ErrorKind::Execution => "execution error",
        };
        f.write_str(name)
    }
}

/// Failure details carried by the `Err` variant of [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
    /// Optional remediation hint
    pub hint: Option<String>,
    /// Optional pointer into the pipeline source
    pub location: Option<SourceLocation>,
}

impl ExecutionError {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
            location: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    pub fn expansion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expansion, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }

    /// Attach a remediation hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a source location, replacing any previous one
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a source location only if none is set yet.
    ///
    /// Used when an error bubbles out of a nested block: the innermost
    /// location is the most precise one and must survive.
    pub fn or_location(mut self, location: SourceLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    /// Multi-line rendering for presenters
    pub fn render(&self) -> String {
        let mut out = format!("{}: {}", self.kind, self.message);
        if let Some(hint) = &self.hint {
            out.push_str("\nhint: ");
            out.push_str(hint);
        }
        if let Some(location) = &self.location {
            out.push_str("\n  --> ");
            out.push_str(&location.to_string());
        }
        out
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(error: std::io::Error) -> Self {
        ExecutionError::io(error.to_string())
    }
}
