//! Core abstractions
//!
//! Result protocol, value and I/O types, block definitions, the executor
//! trait and the executor registry.

pub mod block;
pub mod constraint;
pub mod io_type;
pub mod metrics;
pub mod property;
pub mod registry;
pub mod result;
pub mod value_type;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use block::{BlockDefinition, BlockExecutor, BlockMeta, BlockTypeRef, ExecutionContext};
pub use io_type::{can_connect, IoType, IoValue};
pub use property::PropertyValue;
pub use registry::ExecutorRegistry;
pub use result::{ErrorKind, ExecutionError, ExecutionResult, SourceLocation};
pub use value_type::{PrimitiveValue, PrimitiveValueType, ValueType, ValueTypeRef};

/// Unique identifier for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new random run ID
    pub fn new() -> Self {
        RunId(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
