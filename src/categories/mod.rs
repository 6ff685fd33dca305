//! Block categories and built-in executors
//!
//! Every built-in executor belongs to a category. Composite block types
//! registered at run time are filed under [`BlockCategory::Composite`].

pub mod extraction;
pub mod output;
pub mod tabular;

use serde::{Deserialize, Serialize};

use crate::core::registry::ExecutorRegistry;

pub use extraction::{FilePicker, LocalFileExtractor};
pub use output::TableLogger;
pub use tabular::{ColumnDeleter, LayoutValidator, RowDeleter, SheetPicker};

/// Block category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockCategory {
    /// Blocks that bring files into a pipeline
    Extraction,
    /// Sheet-to-sheet reshaping (picking, deleting rows or columns)
    Transformation,
    /// Layout and type checking
    Validation,
    /// Sinks
    Output,
    /// User-defined chains of other blocks
    Composite,
}

impl BlockCategory {
    /// Get a human-readable name for the category
    pub fn display_name(&self) -> &'static str {
        match self {
            BlockCategory::Extraction => "Extraction",
            BlockCategory::Transformation => "Transformation",
            BlockCategory::Validation => "Validation",
            BlockCategory::Output => "Output",
            BlockCategory::Composite => "Composite",
        }
    }
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Register every built-in executor
pub fn register_builtin_executors(registry: &ExecutorRegistry) {
    registry.register_type::<LocalFileExtractor>();
    registry.register_type::<FilePicker>();
    registry.register_type::<SheetPicker>();
    registry.register_type::<RowDeleter>();
    registry.register_type::<ColumnDeleter>();
    registry.register_type::<LayoutValidator>();
    registry.register_type::<TableLogger>();
}
