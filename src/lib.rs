//! Block Pipeline - execution engine for typed, block-based data pipelines
//!
//! A pipeline is a set of blocks connected by pipes. Each block is run by an
//! executor that declares the type it consumes and the type it produces
//! (files, workbooks, sheets, tables). The engine validates the wiring,
//! expands composite blocks into chains of built-in ones, and runs the
//! blocks one after another, stopping at the first failure.

pub mod categories;
pub mod core;
pub mod data;
pub mod layout;
pub mod runtime;
mod tests;

// Re-export commonly used types
pub use categories::BlockCategory;
pub use core::{
    BlockDefinition, BlockExecutor, ExecutionContext, ExecutionError, ExecutionResult,
    ExecutorRegistry, IoType, IoValue,
};
pub use runtime::{EngineConfig, ExecutionEngine, Pipeline, PipelineOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
