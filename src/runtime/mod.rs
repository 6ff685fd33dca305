//! Pipeline runtime
//!
//! Pipeline definitions, static validation, composite expansion and the
//! execution engine that drives blocks in topological order.

pub mod composite;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod timer;
pub mod validation;

pub use composite::{CompositeBlockExecutor, CompositeBlockType, CompositeChain, CompositePort};
pub use config::{ConfigError, DebugGranularity, EngineConfig};
pub use engine::{
    BlockReport, BlockStatus, ExecutionEngine, ExecutionSummary, PipelineOutcome, RunStatus,
};
pub use pipeline::{Pipe, Pipeline};
pub use timer::Timer;
pub use validation::{PipelineValidationResult, PipelineValidator, ValidationWarning};
