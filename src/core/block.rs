//! Block definitions and the executor trait
//!
//! A [`BlockDefinition`] is the resolved form of a block declared in a
//! pipeline: its name, a reference to its block type, evaluated property
//! values and a source location. A [`BlockExecutor`] wraps one definition and
//! runs it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::io_type::{IoType, IoValue};
use super::metrics::MetricsCollector;
use super::property::PropertyValue;
use super::result::{ExecutionError, ExecutionResult, SourceLocation};
use super::RunId;
use crate::data::InMemoryFileSystem;
use crate::layout::Layout;
use crate::runtime::composite::CompositeBlockType;
use crate::runtime::config::EngineConfig;

/// Reference from a block to its block type
#[derive(Debug, Clone)]
pub enum BlockTypeRef {
    /// Type implemented by a registered executor
    Builtin(String),
    /// Type defined as a chain of other blocks
    Composite(Arc<CompositeBlockType>),
}

impl BlockTypeRef {
    pub fn name(&self) -> &str {
        match self {
            BlockTypeRef::Builtin(name) => name,
            BlockTypeRef::Composite(composite) => &composite.name,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, BlockTypeRef::Composite(_))
    }
}

impl fmt::Display for BlockTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved block declaration
#[derive(Debug, Clone)]
pub struct BlockDefinition {
    pub name: String,
    /// `None` only when reference resolution failed upstream
    pub block_type: Option<BlockTypeRef>,
    pub properties: HashMap<String, PropertyValue>,
    pub location: SourceLocation,
}

impl BlockDefinition {
    pub fn new(name: impl Into<String>, block_type: Option<BlockTypeRef>) -> Self {
        let name = name.into();
        Self {
            location: SourceLocation::block(name.clone()),
            name,
            block_type,
            properties: HashMap::new(),
        }
    }

    /// Block of a built-in type
    pub fn builtin(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, Some(BlockTypeRef::Builtin(type_name.into())))
    }

    /// Block of a composite type
    pub fn composite(name: impl Into<String>, block_type: Arc<CompositeBlockType>) -> Self {
        Self::new(name, Some(BlockTypeRef::Composite(block_type)))
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Attach a line/column span to the block's location
    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.location = self.location.at(line, column);
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.block_type.as_ref().map(BlockTypeRef::name)
    }

    pub fn location(&self) -> SourceLocation {
        self.location.clone()
    }

    /// Location of one of the block's properties
    pub fn property_location(&self, property: &str) -> SourceLocation {
        self.location.clone().with_property(property)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    fn required(&self, name: &str) -> ExecutionResult<&PropertyValue> {
        self.property(name).ok_or_else(|| {
            ExecutionError::validation(format!(
                "Block `{}` is missing the required property `{}`",
                self.name, name
            ))
            .with_location(self.property_location(name))
        })
    }

    fn wrong_kind(&self, name: &str, expected: &str, value: &PropertyValue) -> ExecutionError {
        ExecutionError::validation(format!(
            "Property `{}` of block `{}` must be {} but is {}",
            name,
            self.name,
            expected,
            value.kind_name()
        ))
        .with_location(self.property_location(name))
    }

    pub fn text_property(&self, name: &str) -> ExecutionResult<&str> {
        let value = self.required(name)?;
        value.as_text().ok_or_else(|| self.wrong_kind(name, "text", value))
    }

    pub fn integer_property(&self, name: &str) -> ExecutionResult<i64> {
        let value = self.required(name)?;
        value
            .as_integer()
            .ok_or_else(|| self.wrong_kind(name, "an integer", value))
    }

    /// Integer property that may be absent
    pub fn optional_integer_property(&self, name: &str) -> ExecutionResult<Option<i64>> {
        match self.property(name) {
            None => Ok(None),
            Some(value) => value
                .as_integer()
                .map(Some)
                .ok_or_else(|| self.wrong_kind(name, "an integer", value)),
        }
    }

    pub fn list_property(&self, name: &str) -> ExecutionResult<&[PropertyValue]> {
        let value = self.required(name)?;
        value.as_list().ok_or_else(|| self.wrong_kind(name, "a list", value))
    }

    pub fn layout_property(&self, name: &str) -> ExecutionResult<&Arc<Layout>> {
        let value = self.required(name)?;
        value
            .as_layout()
            .ok_or_else(|| self.wrong_kind(name, "a layout", value))
    }
}

/// Static input/output types of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMeta {
    pub input_type: IoType,
    pub output_type: IoType,
}

impl BlockMeta {
    pub fn new(input_type: IoType, output_type: IoType) -> Self {
        Self {
            input_type,
            output_type,
        }
    }

    pub fn can_connect_to(&self, other: &BlockMeta) -> bool {
        self.output_type.can_connect(other.input_type)
    }

    /// `false` for sources
    pub fn has_input(&self) -> bool {
        !self.input_type.is_none()
    }

    /// `false` for sinks
    pub fn has_output(&self) -> bool {
        !self.output_type.is_none()
    }
}

/// Per-run state shared by every block of a pipeline
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    run_id: RunId,
    file_system: InMemoryFileSystem,
    metrics: MetricsCollector,
    config: Arc<EngineConfig>,
}

impl ExecutionContext {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            run_id: RunId::new(),
            file_system: InMemoryFileSystem::new(),
            metrics: MetricsCollector::new(),
            config,
        }
    }

    /// Start the run with a pre-populated filesystem
    pub fn with_file_system(mut self, file_system: InMemoryFileSystem) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn file_system(&self) -> &InMemoryFileSystem {
        &self.file_system
    }

    pub fn file_system_mut(&mut self) -> &mut InMemoryFileSystem {
        &mut self.file_system
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(Arc::new(EngineConfig::default()))
    }
}

/// Executor for one block.
///
/// Executors own their definition and declare their I/O types statically.
/// `execute` receives the predecessor's output (or [`IoValue::None`] for
/// sources) and returns the block's output.
#[async_trait]
pub trait BlockExecutor: Send + Sync {
    /// Name of the block type this executor implements
    fn block_type(&self) -> &str;

    /// Definition the executor was created from
    fn block(&self) -> &BlockDefinition;

    fn input_type(&self) -> IoType;

    fn output_type(&self) -> IoType;

    async fn execute(
        &self,
        input: IoValue,
        context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue>;

    fn meta(&self) -> BlockMeta {
        BlockMeta::new(self.input_type(), self.output_type())
    }
}
