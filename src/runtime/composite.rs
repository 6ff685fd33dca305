//! Composite block types
//!
//! A composite block type is a reusable chain of blocks with one external
//! input port and one external output port. Expansion orders the internal
//! blocks along the pipes from the input port to the output port, creates an
//! executor for each through the registry and wraps them in a
//! [`CompositeBlockExecutor`] that feeds values through the chain.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use super::pipeline::Pipe;
use crate::core::block::{BlockDefinition, BlockExecutor, BlockTypeRef, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorRegistry;
use crate::core::result::{ExecutionError, ExecutionResult, SourceLocation};

const TRACING_TARGET: &str = "block_pipeline::runtime::composite";

/// External port of a composite block type
#[derive(Debug, Clone)]
pub struct CompositePort {
    pub name: String,
    /// Declared type; `None` leaves it to be derived from the chain
    pub io_type: Option<IoType>,
}

impl CompositePort {
    pub fn new(name: impl Into<String>, io_type: IoType) -> Self {
        Self {
            name: name.into(),
            io_type: Some(io_type),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            io_type: None,
        }
    }
}

/// Definition of a composite block type
#[derive(Debug, Clone)]
pub struct CompositeBlockType {
    pub name: String,
    pub input: CompositePort,
    pub output: CompositePort,
    pub blocks: Vec<BlockDefinition>,
    /// Pipes between internal blocks and the external ports, by name
    pub pipes: Vec<Pipe>,
    pub location: SourceLocation,
}

impl CompositeBlockType {
    pub fn new(name: impl Into<String>, input: CompositePort, output: CompositePort) -> Self {
        let name = name.into();
        Self {
            location: SourceLocation::block(name.clone()),
            name,
            input,
            output,
            blocks: Vec::new(),
            pipes: Vec::new(),
        }
    }

    pub fn with_block(mut self, block: BlockDefinition) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_pipe(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pipes.push(Pipe::new(from, to));
        self
    }

    /// Composite whose blocks run in the given order, wired to both ports
    pub fn chain(
        name: impl Into<String>,
        input: CompositePort,
        output: CompositePort,
        blocks: Vec<BlockDefinition>,
    ) -> Self {
        let mut names: Vec<String> = vec![input.name.clone()];
        names.extend(blocks.iter().map(|b| b.name.clone()));
        names.push(output.name.clone());
        let pipes = names
            .windows(2)
            .map(|pair| Pipe::new(pair[0].clone(), pair[1].clone()))
            .collect();

        let mut composite = Self::new(name, input, output);
        composite.blocks = blocks;
        composite.pipes = pipes;
        composite
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn error(&self, message: String) -> ExecutionError {
        ExecutionError::expansion(format!("Composite block type `{}`: {}", self.name, message))
            .with_location(self.location.clone())
    }

    /// Internal blocks ordered from the input port to the output port.
    ///
    /// The path must be linear: every step has exactly one outgoing pipe, no
    /// block is visited twice, and every internal block lies on the path.
    pub fn chain_order(&self) -> ExecutionResult<Vec<&BlockDefinition>> {
        let mut order: Vec<&BlockDefinition> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = self.input.name.as_str();

        loop {
            let outgoing: Vec<&Pipe> = self.pipes.iter().filter(|p| p.from == current).collect();
            let next = match outgoing.as_slice() {
                [] => {
                    return Err(self.error(format!(
                        "`{}` has no outgoing pipe, the chain does not reach output `{}`",
                        current, self.output.name
                    )))
                }
                [pipe] => pipe.to.as_str(),
                _ => {
                    return Err(self.error(format!(
                        "`{}` pipes into {} blocks, composite blocks must form a single chain",
                        current,
                        outgoing.len()
                    )))
                }
            };

            if next == self.output.name {
                break;
            }
            let block = self
                .blocks
                .iter()
                .find(|b| b.name == next)
                .ok_or_else(|| self.error(format!("pipe references unknown block `{}`", next)))?;
            if !visited.insert(next) {
                return Err(self.error(format!("the chain revisits block `{}`", next)));
            }
            order.push(block);
            current = next;
        }

        if order.is_empty() {
            return Err(self.error("contains no blocks between its input and output".into()));
        }
        if let Some(unused) = self.blocks.iter().find(|b| !visited.contains(b.name.as_str())) {
            return Err(self.error(format!(
                "block `{}` is not on the path from `{}` to `{}`",
                unused.name, self.input.name, self.output.name
            )));
        }
        Ok(order)
    }
}

/// Expanded chain of a composite type, shared by every block of that type
pub struct CompositeChain {
    pub type_name: String,
    pub input_type: IoType,
    pub output_type: IoType,
    pub steps: Vec<Arc<dyn BlockExecutor>>,
}

impl CompositeChain {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for CompositeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let steps: Vec<&str> = self.steps.iter().map(|s| s.block_type()).collect();
        f.debug_struct("CompositeChain")
            .field("type_name", &self.type_name)
            .field("input_type", &self.input_type)
            .field("output_type", &self.output_type)
            .field("steps", &steps)
            .finish()
    }
}

/// Expand a composite type into an executor chain.
///
/// `stack` holds the composite types currently being expanded and is used to
/// detect self-reference.
pub(crate) fn expand(
    composite: &CompositeBlockType,
    registry: &ExecutorRegistry,
    stack: &mut Vec<String>,
) -> ExecutionResult<CompositeChain> {
    let order = composite.chain_order()?;

    let mut steps: Vec<Arc<dyn BlockExecutor>> = Vec::with_capacity(order.len());
    for block in order {
        match &block.block_type {
            None => {
                return Err(composite.error(format!(
                    "block `{}` does not reference a block type",
                    block.name
                )))
            }
            Some(BlockTypeRef::Builtin(name)) if !registry.contains(name) => {
                return Err(composite.error(format!(
                    "block `{}` uses unknown block type `{}`",
                    block.name, name
                ))
                .with_location(block.location()))
            }
            Some(_) => {}
        }
        let executor: Arc<dyn BlockExecutor> = registry.create_in(block, stack)?.into();
        if let Some(previous) = steps.last() {
            if previous.output_type() != executor.input_type() {
                return Err(ExecutionError::type_mismatch(format!(
                    "Composite block type `{}`: block `{}` produces {} but block `{}` expects {}",
                    composite.name,
                    previous.block().name,
                    previous.output_type(),
                    block.name,
                    executor.input_type()
                ))
                .with_location(block.location()));
            }
        }
        steps.push(executor);
    }

    let (input_type, output_type) = match (steps.first(), steps.last()) {
        (Some(first), Some(last)) => (first.input_type(), last.output_type()),
        _ => return Err(composite.error("contains no blocks between its input and output".into())),
    };

    for (port, derived) in [(&composite.input, input_type), (&composite.output, output_type)] {
        if let Some(declared) = port.io_type {
            if declared != derived {
                return Err(ExecutionError::type_mismatch(format!(
                    "Composite block type `{}`: port `{}` is declared as {} but the chain uses {}",
                    composite.name, port.name, declared, derived
                ))
                .with_location(composite.location.clone()));
            }
        }
    }

    tracing::debug!(
        target: TRACING_TARGET,
        composite = %composite.name,
        steps = steps.len(),
        input = %input_type,
        output = %output_type,
        "expanded composite block type"
    );

    Ok(CompositeChain {
        type_name: composite.name.clone(),
        input_type,
        output_type,
        steps,
    })
}

/// Executor for a block of a composite type
pub struct CompositeBlockExecutor {
    block: BlockDefinition,
    chain: Arc<CompositeChain>,
}

impl CompositeBlockExecutor {
    pub fn new(block: BlockDefinition, chain: Arc<CompositeChain>) -> Self {
        Self { block, chain }
    }

    pub fn chain(&self) -> &CompositeChain {
        &self.chain
    }
}

#[async_trait]
impl BlockExecutor for CompositeBlockExecutor {
    fn block_type(&self) -> &str {
        &self.chain.type_name
    }

    fn block(&self) -> &BlockDefinition {
        &self.block
    }

    fn input_type(&self) -> IoType {
        self.chain.input_type
    }

    fn output_type(&self) -> IoType {
        self.chain.output_type
    }

    async fn execute(
        &self,
        input: IoValue,
        context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue> {
        let mut value = input;
        for step in &self.chain.steps {
            value
                .expect_type(step.input_type())
                .map_err(|e| e.or_location(step.block().location()))?;

            tracing::trace!(
                target: TRACING_TARGET,
                block = %self.block.name,
                step = %step.block().name,
                "executing composite step"
            );
            value = step
                .execute(value, context)
                .await
                .map_err(|e| e.or_location(step.block().location()))?;
        }
        Ok(value)
    }
}
