//! Pipeline validation
//!
//! Validates a pipeline before execution. Structural checks (references,
//! duplicates, known block types, cycles) run on the definitions alone; type
//! checks (pipe compatibility, input arity) need each block's static
//! [`BlockMeta`] and run once executors exist.

use std::collections::{HashMap, HashSet, VecDeque};

use super::pipeline::{Pipe, Pipeline};
use crate::core::block::{BlockMeta, BlockTypeRef};
use crate::core::registry::ExecutorRegistry;
use crate::core::result::{ExecutionError, ExecutionResult, SourceLocation};

// ── Result types ────────────────────────────────────────────────────────────

/// A non-fatal finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub block: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Default)]
pub struct PipelineValidationResult {
    pub errors: Vec<ExecutionError>,
    pub warnings: Vec<ValidationWarning>,
}

impl PipelineValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, error: ExecutionError) {
        self.errors.push(error);
    }

    fn add_warning(&mut self, block: &str, message: impl Into<String>, suggestion: &str) {
        self.warnings.push(ValidationWarning {
            block: Some(block.to_string()),
            message: message.into(),
            suggestion: Some(suggestion.to_string()),
        });
    }

    fn merge(&mut self, other: PipelineValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// First error, or the warnings when the pipeline is valid
    pub fn into_result(self) -> ExecutionResult<Vec<ValidationWarning>> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

// ── Validator ───────────────────────────────────────────────────────────────

/// Validates pipelines
pub struct PipelineValidator;

impl PipelineValidator {
    /// Checks that need only the definitions
    pub fn check_structure(pipeline: &Pipeline, registry: &ExecutorRegistry) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();

        result.merge(Self::check_duplicate_blocks(pipeline));
        result.merge(Self::check_block_types(pipeline, registry));
        result.merge(Self::check_referenced_blocks_exist(pipeline));
        result.merge(Self::check_duplicate_pipes(pipeline));
        result.merge(Self::check_cycles(pipeline));
        result.merge(Self::check_disconnected_blocks(pipeline));

        result
    }

    /// Checks that need the static I/O types of every block
    pub fn check_types(pipeline: &Pipeline, metas: &HashMap<String, BlockMeta>) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();

        result.merge(Self::check_type_compatibility(pipeline, metas));
        result.merge(Self::check_input_arity(pipeline, metas));

        result
    }

    // ── Individual checks ───────────────────────────────────────────────

    fn check_duplicate_blocks(pipeline: &Pipeline) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        let mut seen = HashSet::new();
        for block in &pipeline.blocks {
            if !seen.insert(block.name.as_str()) {
                result.add_error(
                    ExecutionError::validation(format!(
                        "Pipeline `{}` declares more than one block named `{}`",
                        pipeline.name, block.name
                    ))
                    .with_hint("Block names must be unique within a pipeline")
                    .with_location(block.location()),
                );
            }
        }
        result
    }

    /// Every block must reference a type the registry can create
    fn check_block_types(pipeline: &Pipeline, registry: &ExecutorRegistry) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        for block in &pipeline.blocks {
            match &block.block_type {
                None => result.add_error(
                    ExecutionError::validation(format!(
                        "Block `{}` does not reference a block type",
                        block.name
                    ))
                    .with_location(block.location()),
                ),
                Some(BlockTypeRef::Builtin(name)) if !registry.contains(name) => result.add_error(
                    ExecutionError::validation(format!(
                        "Block `{}` uses unknown block type `{}`",
                        block.name, name
                    ))
                    .with_hint("Register an executor for the type or fix the type name")
                    .with_location(block.location()),
                ),
                Some(_) => {}
            }
        }
        result
    }

    /// Every block a pipe references must exist
    fn check_referenced_blocks_exist(pipeline: &Pipeline) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        let names: HashSet<&str> = pipeline.blocks.iter().map(|b| b.name.as_str()).collect();
        for pipe in &pipeline.pipes {
            for end in [&pipe.from, &pipe.to] {
                if !names.contains(end.as_str()) {
                    result.add_error(
                        ExecutionError::validation(format!(
                            "Pipe {} -> {} references unknown block `{}`",
                            pipe.from, pipe.to, end
                        ))
                        .with_hint("Declare the block or remove the pipe")
                        .with_location(pipe_location(pipe, end)),
                    );
                }
            }
        }
        result
    }

    fn check_duplicate_pipes(pipeline: &Pipeline) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        let mut seen = HashSet::new();
        for pipe in &pipeline.pipes {
            if !seen.insert((pipe.from.as_str(), pipe.to.as_str())) {
                result.add_error(
                    ExecutionError::validation(format!(
                        "Duplicate pipe from `{}` to `{}`",
                        pipe.from, pipe.to
                    ))
                    .with_hint("Remove the duplicate pipe")
                    .with_location(pipe_location(pipe, &pipe.to)),
                );
            }
        }
        result
    }

    /// Every pipe must connect an output to an input of the same type
    fn check_type_compatibility(
        pipeline: &Pipeline,
        metas: &HashMap<String, BlockMeta>,
    ) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        for pipe in &pipeline.pipes {
            if let (Some(from), Some(to)) = (metas.get(&pipe.from), metas.get(&pipe.to)) {
                if !from.can_connect_to(to) {
                    result.add_error(
                        ExecutionError::type_mismatch(format!(
                            "Block `{}` produces {} but block `{}` expects {}",
                            pipe.from, from.output_type, pipe.to, to.input_type
                        ))
                        .with_hint("Connected blocks must agree on the type flowing through the pipe")
                        .with_location(pipe_location(pipe, &pipe.to)),
                    );
                }
            }
        }
        result
    }

    /// Sources take no pipe, every other block exactly one
    fn check_input_arity(
        pipeline: &Pipeline,
        metas: &HashMap<String, BlockMeta>,
    ) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        let mut incoming: HashMap<&str, usize> = HashMap::new();
        for pipe in &pipeline.pipes {
            *incoming.entry(pipe.to.as_str()).or_default() += 1;
        }

        for block in &pipeline.blocks {
            let Some(meta) = metas.get(&block.name) else {
                continue;
            };
            let count = incoming.get(block.name.as_str()).copied().unwrap_or(0);
            if !meta.has_input() && count > 0 {
                result.add_error(
                    ExecutionError::validation(format!(
                        "Block `{}` does not take an input but {} pipe(s) lead into it",
                        block.name, count
                    ))
                    .with_location(block.location()),
                );
            } else if meta.has_input() && count != 1 {
                result.add_error(
                    ExecutionError::validation(format!(
                        "Block `{}` expects exactly one input of type {} but has {} incoming pipe(s)",
                        block.name, meta.input_type, count
                    ))
                    .with_hint("Pipe exactly one block into it")
                    .with_location(block.location()),
                );
            }
        }
        result
    }

    /// Kahn's algorithm; nodes left with in-degree > 0 are on a cycle
    fn check_cycles(pipeline: &Pipeline) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        let names: Vec<&str> = pipeline.blocks.iter().map(|b| b.name.as_str()).collect();

        if Self::topological_sort(&names, &pipeline.pipes).is_none() {
            let on_cycle = Self::blocks_on_cycles(&names, &pipeline.pipes);
            result.add_error(
                ExecutionError::validation(format!(
                    "Pipeline `{}` contains a cycle involving blocks: [{}]",
                    pipeline.name,
                    on_cycle.join(", ")
                ))
                .with_hint("Remove pipes to break the cycle"),
            );
        }
        result
    }

    /// Warn about blocks that have no pipes at all
    fn check_disconnected_blocks(pipeline: &Pipeline) -> PipelineValidationResult {
        let mut result = PipelineValidationResult::default();
        if pipeline.blocks.len() < 2 {
            return result;
        }

        let connected: HashSet<&str> = pipeline
            .pipes
            .iter()
            .flat_map(|p| [p.from.as_str(), p.to.as_str()])
            .collect();
        for block in &pipeline.blocks {
            if !connected.contains(block.name.as_str()) {
                result.add_warning(
                    &block.name,
                    format!("Block `{}` is not connected to any other block", block.name),
                    "Connect this block or remove it from the pipeline",
                );
            }
        }
        result
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn in_degrees<'a>(
        names: &[&'a str],
        pipes: &'a [Pipe],
    ) -> (HashMap<&'a str, usize>, HashMap<&'a str, Vec<&'a str>>) {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();

        for &name in names {
            in_degree.entry(name).or_insert(0);
            adj.entry(name).or_default();
        }

        let known: HashSet<&str> = names.iter().copied().collect();
        for pipe in pipes {
            let from = pipe.from.as_str();
            let to = pipe.to.as_str();
            if known.contains(from) && known.contains(to) {
                adj.entry(from).or_default().push(to);
                *in_degree.entry(to).or_default() += 1;
            }
        }
        (in_degree, adj)
    }

    /// Names in declaration order with repeats dropped
    fn unique_names<'a>(names: &[&'a str]) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        names.iter().copied().filter(|n| seen.insert(*n)).collect()
    }

    fn blocks_on_cycles<'a>(names: &[&'a str], pipes: &'a [Pipe]) -> Vec<&'a str> {
        let names = Self::unique_names(names);
        let (mut in_degree, adj) = Self::in_degrees(&names, pipes);
        let mut queue: VecDeque<&str> = names
            .iter()
            .copied()
            .filter(|n| in_degree.get(n) == Some(&0))
            .collect();
        while let Some(node) = queue.pop_front() {
            for &next in adj.get(node).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }
        names
            .iter()
            .copied()
            .filter(|n| in_degree.get(n).map_or(false, |&d| d > 0))
            .collect()
    }

    /// Topological order of block names; `None` if the pipes form a cycle.
    ///
    /// Ties are broken by declaration order, so the order is stable across
    /// runs. Repeated names count once.
    pub fn topological_sort(names: &[&str], pipes: &[Pipe]) -> Option<Vec<String>> {
        let names = Self::unique_names(names);
        let (mut in_degree, adj) = Self::in_degrees(&names, pipes);

        let mut queue: VecDeque<&str> = names
            .iter()
            .copied()
            .filter(|n| in_degree.get(n) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(names.len());

        while let Some(node) = queue.pop_front() {
            order.push(node.to_string());
            for &next in adj.get(node).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if order.len() == names.len() {
            Some(order)
        } else {
            None
        }
    }
}

fn pipe_location(pipe: &Pipe, block: &str) -> SourceLocation {
    if pipe.location == SourceLocation::default() {
        SourceLocation::block(block)
    } else {
        pipe.location.clone()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
