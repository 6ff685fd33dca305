//! Execution engine
//!
//! Validates a pipeline, creates one executor per block through the
//! registry, and runs the blocks one at a time in topological order. Each
//! block receives its predecessor's output; sources receive nothing. The
//! first failing block stops the run and its diagnostic is the one the
//! outcome reports. Blocks that already ran are not rolled back.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::config::{ConfigError, DebugGranularity, EngineConfig};
use super::pipeline::Pipeline;
use super::timer::Timer;
use super::validation::{PipelineValidator, ValidationWarning};
use crate::categories::output::table_logger::format_table;
use crate::core::block::{BlockExecutor, ExecutionContext};
use crate::core::io_type::IoValue;
use crate::core::registry::ExecutorRegistry;
use crate::core::result::{ExecutionError, ExecutionResult};
use crate::core::RunId;

const TRACING_TARGET: &str = "block_pipeline::runtime::engine";

// ── Result types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Succeeded,
    Failed,
    /// Not run because validation or an earlier block failed
    Skipped,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlockStatus::Succeeded => "succeeded",
            BlockStatus::Failed => "failed",
            BlockStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Per-block execution report
#[derive(Debug, Clone)]
pub struct BlockReport {
    pub name: String,
    pub block_type: String,
    pub status: BlockStatus,
    /// Wall-clock execution time in milliseconds.
    pub elapsed_ms: f64,
}

/// Final result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    pub pipeline: String,
    pub status: RunStatus,
    /// One report per block, in declaration order
    pub block_reports: Vec<BlockReport>,
    pub failure: Option<ExecutionError>,
    /// Every block's output, when `extract_outputs` is set and the run
    /// succeeded
    pub outputs: HashMap<String, IoValue>,
    pub metrics: BTreeMap<String, f64>,
    pub warnings: Vec<ValidationWarning>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Succeeded => 0,
            RunStatus::Failed => 1,
        }
    }

    pub fn report(&self, block: &str) -> Option<&BlockReport> {
        self.block_reports.iter().find(|r| r.name == block)
    }

    pub fn output(&self, block: &str) -> Option<&IoValue> {
        self.outputs.get(block)
    }
}

/// Outcomes of several pipelines run one after another
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    pub outcomes: Vec<PipelineOutcome>,
}

impl ExecutionSummary {
    /// `0` when every pipeline succeeded, `1` otherwise
    pub fn exit_code(&self) -> i32 {
        if self.outcomes.iter().all(PipelineOutcome::is_success) {
            0
        } else {
            1
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &PipelineOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Executors and order for a validated pipeline
struct ExecutionPlan {
    order: Vec<String>,
    executors: HashMap<String, Box<dyn BlockExecutor>>,
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Runs pipelines against an executor registry
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    registry: ExecutorRegistry,
    config: Arc<EngineConfig>,
}

impl ExecutionEngine {
    /// Engine with every built-in executor registered
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry =
            ExecutorRegistry::with_builtins().with_max_expansion_depth(config.max_expansion_depth);
        Ok(Self {
            registry,
            config: Arc::new(config),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            registry: ExecutorRegistry::with_builtins(),
            config: Arc::new(EngineConfig::default()),
        }
    }

    /// Replace the registry
    pub fn with_registry(mut self, registry: ExecutorRegistry) -> Self {
        self.registry = registry.with_max_expansion_depth(self.config.max_expansion_depth);
        self
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh context carrying the engine configuration
    pub fn new_context(&self) -> ExecutionContext {
        ExecutionContext::new(Arc::clone(&self.config))
    }

    /// Run a pipeline in a fresh context
    pub async fn execute(&self, pipeline: &Pipeline) -> PipelineOutcome {
        self.execute_with(pipeline, self.new_context()).await
    }

    /// Run several pipelines sequentially, each in a fresh context
    pub async fn execute_all(&self, pipelines: &[Pipeline]) -> ExecutionSummary {
        let mut summary = ExecutionSummary::default();
        for pipeline in pipelines {
            summary.outcomes.push(self.execute(pipeline).await);
        }
        tracing::info!(
            target: TRACING_TARGET,
            pipelines = pipelines.len(),
            exit_code = summary.exit_code(),
            "all pipelines finished"
        );
        summary
    }

    /// Run a pipeline in the given context
    pub async fn execute_with(
        &self,
        pipeline: &Pipeline,
        mut context: ExecutionContext,
    ) -> PipelineOutcome {
        let timer = Timer::now();
        let run_id = context.run_id();

        tracing::info!(
            target: TRACING_TARGET,
            %run_id,
            pipeline = %pipeline.name,
            blocks = pipeline.blocks.len(),
            "pipeline run started"
        );

        let mut reports: Vec<BlockReport> = pipeline
            .blocks
            .iter()
            .map(|block| BlockReport {
                name: block.name.clone(),
                block_type: block.type_name().unwrap_or_default().to_string(),
                status: BlockStatus::Skipped,
                elapsed_ms: 0.0,
            })
            .collect();

        let structure = PipelineValidator::check_structure(pipeline, &self.registry);
        let warnings = structure.warnings.clone();
        for warning in &warnings {
            tracing::warn!(
                target: TRACING_TARGET,
                pipeline = %pipeline.name,
                block = warning.block.as_deref().unwrap_or_default(),
                "{}",
                warning.message
            );
        }

        let plan = structure.into_result().and_then(|_| self.plan(pipeline));
        let (failure, mut outputs) = match plan {
            Ok(plan) => self.run(pipeline, plan, &mut context, &mut reports).await,
            Err(error) => (Some(error), HashMap::new()),
        };

        let status = if failure.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };
        if status == RunStatus::Failed || !self.config.extract_outputs {
            outputs.clear();
        }

        let duration_ms = timer.elapsed_ms();
        match &failure {
            None => tracing::info!(
                target: TRACING_TARGET,
                %run_id,
                pipeline = %pipeline.name,
                duration_ms,
                "pipeline run succeeded"
            ),
            Some(error) => tracing::warn!(
                target: TRACING_TARGET,
                %run_id,
                pipeline = %pipeline.name,
                duration_ms,
                kind = %error.kind,
                "pipeline run failed: {}",
                error
            ),
        }

        PipelineOutcome {
            run_id,
            pipeline: pipeline.name.clone(),
            status,
            block_reports: reports,
            failure,
            outputs,
            metrics: context.metrics().snapshot(),
            warnings,
            duration_ms,
        }
    }

    /// Create executors, check pipe types, and order the blocks
    fn plan(&self, pipeline: &Pipeline) -> ExecutionResult<ExecutionPlan> {
        let mut executors = HashMap::with_capacity(pipeline.blocks.len());
        let mut metas = HashMap::with_capacity(pipeline.blocks.len());
        for block in &pipeline.blocks {
            let executor = self.registry.create(block)?;
            metas.insert(block.name.clone(), executor.meta());
            executors.insert(block.name.clone(), executor);
        }

        PipelineValidator::check_types(pipeline, &metas).into_result()?;

        let names: Vec<&str> = pipeline.blocks.iter().map(|b| b.name.as_str()).collect();
        let order = PipelineValidator::topological_sort(&names, &pipeline.pipes).ok_or_else(|| {
            ExecutionError::validation(format!("Pipeline `{}` contains a cycle", pipeline.name))
        })?;

        Ok(ExecutionPlan { order, executors })
    }

    async fn run(
        &self,
        pipeline: &Pipeline,
        plan: ExecutionPlan,
        context: &mut ExecutionContext,
        reports: &mut [BlockReport],
    ) -> (Option<ExecutionError>, HashMap<String, IoValue>) {
        let mut outputs: HashMap<String, IoValue> = HashMap::new();
        let mut consumers: HashMap<&str, usize> = HashMap::new();
        for pipe in &pipeline.pipes {
            *consumers.entry(pipe.from.as_str()).or_default() += 1;
        }

        for name in &plan.order {
            let Some(executor) = plan.executors.get(name) else {
                continue;
            };

            let input = match pipeline.predecessors(name).first() {
                None => IoValue::None,
                Some(&from) => self.take_input(from, &mut outputs, &mut consumers),
            };

            tracing::debug!(
                target: TRACING_TARGET,
                block = %name,
                block_type = executor.block_type(),
                "block started"
            );
            let timer = Timer::now();
            let result = dispatch(executor.as_ref(), input, context).await;
            let elapsed_ms = timer.elapsed_ms();

            context
                .metrics()
                .record(&format!("block.{}.execution_time_ms", name), elapsed_ms);

            let status = if result.is_ok() {
                BlockStatus::Succeeded
            } else {
                BlockStatus::Failed
            };
            if let Some(report) = reports.iter_mut().find(|r| &r.name == name) {
                report.status = status;
                report.elapsed_ms = elapsed_ms;
            }

            match result {
                Ok(output) => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        block = %name,
                        elapsed_ms,
                        "block finished"
                    );
                    self.log_output(name, &output);

                    let needed = consumers.get(name.as_str()).copied().unwrap_or(0) > 0;
                    if needed || self.config.extract_outputs {
                        outputs.insert(name.clone(), output);
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        block = %name,
                        elapsed_ms,
                        "block failed: {}",
                        error.message
                    );
                    return (Some(error), outputs);
                }
            }
        }

        (None, outputs)
    }

    /// Hand a stored output to one of its consumers. The last consumer takes
    /// the value; earlier ones get a copy.
    fn take_input(
        &self,
        from: &str,
        outputs: &mut HashMap<String, IoValue>,
        consumers: &mut HashMap<&str, usize>,
    ) -> IoValue {
        let remaining = match consumers.get_mut(from) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };

        if remaining == 0 && !self.config.extract_outputs {
            outputs.remove(from).unwrap_or(IoValue::None)
        } else {
            outputs.get(from).cloned().unwrap_or(IoValue::None)
        }
    }

    fn log_output(&self, block: &str, output: &IoValue) {
        if !self.config.debug {
            return;
        }
        match self.config.debug_granularity {
            DebugGranularity::Skip => {}
            DebugGranularity::Minimal => {
                tracing::debug!(target: TRACING_TARGET, block, "output: {}", output.summary());
            }
            DebugGranularity::Exhaustive => {
                tracing::debug!(target: TRACING_TARGET, block, "output: {}", output.summary());
                for line in output_lines(output) {
                    tracing::debug!(target: TRACING_TARGET, block, "  {}", line);
                }
            }
        }
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Run one executor, checking the values crossing it against its declared
/// types
async fn dispatch(
    executor: &dyn BlockExecutor,
    input: IoValue,
    context: &mut ExecutionContext,
) -> ExecutionResult<IoValue> {
    let location = executor.block().location();
    input
        .expect_type(executor.input_type())
        .map_err(|e| e.or_location(location.clone()))?;

    let output = executor
        .execute(input, context)
        .await
        .map_err(|e| e.or_location(location.clone()))?;

    output
        .expect_type(executor.output_type())
        .map_err(|e| e.or_location(location))?;
    Ok(output)
}

/// Row-by-row rendering of a value for exhaustive debug output
fn output_lines(value: &IoValue) -> Vec<String> {
    match value {
        IoValue::Sheet(sheet) => sheet.data().iter().map(|row| row.join(" | ")).collect(),
        IoValue::Table(table) => format_table(table, usize::MAX),
        IoValue::Workbook(workbook) => workbook
            .sheet_names()
            .into_iter()
            .map(|name| format!("sheet `{}`", name))
            .collect(),
        IoValue::File(file) => match file.as_text() {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        },
        IoValue::None | IoValue::Primitive(_) => Vec::new(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
