//! Criterion benchmarks for pipeline execution.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure layout validation, path normalization and whole
//! pipeline runs over sheets of increasing size.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use block_pipeline::categories::BlockCategory;
use block_pipeline::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use block_pipeline::core::io_type::{IoType, IoValue};
use block_pipeline::core::registry::ExecutorType;
use block_pipeline::core::result::ExecutionResult;
use block_pipeline::core::value_type::PrimitiveValueType;
use block_pipeline::data::{normalize_path, Sheet};
use block_pipeline::layout::validator::{find_violations, validate_and_project};
use block_pipeline::layout::{ColumnSelector, Layout, Section};
use block_pipeline::runtime::{EngineConfig, ExecutionEngine, Pipeline};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_sheet(rows: usize) -> Sheet {
    let mut data = vec![vec!["id".to_string(), "name".to_string(), "score".to_string()]];
    for i in 0..rows {
        data.push(vec![i.to_string(), format!("user_{}", i), format!("{}.5", i % 100)]);
    }
    Sheet::new(data)
}

fn make_layout() -> Layout {
    Layout::new(vec![
        Section::header(1, PrimitiveValueType::Text.shared()),
        Section::column(ColumnSelector::Letters("A".into()), PrimitiveValueType::Integer.shared()),
        Section::column(ColumnSelector::Letters("C".into()), PrimitiveValueType::Decimal.shared()),
    ])
    .unwrap()
}

/// Source producing a generated sheet with `size` data rows
struct GeneratedSheet {
    block: BlockDefinition,
}

impl ExecutorType for GeneratedSheet {
    const TYPE: &'static str = "GeneratedSheet";
    const CATEGORY: BlockCategory = BlockCategory::Extraction;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for GeneratedSheet {
    fn block_type(&self) -> &str {
        Self::TYPE
    }

    fn block(&self) -> &BlockDefinition {
        &self.block
    }

    fn input_type(&self) -> IoType {
        IoType::None
    }

    fn output_type(&self) -> IoType {
        IoType::Sheet
    }

    async fn execute(&self, _input: IoValue, _context: &mut ExecutionContext) -> ExecutionResult<IoValue> {
        let size = self.block.integer_property("size")?;
        Ok(IoValue::Sheet(make_sheet(size.max(0) as usize)))
    }
}

// ---------------------------------------------------------------------------
// Layout Benchmarks
// ---------------------------------------------------------------------------

fn bench_layout_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_validation");
    let layout = make_layout();

    for rows in [100, 1_000, 10_000] {
        let sheet = make_sheet(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &sheet, |b, sheet| {
            b.iter(|| black_box(find_violations(sheet, &layout).len()));
        });
    }
    group.finish();
}

fn bench_layout_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_projection");
    let layout = make_layout();

    for rows in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &n| {
            b.iter_with_setup(
                || make_sheet(n),
                |sheet| black_box(validate_and_project(sheet, &layout).map(|t| t.row_count())),
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Filesystem Benchmarks
// ---------------------------------------------------------------------------

fn bench_normalize_path(c: &mut Criterion) {
    c.bench_function("normalize_path", |b| {
        b.iter(|| black_box(normalize_path(black_box("/Data//raw/./../Cars\\2024\\cars.CSV"))));
    });
}

// ---------------------------------------------------------------------------
// Engine Benchmarks
// ---------------------------------------------------------------------------

fn bench_pipeline_execution(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let engine = ExecutionEngine::new(EngineConfig::default()).unwrap();
    engine.registry().register_type::<GeneratedSheet>();

    let mut group = c.benchmark_group("pipeline_execution");
    for rows in [100, 1_000, 10_000] {
        let pipeline = Pipeline::chain(
            "Bench",
            vec![
                BlockDefinition::builtin("source", GeneratedSheet::TYPE).with_property("size", rows as i64),
                BlockDefinition::builtin("drop", "ColumnDeleter").with_property("delete", vec!["B"]),
                BlockDefinition::builtin("validator", "LayoutValidator").with_property(
                    "layout",
                    Layout::new(vec![Section::header(1, PrimitiveValueType::Text.shared())]).unwrap(),
                ),
            ],
        );

        group.bench_with_input(BenchmarkId::from_parameter(rows), &pipeline, |b, pipeline| {
            b.iter(|| {
                let outcome = runtime.block_on(engine.execute(pipeline));
                black_box(outcome.exit_code())
            });
        });
    }
    group.finish();
}

criterion_group!(layout_benches, bench_layout_validation, bench_layout_projection);

criterion_group!(filesystem_benches, bench_normalize_path);

criterion_group!(engine_benches, bench_pipeline_execution);

criterion_main!(layout_benches, filesystem_benches, engine_benches);
