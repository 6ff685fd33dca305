//! Layout Validator Block
//!
//! Checks a sheet against a declared layout and projects it into a table.
//! All violations are reported together in a single error.
//!
//! ## Metrics tracked
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `layout.rows` | Gauge | Rows of the validated sheet |
//! | `layout.violations` | Gauge | Cells that did not match their declared type |

use async_trait::async_trait;

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::ExecutionResult;
use crate::layout::validator::{find_violations, project, violations_error};

const TRACING_TARGET: &str = "block_pipeline::categories::tabular";

const LAYOUT: &str = "layout";

pub struct LayoutValidator {
    block: BlockDefinition,
}

impl ExecutorType for LayoutValidator {
    const TYPE: &'static str = "LayoutValidator";
    const CATEGORY: BlockCategory = BlockCategory::Validation;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for LayoutValidator {
    fn block_type(&self) -> &str {
        Self::TYPE
    }

    fn block(&self) -> &BlockDefinition {
        &self.block
    }

    fn input_type(&self) -> IoType {
        IoType::Sheet
    }

    fn output_type(&self) -> IoType {
        IoType::Table
    }

    async fn execute(
        &self,
        input: IoValue,
        context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue> {
        let layout = self.block.layout_property(LAYOUT)?;
        let sheet = input.into_sheet()?;

        let violations = find_violations(&sheet, layout);
        context.metrics().record("layout.rows", sheet.height() as f64);
        context
            .metrics()
            .record("layout.violations", violations.len() as f64);

        if !violations.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET,
                block = %self.block.name,
                violations = violations.len(),
                "layout validation failed"
            );
            return Err(violations_error(&violations).with_location(self.block.location()));
        }

        Ok(IoValue::Table(project(sheet, layout)))
    }
}
