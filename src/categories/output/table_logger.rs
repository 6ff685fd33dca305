//! Table Logger Block
//!
//! Sink that writes a table to the log, header first. `maxRows` limits the
//! number of data rows written (10 by default).

use async_trait::async_trait;

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::{ExecutionError, ExecutionResult};
use crate::data::Table;

const TRACING_TARGET: &str = "block_pipeline::categories::output";

const MAX_ROWS: &str = "maxRows";
const DEFAULT_MAX_ROWS: usize = 10;

/// Render a table as `|`-separated lines: header, data rows, then a line
/// counting the rows left out
pub fn format_table(table: &Table, max_rows: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if !table.column_names.is_empty() {
        lines.push(table.column_names.join(" | "));
    }
    for row in table.data.iter().take(max_rows) {
        lines.push(row.join(" | "));
    }
    if table.row_count() > max_rows {
        lines.push(format!("... {} more row(s)", table.row_count() - max_rows));
    }
    lines
}

pub struct TableLogger {
    block: BlockDefinition,
}

impl TableLogger {
    fn max_rows(&self) -> ExecutionResult<usize> {
        match self.block.optional_integer_property(MAX_ROWS)? {
            None => Ok(DEFAULT_MAX_ROWS),
            Some(n) if n >= 0 => Ok(n as usize),
            Some(n) => Err(ExecutionError::validation(format!(
                "`maxRows` must not be negative, got {}",
                n
            ))
            .with_location(self.block.property_location(MAX_ROWS))),
        }
    }
}

impl ExecutorType for TableLogger {
    const TYPE: &'static str = "TableLogger";
    const CATEGORY: BlockCategory = BlockCategory::Output;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for TableLogger {
    fn block_type(&self) -> &str {
        Self::TYPE
    }

    fn block(&self) -> &BlockDefinition {
        &self.block
    }

    fn input_type(&self) -> IoType {
        IoType::Table
    }

    fn output_type(&self) -> IoType {
        IoType::None
    }

    async fn execute(
        &self,
        input: IoValue,
        _context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue> {
        let max_rows = self.max_rows()?;
        let table = input.into_table()?;

        for line in format_table(&table, max_rows) {
            tracing::info!(target: TRACING_TARGET, block = %self.block.name, "{}", line);
        }
        Ok(IoValue::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["name".into(), "hp".into()],
            vec![None, None],
            vec![
                vec!["mini".into(), "90".into()],
                vec!["beetle".into(), "50".into()],
                vec!["golf".into(), "110".into()],
            ],
        )
    }

    #[test]
    fn test_format_table() {
        let lines = format_table(&table(), 2);
        assert_eq!(
            lines,
            vec!["name | hp", "mini | 90", "beetle | 50", "... 1 more row(s)"]
        );
        assert_eq!(format_table(&table(), 10).len(), 4);
    }

    #[tokio::test]
    async fn test_logger_is_a_sink() {
        let mut context = ExecutionContext::default();
        let logger = TableLogger::from_definition(
            BlockDefinition::builtin("logger", TableLogger::TYPE).with_property(MAX_ROWS, 1i64),
        );
        let output = logger
            .execute(IoValue::Table(table()), &mut context)
            .await
            .unwrap();
        assert_eq!(output.io_type(), IoType::None);
    }

    #[tokio::test]
    async fn test_negative_max_rows() {
        let mut context = ExecutionContext::default();
        let logger = TableLogger::from_definition(
            BlockDefinition::builtin("logger", TableLogger::TYPE).with_property(MAX_ROWS, -1i64),
        );
        let err = logger
            .execute(IoValue::Table(table()), &mut context)
            .await
            .unwrap_err();
        assert!(err.message.contains("must not be negative"));
    }
}
