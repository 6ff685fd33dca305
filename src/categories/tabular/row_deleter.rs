//! Row Deleter Block
//!
//! Removes rows from a sheet. Row numbers are 1-based, the way they are shown
//! in a spreadsheet.
//!
//! ## Metrics tracked
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `rows_deleted` | Counter | Rows removed from the sheet |

use async_trait::async_trait;

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::{ExecutionError, ExecutionResult};

const DELETE: &str = "delete";

pub struct RowDeleter {
    block: BlockDefinition,
}

impl RowDeleter {
    /// 0-based indices of the rows to delete, checked against the sheet height
    fn row_indices(&self, height: usize) -> ExecutionResult<Vec<usize>> {
        let mut indices = Vec::new();
        for item in self.block.list_property(DELETE)? {
            let row = match item.as_integer() {
                Some(row) if row >= 1 => row as usize,
                _ => {
                    return Err(ExecutionError::validation(format!(
                        "`{}` is not a valid row number, rows are numbered from 1",
                        item
                    ))
                    .with_location(self.block.property_location(DELETE)))
                }
            };
            if row > height {
                return Err(ExecutionError::validation(format!(
                    "Row {} does not exist, the sheet has {} row(s)",
                    row, height
                ))
                .with_location(self.block.property_location(DELETE)));
            }
            indices.push(row - 1);
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }
}

impl ExecutorType for RowDeleter {
    const TYPE: &'static str = "RowDeleter";
    const CATEGORY: BlockCategory = BlockCategory::Transformation;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for RowDeleter {
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
        IoType::Sheet
    }

    async fn execute(
        &self,
        input: IoValue,
        context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue> {
        let mut sheet = input.into_sheet()?;
        let indices = self.row_indices(sheet.height())?;

        sheet.delete_rows(&indices);
        context.metrics().record("rows_deleted", indices.len() as f64);
        Ok(IoValue::Sheet(sheet))
    }
}
