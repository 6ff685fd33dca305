//! Column Deleter Block
//!
//! Removes columns from a sheet. Columns are referenced by spreadsheet
//! letters (`A`, `B`, ..., `AA`) or by 0-based index.
//!
//! ## Metrics tracked
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `columns_deleted` | Counter | Columns removed from the sheet |

use async_trait::async_trait;

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::{ExecutionError, ExecutionResult};
use crate::layout::ColumnSelector;

const DELETE: &str = "delete";

pub struct ColumnDeleter {
    block: BlockDefinition,
}

impl ColumnDeleter {
    fn column_indices(&self, width: usize) -> ExecutionResult<Vec<usize>> {
        let location = || self.block.property_location(DELETE);
        let mut indices = Vec::new();
        for item in self.block.list_property(DELETE)? {
            let raw = item.as_text().ok_or_else(|| {
                ExecutionError::validation(format!("`{}` is not a column reference", item))
                    .with_location(location())
            })?;
            let selector = ColumnSelector::parse(raw).map_err(|e| e.with_location(location()))?;
            match selector.index() {
                Some(index) if index < width => indices.push(index),
                _ => {
                    return Err(ExecutionError::validation(format!(
                        "Column {} does not exist, the sheet has {} column(s)",
                        selector, width
                    ))
                    .with_location(location()))
                }
            }
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }
}

impl ExecutorType for ColumnDeleter {
    const TYPE: &'static str = "ColumnDeleter";
    const CATEGORY: BlockCategory = BlockCategory::Transformation;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for ColumnDeleter {
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
        let indices = self.column_indices(sheet.width())?;

        sheet.delete_columns(&indices);
        context
            .metrics()
            .record("columns_deleted", indices.len() as f64);
        Ok(IoValue::Sheet(sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::ErrorKind;
    use crate::data::Sheet;

    fn sheet() -> IoValue {
        IoValue::Sheet(Sheet::from_rows(vec![
            vec!["id", "name", "hp"],
            vec!["1", "mini", "90"],
        ]))
    }

    fn deleter(delete: Vec<&str>) -> ColumnDeleter {
        ColumnDeleter::from_definition(
            BlockDefinition::builtin("deleter", ColumnDeleter::TYPE).with_property(DELETE, delete),
        )
    }

    #[tokio::test]
    async fn test_deletes_by_letter_and_index() {
        let mut context = ExecutionContext::default();
        let out = deleter(vec!["a", "2"])
            .execute(sheet(), &mut context)
            .await
            .unwrap()
            .into_sheet()
            .unwrap();

        assert_eq!(out.width(), 1);
        assert_eq!(out.column(0), vec!["name", "mini"]);
        assert_eq!(context.metrics().get_values("columns_deleted"), vec![2.0]);
    }

    #[tokio::test]
    async fn test_unknown_column() {
        let mut context = ExecutionContext::default();
        let err = deleter(vec!["D"])
            .execute(sheet(), &mut context)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("Column D does not exist"));

        let err = deleter(vec!["A1"])
            .execute(sheet(), &mut context)
            .await
            .unwrap_err();
        assert!(err.message.contains("not a valid column reference"));
        assert_eq!(err.location.unwrap().property.as_deref(), Some(DELETE));
    }
}
