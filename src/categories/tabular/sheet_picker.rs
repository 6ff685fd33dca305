//! Sheet Picker Block
//!
//! Selects one sheet of a workbook by name.

use async_trait::async_trait;

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::{ExecutionError, ExecutionResult};

const SHEET_NAME: &str = "sheetName";

pub struct SheetPicker {
    block: BlockDefinition,
}

impl ExecutorType for SheetPicker {
    const TYPE: &'static str = "SheetPicker";
    const CATEGORY: BlockCategory = BlockCategory::Transformation;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for SheetPicker {
    fn block_type(&self) -> &str {
        Self::TYPE
    }

    fn block(&self) -> &BlockDefinition {
        &self.block
    }

    fn input_type(&self) -> IoType {
        IoType::Workbook
    }

    fn output_type(&self) -> IoType {
        IoType::Sheet
    }

    async fn execute(
        &self,
        input: IoValue,
        _context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue> {
        let sheet_name = self.block.text_property(SHEET_NAME)?;
        let mut workbook = input.into_workbook()?;

        match workbook.take_sheet(sheet_name) {
            Some(sheet) => Ok(IoValue::Sheet(sheet)),
            None => Err(ExecutionError::io(format!(
                "Workbook does not contain a sheet named \"{}\". Available sheets: {}",
                sheet_name,
                workbook.sheet_names().join(", ")
            ))
            .with_location(self.block.property_location(SHEET_NAME))),
        }
    }
}
