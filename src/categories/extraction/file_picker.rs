//! File Picker Block
//!
//! Picks a file from the run's in-memory filesystem. Lookups go through path
//! normalization, so `./Data/Cars.csv` and `data/cars.csv` name the same file.
//!
//! ## Properties
//!
//! | Property | Type | Description |
//! |----------|------|-------------|
//! | `path` | text | Logical path of the file |

use async_trait::async_trait;

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::{ExecutionError, ExecutionResult};
use crate::data::FileSystem;

const PATH: &str = "path";

pub struct FilePicker {
    block: BlockDefinition,
}

impl ExecutorType for FilePicker {
    const TYPE: &'static str = "FilePicker";
    const CATEGORY: BlockCategory = BlockCategory::Extraction;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for FilePicker {
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
        IoType::File
    }

    async fn execute(
        &self,
        _input: IoValue,
        context: &mut ExecutionContext,
    ) -> ExecutionResult<IoValue> {
        let path = self.block.text_property(PATH)?;
        match context.file_system().get_file(path) {
            Some(file) => Ok(IoValue::File(file.clone())),
            None => Err(ExecutionError::io(format!(
                "File \"{}\" was not found in the virtual file system",
                path
            ))
            .with_hint("Check that an earlier step stored the file under this path")
            .with_location(self.block.property_location(PATH))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::ErrorKind;
    use crate::data::{File, InMemoryFileSystem};

    fn picker(path: &str) -> FilePicker {
        FilePicker::from_definition(
            BlockDefinition::builtin("picker", FilePicker::TYPE).with_property(PATH, path),
        )
    }

    #[tokio::test]
    async fn test_picks_file_with_normalized_path() {
        let mut fs = InMemoryFileSystem::new();
        fs.put_file("data/cars.csv", File::from_name("cars.csv", b"a,b".to_vec()));
        let mut context = ExecutionContext::default().with_file_system(fs);

        let file = picker("./Data/../data/CARS.csv")
            .execute(IoValue::None, &mut context)
            .await
            .unwrap()
            .into_file()
            .unwrap();
        assert_eq!(file.name, "cars.csv");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut context = ExecutionContext::default();
        let err = picker("missing.txt")
            .execute(IoValue::None, &mut context)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.location.unwrap().property.as_deref(), Some(PATH));
    }
}
