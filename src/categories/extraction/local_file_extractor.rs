//! Local File Extractor Block
//!
//! Reads a file from the local disk. The path is resolved against the
//! configured file root (the working directory by default), canonicalized,
//! and must stay inside that root.
//!
//! ## Properties
//!
//! | Property | Type | Description |
//! |----------|------|-------------|
//! | `filePath` | text | Path of the file, relative to the file root |
//!
//! ## Metrics tracked
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `bytes_read` | Counter | Size of the extracted file |

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::categories::BlockCategory;
use crate::core::block::{BlockDefinition, BlockExecutor, ExecutionContext};
use crate::core::io_type::{IoType, IoValue};
use crate::core::registry::ExecutorType;
use crate::core::result::{ExecutionError, ExecutionResult};
use crate::data::File;

const TRACING_TARGET: &str = "block_pipeline::categories::extraction";

const FILE_PATH: &str = "filePath";

pub struct LocalFileExtractor {
    block: BlockDefinition,
}

impl LocalFileExtractor {
    fn traversal_error(&self, file_path: &str) -> ExecutionError {
        ExecutionError::io(format!(
            "File path \"{}\" is not allowed. Path traversal is restricted.",
            file_path
        ))
        .with_location(self.block.property_location(FILE_PATH))
    }

    fn read_error(&self, file_path: &str, error: std::io::Error) -> ExecutionError {
        ExecutionError::io(format!("File \"{}\" could not be read: {}", file_path, error))
            .with_location(self.block.property_location(FILE_PATH))
    }

    async fn resolve(&self, file_path: &str, root: &Path) -> ExecutionResult<PathBuf> {
        if Path::new(file_path)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(self.traversal_error(file_path));
        }

        let root = tokio::fs::canonicalize(root).await.map_err(|e| {
            ExecutionError::io(format!(
                "File root \"{}\" is not accessible: {}",
                root.display(),
                e
            ))
        })?;
        let resolved = tokio::fs::canonicalize(root.join(file_path))
            .await
            .map_err(|e| self.read_error(file_path, e))?;

        if !resolved.starts_with(&root) {
            return Err(self.traversal_error(file_path));
        }
        Ok(resolved)
    }
}

impl ExecutorType for LocalFileExtractor {
    const TYPE: &'static str = "LocalFileExtractor";
    const CATEGORY: BlockCategory = BlockCategory::Extraction;

    fn from_definition(block: BlockDefinition) -> Self {
        Self { block }
    }
}

#[async_trait]
impl BlockExecutor for LocalFileExtractor {
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
        let file_path = self.block.text_property(FILE_PATH)?;
        let root = match &context.config().file_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };

        let resolved = self.resolve(file_path, &root).await?;
        let content = tokio::fs::read(&resolved)
            .await
            .map_err(|e| self.read_error(file_path, e))?;

        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.to_string());

        tracing::debug!(
            target: TRACING_TARGET,
            block = %self.block.name,
            path = %resolved.display(),
            bytes = content.len(),
            "extracted local file"
        );
        context.metrics().record("bytes_read", content.len() as f64);

        Ok(IoValue::File(File::from_name(name, content)))
    }
}
