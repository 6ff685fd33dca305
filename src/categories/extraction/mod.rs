//! Extraction blocks
//!
//! Sources that bring files into a pipeline, from the local disk or from the
//! run's in-memory filesystem.

pub mod file_picker;
pub mod local_file_extractor;

pub use file_picker::FilePicker;
pub use local_file_extractor::LocalFileExtractor;
