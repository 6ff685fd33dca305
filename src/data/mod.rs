//! Data shapes flowing between blocks
//!
//! Files, workbooks, sheets and tables are plain owned values. They are moved
//! (or cloned when a producer feeds several consumers) from block to block and
//! are never shared mutably.

pub mod file;
pub mod filesystem;
pub mod sheet;
pub mod table;

pub use file::{File, FileExtension, MimeType};
pub use filesystem::{normalize_path, FileSystem, InMemoryFileSystem};
pub use sheet::{Sheet, Workbook};
pub use table::Table;
