//! Tabular blocks
//!
//! Blocks that pick, reshape and validate sheets.

pub mod column_deleter;
pub mod layout_validator;
pub mod row_deleter;
pub mod sheet_picker;

pub use column_deleter::ColumnDeleter;
pub use layout_validator::LayoutValidator;
pub use row_deleter::RowDeleter;
pub use sheet_picker::SheetPicker;
