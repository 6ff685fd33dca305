//! Typed tables produced by layout validation

use crate::core::value_type::{PrimitiveValue, ValueTypeRef};

/// A sheet projected through a layout.
///
/// `column_types` is indexed by column position and has one entry per column
/// of the source sheet; columns without a declared type are `None`. Cells stay
/// raw text, [`Table::typed_cell`] parses them on demand.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub column_names: Vec<String>,
    pub column_types: Vec<Option<ValueTypeRef>>,
    pub data: Vec<Vec<String>>,
}

impl Table {
    pub fn new(
        column_names: Vec<String>,
        column_types: Vec<Option<ValueTypeRef>>,
        data: Vec<Vec<String>>,
    ) -> Self {
        Self {
            column_names,
            column_types,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.column_types.len()
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn column_name(&self, column: usize) -> Option<&str> {
        self.column_names.get(column).map(String::as_str)
    }

    pub fn column_type(&self, column: usize) -> Option<&ValueTypeRef> {
        self.column_types.get(column)?.as_ref()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.data.get(row)?.get(column).map(String::as_str)
    }

    /// Parse a cell through its declared column type.
    ///
    /// Returns `None` when the cell is missing, the column has no declared
    /// type, or the text does not parse.
    pub fn typed_cell(&self, row: usize, column: usize) -> Option<PrimitiveValue> {
        let raw = self.cell(row, column)?;
        self.column_type(column)?.parse(raw)
    }
}
