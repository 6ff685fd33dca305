//! Typed I/O model
//!
//! Every block declares the [`IoType`] it consumes and produces. A pipe
//! between two blocks is valid only when the upstream output type equals the
//! downstream input type. `None` on the input side marks a source, on the
//! output side a sink.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::result::{ExecutionError, ExecutionResult};
use super::value_type::{PrimitiveValue, PrimitiveValueType};
use crate::data::{File, Sheet, Table, Workbook};

/// Kind of value flowing between blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoType {
    None,
    File,
    Workbook,
    Sheet,
    Table,
    Primitive(PrimitiveValueType),
}

impl IoType {
    /// Whether a block producing `self` may feed a block consuming `to`
    pub fn can_connect(self, to: IoType) -> bool {
        self == to
    }

    pub fn is_none(self) -> bool {
        self == IoType::None
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoType::None => f.write_str("None"),
            IoType::File => f.write_str("File"),
            IoType::Workbook => f.write_str("Workbook"),
            IoType::Sheet => f.write_str("Sheet"),
            IoType::Table => f.write_str("Table"),
            IoType::Primitive(p) => write!(f, "{}", p),
        }
    }
}

/// Free-function form of [`IoType::can_connect`]
pub fn can_connect(from: IoType, to: IoType) -> bool {
    from.can_connect(to)
}

/// A value flowing between blocks
#[derive(Debug, Clone)]
pub enum IoValue {
    None,
    File(File),
    Workbook(Workbook),
    Sheet(Sheet),
    Table(Table),
    Primitive(PrimitiveValue),
}

impl IoValue {
    pub fn io_type(&self) -> IoType {
        match self {
            IoValue::None => IoType::None,
            IoValue::File(_) => IoType::File,
            IoValue::Workbook(_) => IoType::Workbook,
            IoValue::Sheet(_) => IoType::Sheet,
            IoValue::Table(_) => IoType::Table,
            IoValue::Primitive(p) => IoType::Primitive(p.value_type()),
        }
    }

    /// Fail with a type mismatch unless the value has the expected type
    pub fn expect_type(&self, expected: IoType) -> ExecutionResult<()> {
        let actual = self.io_type();
        if actual == expected {
            Ok(())
        } else {
            Err(mismatch(expected, actual))
        }
    }

    pub fn into_file(self) -> ExecutionResult<File> {
        match self {
            IoValue::File(file) => Ok(file),
            other => Err(mismatch(IoType::File, other.io_type())),
        }
    }

    pub fn into_workbook(self) -> ExecutionResult<Workbook> {
        match self {
            IoValue::Workbook(workbook) => Ok(workbook),
            other => Err(mismatch(IoType::Workbook, other.io_type())),
        }
    }

    pub fn into_sheet(self) -> ExecutionResult<Sheet> {
        match self {
            IoValue::Sheet(sheet) => Ok(sheet),
            other => Err(mismatch(IoType::Sheet, other.io_type())),
        }
    }

    pub fn into_table(self) -> ExecutionResult<Table> {
        match self {
            IoValue::Table(table) => Ok(table),
            other => Err(mismatch(IoType::Table, other.io_type())),
        }
    }

    /// One-line description used in debug output
    pub fn summary(&self) -> String {
        match self {
            IoValue::None => "None".to_string(),
            IoValue::File(file) => format!(
                "File `{}` ({}, {} bytes)",
                file.name,
                file.mime_type,
                file.size()
            ),
            IoValue::Workbook(workbook) => format!(
                "Workbook with {} sheet(s): {}",
                workbook.len(),
                workbook.sheet_names().join(", ")
            ),
            IoValue::Sheet(sheet) => {
                format!("Sheet {} x {}", sheet.width(), sheet.height())
            }
            IoValue::Table(table) => format!(
                "Table with {} column(s) and {} row(s)",
                table.width(),
                table.row_count()
            ),
            IoValue::Primitive(value) => format!("{:?}", value),
        }
    }
}

fn mismatch(expected: IoType, actual: IoType) -> ExecutionError {
    ExecutionError::type_mismatch(format!(
        "Expected a value of type {} but received {}",
        expected, actual
    ))
}

impl From<File> for IoValue {
    fn from(file: File) -> Self {
        IoValue::File(file)
    }
}

impl From<Workbook> for IoValue {
    fn from(workbook: Workbook) -> Self {
        IoValue::Workbook(workbook)
    }
}

impl From<Sheet> for IoValue {
    fn from(sheet: Sheet) -> Self {
        IoValue::Sheet(sheet)
    }
}

impl From<Table> for IoValue {
    fn from(table: Table) -> Self {
        IoValue::Table(table)
    }
}
