//! Layout declarations
//!
//! A layout is an ordered list of sections, each binding a value type to a
//! row or to a column of a sheet. At most one row section is the header row.

pub mod validator;

use std::fmt;

use crate::core::result::{ExecutionError, ExecutionResult};
use crate::core::value_type::ValueTypeRef;

pub use validator::{find_violations, project, validate, validate_and_project, Violation};

/// Spreadsheet letters for a 0-based column index: 0 → `A`, 25 → `Z`,
/// 26 → `AA`
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// 0-based column index for spreadsheet letters (case-insensitive); `None`
/// for anything that is not a non-empty run of ASCII letters
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Column reference of a column section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Spreadsheet letters such as `A` or `AB`
    Letters(String),
    /// 0-based column index
    Index(usize),
}

impl ColumnSelector {
    /// Parse a selector: letters, or a non-negative integer used as is
    pub fn parse(raw: &str) -> ExecutionResult<Self> {
        let raw = raw.trim();
        if let Ok(index) = raw.parse::<usize>() {
            return Ok(ColumnSelector::Index(index));
        }
        if column_index(raw).is_some() {
            return Ok(ColumnSelector::Letters(raw.to_ascii_uppercase()));
        }
        Err(ExecutionError::validation(format!(
            "`{}` is not a valid column reference",
            raw
        ))
        .with_hint("Use spreadsheet letters such as A or AB, or a column index"))
    }

    /// 0-based column position; `None` for letters that are not a column
    /// reference
    pub fn index(&self) -> Option<usize> {
        match self {
            ColumnSelector::Letters(letters) => column_index(letters),
            ColumnSelector::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Letters(letters) => f.write_str(letters),
            ColumnSelector::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowSection {
    /// 1-based row number
    pub row_id: usize,
    pub header: bool,
    pub value_type: ValueTypeRef,
}

#[derive(Debug, Clone)]
pub struct ColumnSection {
    pub selector: ColumnSelector,
    pub value_type: ValueTypeRef,
}

#[derive(Debug, Clone)]
pub enum Section {
    Row(RowSection),
    Column(ColumnSection),
}

impl Section {
    pub fn row(row_id: usize, value_type: ValueTypeRef) -> Self {
        Section::Row(RowSection {
            row_id,
            header: false,
            value_type,
        })
    }

    pub fn header(row_id: usize, value_type: ValueTypeRef) -> Self {
        Section::Row(RowSection {
            row_id,
            header: true,
            value_type,
        })
    }

    pub fn column(selector: ColumnSelector, value_type: ValueTypeRef) -> Self {
        Section::Column(ColumnSection {
            selector,
            value_type,
        })
    }

    pub fn value_type(&self) -> &ValueTypeRef {
        match self {
            Section::Row(row) => &row.value_type,
            Section::Column(column) => &column.value_type,
        }
    }
}

/// Validated list of sections
#[derive(Debug, Clone, Default)]
pub struct Layout {
    sections: Vec<Section>,
}

impl Layout {
    /// Build a layout. Row ids are 1-based, at most one row may be the
    /// header and every column selector must name a column.
    pub fn new(sections: Vec<Section>) -> ExecutionResult<Self> {
        let mut headers = 0;
        for section in &sections {
            match section {
                Section::Row(row) => {
                    if row.row_id == 0 {
                        return Err(ExecutionError::validation(
                            "Row numbers in a layout start at 1",
                        ));
                    }
                    if row.header {
                        headers += 1;
                    }
                }
                Section::Column(column) => {
                    if column.selector.index().is_none() {
                        return Err(ExecutionError::validation(format!(
                            "`{}` is not a valid column reference",
                            column.selector
                        ))
                        .with_hint("Use spreadsheet letters such as A or AB, or a column index"));
                    }
                }
            }
        }
        if headers > 1 {
            return Err(ExecutionError::validation(format!(
                "A layout can declare at most one header row, found {}",
                headers
            ))
            .with_hint("Remove the header marker from all but one row"));
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn header_row(&self) -> Option<&RowSection> {
        self.row_sections().find(|row| row.header)
    }

    pub fn row_sections(&self) -> impl Iterator<Item = &RowSection> {
        self.sections.iter().filter_map(|s| match s {
            Section::Row(row) => Some(row),
            Section::Column(_) => None,
        })
    }

    pub fn column_sections(&self) -> impl Iterator<Item = &ColumnSection> {
        self.sections.iter().filter_map(|s| match s {
            Section::Column(column) => Some(column),
            Section::Row(_) => None,
        })
    }
}
