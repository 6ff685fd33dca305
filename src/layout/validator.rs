//! Layout validation and table projection
//!
//! Validation never short-circuits: every section is checked against the
//! sheet and every violation is collected, so one failed run reports every
//! offending cell at once. Parsing is delegated to the section's value type.

use std::fmt;

use super::{column_letters, Layout};
use crate::core::result::{ExecutionError, ExecutionResult};
use crate::data::{Sheet, Table};

/// Hint attached to every failed layout validation
pub const LAYOUT_HINT: &str = "Please check your defined layout.";

/// A cell that does not match the type its section declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based sheet row
    pub row: usize,
    /// Column letters for row sections, the section's selector for column
    /// sections
    pub column: String,
    /// Raw cell text
    pub value: String,
    /// Display name of the expected type
    pub expected: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[row {}, column {}] Value \"{}\" does not match type {}",
            self.row, self.column, self.value, self.expected
        )
    }
}

/// Check every section of the layout against the sheet.
///
/// Row sections check every cell of the declared row; a row beyond the sheet
/// has no cells and passes. Column sections check every cell of the selected
/// column except the header row; a column beyond the sheet passes.
pub fn find_violations(sheet: &Sheet, layout: &Layout) -> Vec<Violation> {
    let header_index = layout.header_row().map(|h| h.row_id - 1);
    let mut violations = Vec::new();

    for section in layout.row_sections() {
        let Some(cells) = sheet.row(section.row_id - 1) else {
            continue;
        };
        for (column, cell) in cells.iter().enumerate() {
            if !section.value_type.is_valid(cell) {
                violations.push(Violation {
                    row: section.row_id,
                    column: column_letters(column),
                    value: cell.clone(),
                    expected: section.value_type.name().to_string(),
                });
            }
        }
    }

    for section in layout.column_sections() {
        let Some(column) = section.selector.index().filter(|c| *c < sheet.width()) else {
            continue;
        };
        for (row, cells) in sheet.data().iter().enumerate() {
            if Some(row) == header_index {
                continue;
            }
            let cell = cells.get(column).map(String::as_str).unwrap_or("");
            if !section.value_type.is_valid(cell) {
                violations.push(Violation {
                    row: row + 1,
                    column: section.selector.to_string(),
                    value: cell.to_string(),
                    expected: section.value_type.name().to_string(),
                });
            }
        }
    }

    violations
}

/// Validate the sheet, folding all violations into a single error
pub fn validate(sheet: &Sheet, layout: &Layout) -> ExecutionResult<()> {
    let violations = find_violations(sheet, layout);
    if violations.is_empty() {
        return Ok(());
    }
    Err(violations_error(&violations))
}

pub(crate) fn violations_error(violations: &[Violation]) -> ExecutionError {
    let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
    ExecutionError::validation(format!(
        "Layout validation failed. Found the following issues:\n\n{}",
        lines.join("\n")
    ))
    .with_hint(LAYOUT_HINT)
}

/// Project a sheet into a table.
///
/// Column names come from the header row, if one is declared and present.
/// Column types are indexed by position over the sheet width; later column
/// sections override earlier ones for the same column. The header row is
/// removed from the data exactly once.
pub fn project(sheet: Sheet, layout: &Layout) -> Table {
    let width = sheet.width();
    let header_index = layout.header_row().map(|h| h.row_id - 1);

    let mut column_types = vec![None; width];
    for section in layout.column_sections() {
        let Some(column) = section.selector.index() else {
            continue;
        };
        if let Some(slot) = column_types.get_mut(column) {
            *slot = Some(section.value_type.clone());
        }
    }

    let mut column_names = Vec::new();
    let mut data = Vec::with_capacity(sheet.height());
    for (row, cells) in sheet.into_data().into_iter().enumerate() {
        if Some(row) == header_index {
            column_names = cells;
        } else {
            data.push(cells);
        }
    }

    Table::new(column_names, column_types, data)
}

/// Validate and, on success, project
pub fn validate_and_project(sheet: Sheet, layout: &Layout) -> ExecutionResult<Table> {
    validate(&sheet, layout)?;
    Ok(project(sheet, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value_type::{
        ConstrainedValueType, PrimitiveValue, PrimitiveValueType,
    };
    use crate::core::constraint::Constraint;
    use crate::core::result::ErrorKind;
    use crate::layout::{ColumnSelector, Section};

    fn header_and_integer_a() -> Layout {
        Layout::new(vec![
            Section::header(1, PrimitiveValueType::Text.shared()),
            Section::column(
                ColumnSelector::Letters("A".into()),
                PrimitiveValueType::Integer.shared(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_valid_sheet_projects_to_table() {
        let sheet = Sheet::from_rows(vec![vec!["A", "B"], vec!["1", "x"], vec!["2", "y"]]);
        let table = validate_and_project(sheet, &header_and_integer_a()).unwrap();

        assert_eq!(table.column_names, vec!["A", "B"]);
        assert_eq!(table.column_types.len(), 2);
        assert_eq!(table.column_types[0].as_ref().unwrap().name(), "integer");
        assert!(table.column_types[1].is_none());
        assert_eq!(
            table.data,
            vec![vec!["1".to_string(), "x".into()], vec!["2".into(), "y".into()]]
        );
        assert_eq!(table.typed_cell(1, 0), Some(PrimitiveValue::Integer(2)));
    }

    #[test]
    fn test_invalid_cell_is_reported_with_location() {
        let sheet = Sheet::from_rows(vec![vec!["A", "B"], vec!["x", "x"], vec!["2", "y"]]);
        let err = validate_and_project(sheet, &header_and_integer_a()).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err
            .message
            .contains("[row 2, column A] Value \"x\" does not match type integer"));
        assert_eq!(err.hint.as_deref(), Some(LAYOUT_HINT));
    }

    #[test]
    fn test_every_violation_is_collected() {
        let sheet = Sheet::from_rows(vec![
            vec!["id", "flag"],
            vec!["a", "true"],
            vec!["b", "nope"],
            vec!["3", "maybe"],
        ]);
        let layout = Layout::new(vec![
            Section::header(1, PrimitiveValueType::Text.shared()),
            Section::column(ColumnSelector::Index(0), PrimitiveValueType::Integer.shared()),
            Section::column(
                ColumnSelector::Letters("B".into()),
                PrimitiveValueType::Boolean.shared(),
            ),
        ])
        .unwrap();

        let violations = find_violations(&sheet, &layout);
        assert_eq!(violations.len(), 4);

        let err = validate(&sheet, &layout).unwrap_err();
        let lines = err.message.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(lines, 4);
    }

    #[test]
    fn test_row_section_checks_declared_row() {
        let sheet = Sheet::from_rows(vec![vec!["1", "2"], vec!["3", "four"]]);
        let layout = Layout::new(vec![Section::row(2, PrimitiveValueType::Integer.shared())]).unwrap();

        let violations = find_violations(&sheet, &layout);
        assert_eq!(
            violations,
            vec![Violation {
                row: 2,
                column: "B".into(),
                value: "four".into(),
                expected: "integer".into(),
            }]
        );
    }

    #[test]
    fn test_out_of_range_sections_are_vacuously_valid() {
        let sheet = Sheet::from_rows(vec![vec!["1"]]);
        let layout = Layout::new(vec![
            Section::row(10, PrimitiveValueType::Integer.shared()),
            Section::column(ColumnSelector::Letters("Z".into()), PrimitiveValueType::Integer.shared()),
        ])
        .unwrap();

        assert!(validate(&sheet, &layout).is_ok());
        let table = project(sheet, &layout);
        assert_eq!(table.column_types.len(), 1);
        assert!(table.column_types[0].is_none());
    }

    #[test]
    fn test_column_check_skips_header_even_without_row_check() {
        let sheet = Sheet::from_rows(vec![vec!["not a number"], vec!["1"]]);
        let layout = Layout::new(vec![
            Section::header(1, PrimitiveValueType::Text.shared()),
            Section::column(ColumnSelector::Index(0), PrimitiveValueType::Integer.shared()),
        ])
        .unwrap();
        assert!(validate(&sheet, &layout).is_ok());
    }

    #[test]
    fn test_no_header_keeps_all_rows() {
        let sheet = Sheet::from_rows(vec![vec!["1"], vec!["2"]]);
        let layout = Layout::new(vec![Section::column(
            ColumnSelector::Index(0),
            PrimitiveValueType::Integer.shared(),
        )])
        .unwrap();
        let table = validate_and_project(sheet, &layout).unwrap();
        assert!(table.column_names.is_empty());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_header_row_in_the_middle() {
        let sheet = Sheet::from_rows(vec![vec!["title"], vec!["name"], vec!["alice"]]);
        let layout = Layout::new(vec![Section::header(2, PrimitiveValueType::Text.shared())]).unwrap();
        let table = project(sheet, &layout);
        assert_eq!(table.column_names, vec!["name"]);
        assert_eq!(table.data, vec![vec!["title".to_string()], vec!["alice".to_string()]]);
    }

    #[test]
    fn test_later_column_section_overrides_type() {
        let sheet = Sheet::from_rows(vec![vec!["1.5"]]);
        let layout = Layout::new(vec![
            Section::column(ColumnSelector::Index(0), PrimitiveValueType::Text.shared()),
            Section::column(ColumnSelector::Letters("A".into()), PrimitiveValueType::Decimal.shared()),
        ])
        .unwrap();
        let table = validate_and_project(sheet, &layout).unwrap();
        assert_eq!(table.column_types[0].as_ref().unwrap().name(), "decimal");
    }

    #[test]
    fn test_constrained_type_in_layout() {
        let percent = ConstrainedValueType::new(
            "Percentage",
            PrimitiveValueType::Decimal,
            vec![Constraint::range("ZeroToHundred", 0.0, true, 100.0, true).unwrap()],
        )
        .unwrap()
        .shared();
        let sheet = Sheet::from_rows(vec![vec!["50"], vec!["150"]]);
        let layout = Layout::new(vec![Section::column(ColumnSelector::Index(0), percent)]).unwrap();

        let violations = find_violations(&sheet, &layout);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].to_string(),
            "[row 2, column 0] Value \"150\" does not match type Percentage"
        );
    }

    #[test]
    fn test_column_violation_names_the_selector() {
        let sheet = Sheet::from_rows(vec![vec!["x", "y"]]);
        let layout = Layout::new(vec![
            Section::column(ColumnSelector::Index(1), PrimitiveValueType::Integer.shared()),
            Section::column(ColumnSelector::Letters("A".into()), PrimitiveValueType::Integer.shared()),
        ])
        .unwrap();

        let columns: Vec<String> = find_violations(&sheet, &layout)
            .into_iter()
            .map(|v| v.column)
            .collect();
        assert_eq!(columns, vec!["1", "A"]);
    }
}
