//! Sheets and workbooks
//!
//! A sheet is a rectangular grid of raw string cells. Nothing is typed before
//! layout validation.

/// Rectangular grid of raw cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    data: Vec<Vec<String>>,
    width: usize,
    height: usize,
}

impl Sheet {
    /// Build a sheet, padding short rows with empty cells so the grid is
    /// rectangular
    pub fn new(mut data: Vec<Vec<String>>) -> Self {
        let width = data.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut data {
            row.resize(width, String::new());
        }
        let height = data.len();
        Self {
            data,
            width,
            height,
        }
    }

    /// Convenience constructor from string slices
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn data(&self) -> &[Vec<String>] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Vec<String>> {
        self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.data.get(row)?.get(column).map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.data.get(row).map(Vec::as_slice)
    }

    /// All cells of a column, top to bottom
    pub fn column(&self, column: usize) -> Vec<&str> {
        self.data
            .iter()
            .filter_map(|row| row.get(column).map(String::as_str))
            .collect()
    }

    /// Remove the rows at the given 0-based indices
    pub fn delete_rows(&mut self, indices: &[usize]) {
        let mut index = 0;
        self.data.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        self.height = self.data.len();
    }

    /// Remove the columns at the given 0-based indices
    pub fn delete_columns(&mut self, indices: &[usize]) {
        for row in &mut self.data {
            let mut index = 0;
            row.retain(|_| {
                let keep = !indices.contains(&index);
                index += 1;
                keep
            });
        }
        let removed = (0..self.width).filter(|i| indices.contains(i)).count();
        self.width -= removed;
    }
}

/// Ordered collection of named sheets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<(String, Sheet)>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet; a sheet with the same name is replaced in place
    pub fn add_sheet(&mut self, name: impl Into<String>, sheet: Sheet) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = sheet,
            None => self.sheets.push((name, sheet)),
        }
    }

    pub fn with_sheet(mut self, name: impl Into<String>, sheet: Sheet) -> Self {
        self.add_sheet(name, sheet);
        self
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Move a sheet out of the workbook
    pub fn take_sheet(&mut self, name: &str) -> Option<Sheet> {
        let position = self.sheets.iter().position(|(n, _)| n == name)?;
        Some(self.sheets.remove(position).1)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_is_padded_to_rectangle() {
        let sheet = Sheet::from_rows(vec![vec!["a", "b", "c"], vec!["d"]]);
        assert_eq!(sheet.width(), 3);
        assert_eq!(sheet.height(), 2);
        assert_eq!(sheet.cell(1, 2), Some(""));
        assert_eq!(sheet.cell(2, 0), None);
    }

    #[test]
    fn test_column_extraction() {
        let sheet = Sheet::from_rows(vec![vec!["A", "B"], vec!["1", "x"], vec!["2", "y"]]);
        assert_eq!(sheet.column(0), vec!["A", "1", "2"]);
        assert_eq!(sheet.column(5), Vec::<&str>::new());
    }

    #[test]
    fn test_delete_rows_and_columns() {
        let mut sheet = Sheet::from_rows(vec![
            vec!["a", "b", "c"],
            vec!["d", "e", "f"],
            vec!["g", "h", "i"],
        ]);
        sheet.delete_rows(&[0, 2]);
        assert_eq!(sheet.height(), 1);
        assert_eq!(sheet.row(0).unwrap(), ["d", "e", "f"]);

        sheet.delete_columns(&[1, 1]);
        assert_eq!(sheet.width(), 2);
        assert_eq!(sheet.row(0).unwrap(), ["d", "f"]);
    }

    #[test]
    fn test_workbook_keeps_insertion_order() {
        let mut wb = Workbook::new()
            .with_sheet("Second", Sheet::default())
            .with_sheet("First", Sheet::default());
        assert_eq!(wb.sheet_names(), vec!["Second", "First"]);

        wb.add_sheet("Second", Sheet::from_rows(vec![vec!["x"]]));
        assert_eq!(wb.len(), 2);
        assert_eq!(wb.sheet_by_name("Second").unwrap().height(), 1);

        let taken = wb.take_sheet("First");
        assert!(taken.is_some());
        assert!(wb.sheet_by_name("First").is_none());
    }
}
