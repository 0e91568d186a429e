// 🧾 Raw Tables - Column-named rows exactly as the exports delivered them
// The only string-keyed structure in the crate; typed records are built from it once

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values the loader reads as "no value"
pub const NULL_MARKERS: &[&str] = &["", "NA", "N/A"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl RawValue {
    /// Build a value from exported text, mapping the null markers to `Empty`
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if NULL_MARKERS.contains(&trimmed) {
            RawValue::Empty
        } else {
            RawValue::Text(text.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text, `None` when empty
    pub fn text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let text = self.to_string();
        Some(text.trim().to_string())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Empty => Ok(()),
            RawValue::Text(s) => write!(f, "{}", s),
            // Integral numbers print without the trailing ".0" so 45444.0 reads as a serial
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::from_text(text)
    }
}

// ============================================================================
// RAW TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        RawTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from text cells (handy for fixtures)
    pub fn from_text_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|cell| RawValue::from_text(cell)).collect());
        }
        table
    }

    /// Append a row, padding or truncating to the column count
    pub fn push_row(&mut self, mut row: Vec<RawValue>) {
        row.resize(self.columns.len(), RawValue::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Add a column with the same value on every row (no-op if it already exists)
    pub fn add_constant_column(&mut self, name: &str, value: RawValue) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.clone());
        }
    }

    /// Rewrite every cell of a column in place
    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&RawValue) -> RawValue,
    {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Move `priority` columns to the front (in the given order), keeping the rest in place
    pub fn reorder_columns(&mut self, priority: &[&str]) {
        let mut order: Vec<usize> = priority
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        for idx in 0..self.columns.len() {
            if !order.contains(&idx) {
                order.push(idx);
            }
        }

        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = order.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Row accessor keyed by column name
    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|cells| RowView {
            table: self,
            cells,
            index,
        })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.rows.len()).filter_map(move |i| self.row(i))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RawTable,
    cells: &'a [RawValue],
    pub index: usize,
}

impl<'a> RowView<'a> {
    /// Cell by column name; a missing column reads as `Empty`
    pub fn get(&self, column: &str) -> &'a RawValue {
        const EMPTY: &RawValue = &RawValue::Empty;
        self.table
            .column_index(column)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(EMPTY)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).text()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.table.has_column(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_markers_read_as_empty() {
        assert_eq!(RawValue::from_text("N/A"), RawValue::Empty);
        assert_eq!(RawValue::from_text("  NA "), RawValue::Empty);
        assert!(RawValue::from_text("   ").is_empty());
        assert_eq!(RawValue::from_text("ACTIVE"), RawValue::Text("ACTIVE".to_string()));
    }

    #[test]
    fn test_integral_numbers_display_without_fraction() {
        assert_eq!(RawValue::Number(45444.0).to_string(), "45444");
        assert_eq!(RawValue::Number(45444.5).to_string(), "45444.5");
    }

    #[test]
    fn test_reorder_columns_moves_priority_first() {
        let mut table = RawTable::from_text_rows(
            &["Name", "Email", "Created"],
            &[&["Jane", "jane.doe@x.com", "01-06-2024"]],
        );

        table.reorder_columns(&["Email", "Created", "Not There"]);

        assert_eq!(table.columns, vec!["Email", "Created", "Name"]);
        assert_eq!(table.rows[0][0], RawValue::Text("jane.doe@x.com".to_string()));
        assert_eq!(table.rows[0][2], RawValue::Text("Jane".to_string()));
    }

    #[test]
    fn test_row_view_missing_column_is_empty() {
        let table = RawTable::from_text_rows(&["Email"], &[&["a@x.com"]]);
        let row = table.row(0).unwrap();
        assert_eq!(row.text("Email"), Some("a@x.com".to_string()));
        assert!(row.get("Status").is_empty());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut table = RawTable::new(vec!["A".to_string(), "B".to_string()]);
        table.push_row(vec![RawValue::Text("x".to_string())]);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[0][1], RawValue::Empty);
    }
}
