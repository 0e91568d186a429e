// 📂 Source Loader - Read the four exports from the data folder
// Spreadsheets win over CSV when both exist; a missing export is a warning, not an error

use crate::diagnostics::Diagnostics;
use crate::error::{ReviewError, ReviewResult};
use crate::sources::{SourceKind, SourceTables};
use crate::table::{RawTable, RawValue};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// READERS
// ============================================================================

/// One on-disk format the loader understands
pub trait TableReader: Send + Sync {
    /// File extension handled, without the dot
    fn extension(&self) -> &'static str;

    /// Read the first sheet/table; the first row is the header
    fn read(&self, path: &Path) -> ReviewResult<RawTable>;
}

pub struct XlsxReader;

impl TableReader for XlsxReader {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn read(&self, path: &Path) -> ReviewResult<RawTable> {
        use calamine::{open_workbook_auto, Reader};

        let spreadsheet_error = |message: String| ReviewError::Spreadsheet {
            path: path.to_path_buf(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| spreadsheet_error("workbook has no sheets".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| spreadsheet_error(e.to_string()))?;

        let mut rows = range.rows();
        let header = match rows.next() {
            Some(header) => header,
            None => return Ok(RawTable::default()),
        };

        let mut table = RawTable::new(header.iter().map(header_name).collect());
        for row in rows {
            let cells: Vec<RawValue> = row.iter().map(raw_from_cell).collect();
            if cells.iter().all(RawValue::is_empty) {
                continue;
            }
            table.push_row(cells);
        }
        Ok(table)
    }
}

fn header_name(cell: &calamine::Data) -> String {
    cell.to_string().trim().to_string()
}

/// Spreadsheet date cells become serial numbers; the date normalizer reads those
pub fn raw_from_cell(cell: &calamine::Data) -> RawValue {
    use calamine::Data;
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::from_text(s),
        Data::Int(n) => RawValue::Number(*n as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::Bool(b) => RawValue::Text(b.to_string()),
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
    }
}

pub struct CsvReader;

impl TableReader for CsvReader {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn read(&self, path: &Path) -> ReviewResult<RawTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let columns = rdr
            .headers()?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        let mut table = RawTable::new(columns);

        for result in rdr.records() {
            let record = result?;
            let cells: Vec<RawValue> = record.iter().map(RawValue::from_text).collect();
            if cells.iter().all(RawValue::is_empty) {
                continue;
            }
            table.push_row(cells);
        }
        Ok(table)
    }
}

// ============================================================================
// LOADER
// ============================================================================

pub struct SourceLoader {
    data_dir: PathBuf,
    /// Tried in order for each source
    readers: Vec<Box<dyn TableReader>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl SourceLoader {
    pub fn new(data_dir: impl Into<PathBuf>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        SourceLoader {
            data_dir: data_dir.into(),
            readers: vec![Box::new(XlsxReader), Box::new(CsvReader)],
            diagnostics,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// First existing file for `kind`, with the reader that handles it
    pub fn locate(&self, kind: SourceKind) -> Option<(PathBuf, &dyn TableReader)> {
        self.readers.iter().find_map(|reader| {
            let path = self
                .data_dir
                .join(format!("{}.{}", kind.file_stem(), reader.extension()));
            path.is_file().then(|| (path, reader.as_ref()))
        })
    }

    /// Load one source; `Ok(None)` when no export exists for it
    pub fn load(&self, kind: SourceKind) -> ReviewResult<Option<RawTable>> {
        let Some((path, reader)) = self.locate(kind) else {
            self.diagnostics.warn(
                "load",
                format!("No file found for {} in {}", kind, self.data_dir.display()),
            );
            return Ok(None);
        };

        let table = reader.read(&path)?;
        self.diagnostics.info(
            "load",
            format!("Loaded {} rows from {}", table.len(), path.display()),
        );
        Ok(Some(table))
    }

    pub fn load_all(&self) -> ReviewResult<SourceTables> {
        let mut tables = SourceTables::new();
        for kind in SourceKind::ALL {
            if let Some(table) = self.load(kind)? {
                tables.insert(kind, table);
            }
        }
        Ok(tables)
    }
}
