//! Tabular store: legislator rows with named columns.
//!
//! Cells are kept as raw text (the way the API and the CSV carry them); blank
//! cells are "missing". Typed access and record validation happen on read.

use deputados_graph::record::LegislatorRecord;
use deputados_graph::MalformedRecord;
use serde_json::Value;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row} is not a JSON object")]
    NotAnObject { row: usize },

    #[error("row {row}: column `{column}` is not an integer: `{value}`")]
    NotAnInteger {
        row: usize,
        column: String,
        value: String,
    },
}

impl TableError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Rows split by validation outcome. Row numbers are 1-based data rows.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRows {
    pub records: Vec<(usize, LegislatorRecord)>,
    pub rejected: Vec<MalformedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with blanks, extra cells dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Build from API objects. Columns appear in first-seen key order.
    pub fn from_json_rows(rows: &[Value]) -> Result<Self, TableError> {
        let mut columns: Vec<String> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let obj = row.as_object().ok_or(TableError::NotAnObject { row: i + 1 })?;
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Self::new(columns);
        for row in rows {
            // Checked above.
            let Some(obj) = row.as_object() else { continue };
            let cells = table
                .columns
                .iter()
                .map(|c| obj.get(c).map(json_cell).unwrap_or_default())
                .collect();
            table.rows.push(cells);
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Raw cell text (0-based `row`); `None` for unknown columns or rows.
    pub fn raw(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Cell text, with blank cells reported as missing.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        self.raw(row, column)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn is_missing(&self, row: usize, column: &str) -> bool {
        self.cell(row, column).is_none()
    }

    /// Integer view of a cell; `Ok(None)` when the cell is missing.
    pub fn integer(&self, row: usize, column: &str) -> Result<Option<i64>, TableError> {
        let Some(text) = self.cell(row, column) else {
            return Ok(None);
        };
        let normalized = text.strip_suffix(".0").unwrap_or(text);
        normalized
            .parse()
            .map(Some)
            .map_err(|_| TableError::NotAnInteger {
                row: row + 1,
                column: column.to_string(),
                value: text.to_string(),
            })
    }

    /// Rows (0-based) where `column` is missing.
    pub fn missing_in(&self, column: &str) -> Vec<usize> {
        (0..self.len()).filter(|&r| self.is_missing(r, column)).collect()
    }

    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Validate every row into a record, lazily.
    pub fn records(&self) -> impl Iterator<Item = Result<(usize, LegislatorRecord), MalformedRecord>> + '_ {
        (0..self.len()).map(move |r| {
            LegislatorRecord::from_fields(r + 1, |col| self.raw(r, col)).map(|rec| (r + 1, rec))
        })
    }

    pub fn validate(&self) -> ValidatedRows {
        let mut out = ValidatedRows::default();
        for result in self.records() {
            match result {
                Ok(ok) => out.records.push(ok),
                Err(malformed) => {
                    warn!(%malformed, "rejected row");
                    out.rejected.push(malformed);
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------------
    // CSV
    // ------------------------------------------------------------------------

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let columns = rdr.headers()?.iter().map(str::to_string).collect();
        let mut table = Self::new(columns);
        for record in rdr.records() {
            let record = record?;
            table.push_row(record.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    /// Load a CSV file. A missing file fails before anything is read.
    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let file = fs::File::open(path).map_err(|e| TableError::io(path, e))?;
        let table = Self::from_csv_reader(std::io::BufReader::new(file))?;
        info!(path = %path.display(), rows = table.len(), columns = table.columns.len(), "csv loaded");
        Ok(table)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write a CSV file (UTF-8, header row), creating parent directories.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
        }
        let file = fs::File::create(path).map_err(|e| TableError::io(path, e))?;
        self.to_csv_writer(std::io::BufWriter::new(file))?;
        info!(path = %path.display(), rows = self.len(), "csv written");
        Ok(())
    }

    /// Fixed-width text rendering of the first `max_rows` rows.
    pub fn render_text(&self, max_rows: usize, max_cell: usize) -> String {
        let clip = |s: &str| -> String {
            if s.chars().count() <= max_cell {
                s.to_string()
            } else {
                let mut out: String = s.chars().take(max_cell.saturating_sub(1)).collect();
                out.push('…');
                out
            }
        };
        let shown: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(max_rows)
            .map(|r| r.iter().map(|c| clip(c)).collect())
            .collect();
        let header: Vec<String> = self.columns.iter().map(|c| clip(c)).collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &shown {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}", w = *w))
                .collect();
            padded.join(" | ").trim_end().to_string()
        };

        let mut out = line(&header);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.push('\n');
        for row in &shown {
            out.push_str(&line(row));
            out.push('\n');
        }
        if self.len() > max_rows {
            out.push_str(&format!("… {} more rows\n", self.len() - max_rows));
        }
        out
    }
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
