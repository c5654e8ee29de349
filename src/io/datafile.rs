//! Whitespace-delimited numeric tables.
//!
//! # File Format
//!
//! ```text
//! x z b zmin
//! 0.0 102.5 4.0 101.0
//! 10.0 101.9 4.2 100.4
//! ```
//!
//! The first non-empty line is a header when any of its fields is not a
//! number. Lines starting with `#` are comments. Every data row has the
//! same number of values.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

/// Error type for data file parsing.
#[derive(Debug, Error)]
pub enum DataFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with line number
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// No data rows
    #[error("data file contains no data")]
    Empty,

    /// Named column requested from a table without header
    #[error("data file has no header line")]
    MissingHeader,

    /// Required column absent from the header
    #[error("missing column '{0}'")]
    MissingColumn(String),

    /// Columns of unequal length or header width mismatch
    #[error("inconsistent table: {0}")]
    Inconsistent(String),
}

/// Column-major numeric table with an optional header.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTable {
    header: Option<Vec<String>>,
    columns: Vec<Vec<f64>>,
}

impl DataTable {
    /// Build a table from named columns of equal length.
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, DataFileError> {
        let header: Vec<String> = names.into_iter().map(Into::into).collect();
        if header.len() != columns.len() {
            return Err(DataFileError::Inconsistent(format!(
                "{} names for {} columns",
                header.len(),
                columns.len()
            )));
        }
        Self::check_lengths(&columns)?;
        Ok(Self {
            header: Some(header),
            columns,
        })
    }

    /// Build a table without header.
    pub fn without_header(columns: Vec<Vec<f64>>) -> Result<Self, DataFileError> {
        Self::check_lengths(&columns)?;
        Ok(Self {
            header: None,
            columns,
        })
    }

    fn check_lengths(columns: &[Vec<f64>]) -> Result<(), DataFileError> {
        if let Some(first) = columns.first() {
            if columns.iter().any(|c| c.len() != first.len()) {
                return Err(DataFileError::Inconsistent(
                    "columns have different lengths".into(),
                ));
            }
        }
        Ok(())
    }

    /// Read a table from a file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, DataFileError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a table held in memory.
    pub fn parse(text: &str) -> Result<Self, DataFileError> {
        Self::from_reader(text.as_bytes())
    }

    fn from_reader<R: BufRead>(reader: R) -> Result<Self, DataFileError> {
        let mut header: Option<Vec<String>> = None;
        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut first_line = true;

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();

            if first_line {
                first_line = false;
                if fields.iter().any(|f| f.parse::<f64>().is_err()) {
                    header = Some(fields.iter().map(|f| f.to_string()).collect());
                    columns = vec![Vec::new(); fields.len()];
                    continue;
                }
                columns = vec![Vec::new(); fields.len()];
            }

            if fields.len() != columns.len() {
                return Err(DataFileError::Parse {
                    line: line_num + 1,
                    message: format!("expected {} values, found {}", columns.len(), fields.len()),
                });
            }
            for (column, field) in columns.iter_mut().zip(&fields) {
                let value = field.parse::<f64>().map_err(|_| DataFileError::Parse {
                    line: line_num + 1,
                    message: format!("invalid number '{}'", field),
                })?;
                column.push(value);
            }
        }

        if columns.first().map_or(true, |c| c.is_empty()) {
            return Err(DataFileError::Empty);
        }
        Ok(Self { header, columns })
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Column by position.
    pub fn column_at(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Column by name; missing names are an error.
    pub fn column(&self, name: &str) -> Result<&[f64], DataFileError> {
        let header = self.header.as_ref().ok_or(DataFileError::MissingHeader)?;
        header
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| DataFileError::MissingColumn(name.to_string()))
    }

    /// Column by name, `None` when absent.
    pub fn optional_column(&self, name: &str) -> Option<&[f64]> {
        self.column(name).ok()
    }

    /// Write the table, header first.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), DataFileError> {
        let mut out = BufWriter::new(fs::File::create(path.as_ref())?);
        write!(out, "{}", self)?;
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(header) = &self.header {
            writeln!(f, "{}", header.join(" "))?;
        }
        for row in 0..self.n_rows() {
            let line: Vec<String> = self.columns.iter().map(|c| c[row].to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
