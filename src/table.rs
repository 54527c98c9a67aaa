//! In-memory tabular data with a CSV codec.
//!
//! A cell is either null (`None`) or text. Empty CSV fields read as null and
//! null cells write as empty fields; text is never re-formatted.

use std::io::{Read, Write};

use crate::error::{Result, SchemaError};

pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Name used in error messages, usually the source file name
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Empty text is null.
pub fn to_cell(field: &str) -> Cell {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a CSV whose first record is the header.
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h }.to_string())
            .collect();

        let mut table = Table::new(name, headers);
        for record in csv_reader.records() {
            let record = record?;
            table.push_row(record.iter().map(to_cell).collect());
        }
        Ok(table)
    }

    /// Read a CSV where every record is data. Headers are positional (`0`, `1`, ...).
    pub fn from_headerless_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        if index == 0 && i == 0 {
                            to_cell(f.trim_start_matches('\u{feff}'))
                        } else {
                            to_cell(f)
                        }
                    })
                    .collect(),
            );
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut table = Table::new(name, (0..width).map(|i| i.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        Ok(table)
    }

    /// Write the table as comma-separated text with a header line and no index column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Append a row, padding with nulls or cutting it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Resolve the position of every named column, reporting all missing names at once.
    pub fn require_columns(&self, names: &[&str]) -> std::result::Result<Vec<usize>, SchemaError> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(i) => indices.push(i),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(SchemaError::MissingColumns {
                table: self.name.clone(),
                missing,
            })
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    /// Values of one column by name, `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[index].as_deref()).collect())
    }
}
