use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        RawTable { headers, rows }
    }

    /// Parse CSV with a header line. Blank cells and cells that are not valid
    /// UTF-8 become `None`, and short rows are padded with `None` rather than
    /// rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();
        let mut rows = Vec::new();
        let mut undecodable = 0usize;

        for result in reader.byte_records() {
            let record = result?;
            let row = record
                .iter()
                .map(|raw| match std::str::from_utf8(raw) {
                    Ok(cell) => {
                        let cell = cell.trim();
                        if cell.is_empty() {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    }
                    Err(_) => {
                        undecodable += 1;
                        None
                    }
                })
                .collect();
            rows.push(row);
        }

        if undecodable > 0 {
            warn!(cells = undecodable, "cells with invalid utf-8 treated as blank");
        }
        debug!(columns = headers.len(), rows = rows.len(), "parsed table");
        Ok(RawTable::new(headers, rows))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        RawTable::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
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

    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Cell lookup that treats a missing trailing cell the same as a blank one.
pub fn cell(row: &[Option<String>], index: usize) -> Option<&str> {
    row.get(index).and_then(|c| c.as_deref())
}
