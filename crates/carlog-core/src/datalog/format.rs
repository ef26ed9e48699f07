//! Log file formats
//!
//! Reads and writes datalogs as CSV. Logger exports are ISO-8859-1; files
//! that are not valid UTF-8 are decoded as Latin-1 so headers like
//! `Ignition Timing (°)` survive either way.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use super::{Channel, ChannelData, Dataset};
use crate::error::{AnalysisError, Result};

/// Supported log file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Comma-separated values
    Csv,
}

impl LogFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "csv" => Some(LogFormat::Csv),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            LogFormat::Csv => "csv",
        }
    }
}

/// Read a datalog, choosing the reader from the file extension
pub fn read_log_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    match LogFormat::from_extension(path) {
        Some(LogFormat::Csv) => read_csv_file(path),
        None => Err(AnalysisError::InvalidParameter(format!(
            "unsupported log file '{}'",
            path.display()
        ))),
    }
}

/// Read a CSV datalog from a file
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file))
}

/// Read a CSV datalog.
///
/// The first row is the header. A column is numeric when every non-empty
/// cell parses as a number; empty numeric cells become `NaN`.
pub fn read_csv<R: Read>(mut reader: R) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        // ISO-8859-1 maps each byte to the code point of the same value
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: Vec<String> = csv_reader
        .headers()
        .map_err(|e| parse_error(&e, 1))?
        .iter()
        .map(str::to_string)
        .collect();
    if header.iter().all(String::is_empty) {
        return Err(AnalysisError::Parse {
            line: 1,
            message: "missing header row".to_string(),
        });
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); header.len()];
    for (idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| parse_error(&e, idx + 2))?;
        // Whitespace-only lines
        if header.len() > 1 && record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() != header.len() {
            let line = record.position().map_or(idx + 2, |p| p.line() as usize);
            return Err(AnalysisError::Parse {
                line,
                message: format!("expected {} fields, found {}", header.len(), record.len()),
            });
        }
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(cell.to_string());
        }
    }

    let channels = header
        .into_iter()
        .zip(cells)
        .map(|(name, column)| Channel {
            name,
            data: infer_column(column),
        })
        .collect();

    Dataset::new(channels)
}

fn parse_error(error: &csv::Error, fallback_line: usize) -> AnalysisError {
    AnalysisError::Parse {
        line: error
            .position()
            .map_or(fallback_line, |p| p.line() as usize),
        message: error.to_string(),
    }
}

fn infer_column(column: Vec<String>) -> ChannelData {
    let parsed: Option<Vec<f64>> = column
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                Some(f64::NAN)
            } else {
                cell.parse::<f64>().ok()
            }
        })
        .collect();

    match parsed {
        Some(values) => ChannelData::Numeric(values),
        None => ChannelData::Text(column),
    }
}

fn cell_text(data: &ChannelData, row: usize) -> String {
    match data {
        ChannelData::Numeric(v) if v[row].is_nan() => String::new(),
        ChannelData::Numeric(v) => v[row].to_string(),
        ChannelData::Text(v) => v[row].clone(),
    }
}

/// Write a dataset as UTF-8 CSV, e.g. after adding derived channels.
///
/// Missing numeric samples are written as empty cells.
pub fn write_csv<W: Write>(writer: W, dataset: &Dataset) -> Result<()> {
    if dataset.channels().is_empty() {
        return Ok(());
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.channel_names())?;
    for row in 0..dataset.len() {
        csv_writer.write_record(dataset.channels().iter().map(|c| cell_text(&c.data, row)))?;
    }
    csv_writer.flush()?;
    Ok(())
}
