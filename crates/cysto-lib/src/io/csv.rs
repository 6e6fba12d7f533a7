use crate::{
    error::{CystoError, Result},
    signal::RawSeries,
};
use csv::{ReaderBuilder, StringRecord};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

/// Where to find time and pressure in a delimited recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Zero-based column holding time.
    pub time_col: usize,
    /// Zero-based column holding bladder pressure.
    pub pressure_col: usize,
    /// Leading physical lines to ignore (headers, calibration noise), blank lines included.
    pub skip_rows: usize,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            time_col: 0,
            pressure_col: 1,
            skip_rows: 0,
            delimiter: b',',
        }
    }
}

/// Read a recording from disk. Other columns are ignored.
pub fn read_raw_series(path: &Path, opts: &LoadOptions) -> Result<RawSeries> {
    let file = File::open(path).map_err(|e| CystoError::io(path, e))?;
    let raw = parse_raw_series(file, opts)?;
    info!("loaded {} samples from {}", raw.len(), path.display());
    Ok(raw)
}

/// Parse a recording from any reader. The whole load fails on the first bad row.
///
/// Rows are numbered by physical line, so `skip_rows` and `MalformedRow::row` agree
/// with a text editor. Blank lines after the skipped block carry no data and are ignored.
pub fn parse_raw_series<R: Read>(reader: R, opts: &LoadOptions) -> Result<RawSeries> {
    let mut reader = ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut time = Vec::new();
    let mut pressure = Vec::new();
    for (idx, result) in reader.byte_records().enumerate() {
        let record = result?;
        let row = record
            .position()
            .and_then(|pos| usize::try_from(pos.line()).ok())
            .unwrap_or(idx + 1);
        if row <= opts.skip_rows {
            continue;
        }
        let record = StringRecord::from_byte_record(record).map_err(|e| CystoError::MalformedRow {
            row,
            reason: format!("not valid UTF-8: {}", e),
        })?;
        pressure.push(parse_field(&record, opts.pressure_col, row, "pressure")?);
        time.push(parse_field(&record, opts.time_col, row, "time")?);
    }
    RawSeries::new(time, pressure)
}

fn parse_field(record: &StringRecord, col: usize, row: usize, what: &str) -> Result<f64> {
    let field = record.get(col).ok_or_else(|| CystoError::MalformedRow {
        row,
        reason: format!("missing {} column {}", what, col),
    })?;
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| CystoError::MalformedRow {
            row,
            reason: format!("{} value {:?} is not a number: {}", what, field, e),
        })
}
