//! CSV waveform ingest.
//!
//! Turns a two-column `time,amplitude` CSV (header names are flexible) into a
//! `SampledResponse`. Rows that fail to parse are skipped and reported; the
//! file as a whole is rejected only when the schema is missing or no row
//! survives.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::SampledResponse;
use crate::error::{AppError, EXIT_NO_DATA};

const TIME_COLUMNS: [&str; 3] = ["time", "t", "x"];
const AMPLITUDE_COLUMNS: [&str; 4] = ["amplitude", "value", "y", "h"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedWaveform {
    pub response: SampledResponse,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a waveform CSV from disk.
pub fn load_waveform(path: &Path) -> Result<IngestedWaveform, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_waveform(file)
}

/// Parse a waveform CSV from any reader.
///
/// Time must be non-decreasing in file order (repeated times are allowed and
/// resolved later by the preprocessor).
pub fn read_waveform<R: Read>(input: R) -> Result<IngestedWaveform, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let time_idx = find_column(&header_map, &TIME_COLUMNS)?;
    let amp_idx = find_column(&header_map, &AMPLITUDE_COLUMNS)?;

    let mut times = Vec::new();
    let mut amplitudes = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, time_idx, amp_idx) {
            Ok((t, y)) => {
                if let Some(&prev) = times.last() {
                    if t < prev {
                        row_errors.push(RowError {
                            line,
                            message: format!("Time {t} goes backwards (previous {prev})."),
                        });
                        continue;
                    }
                }
                times.push(t);
                amplitudes.push(y);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = times.len();
    if rows_used == 0 {
        return Err(AppError::new(
            EXIT_NO_DATA,
            "No valid rows remain after parsing the waveform CSV.",
        ));
    }

    Ok(IngestedWaveform {
        response: SampledResponse::new(times, amplitudes)?,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Result<usize, AppError> {
    names
        .iter()
        .find_map(|n| header_map.get(*n).copied())
        .ok_or_else(|| {
            let wanted: Vec<String> = names.iter().map(|n| format!("`{n}`")).collect();
            AppError::invalid(format!("Missing required column: one of {}", wanted.join(", ")))
        })
}

fn parse_row(record: &StringRecord, time_idx: usize, amp_idx: usize) -> Result<(f64, f64), String> {
    let t = parse_f64(record.get(time_idx)).ok_or_else(|| "Missing/invalid time value.".to_string())?;
    let y = parse_f64(record.get(amp_idx))
        .ok_or_else(|| "Missing/invalid amplitude value.".to_string())?;
    Ok((t, y))
}

fn parse_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_alias_headers_and_skips_bad_rows() {
        let csv = "\u{feff}T,Value\n0,0\n0.1,0.5\n0.2,abc\n0.3,inf\n0.4,0.9\n";
        let w = read_waveform(csv.as_bytes()).unwrap();
        assert_eq!(w.rows_read, 5);
        assert_eq!(w.rows_used, 3);
        assert_eq!(w.response.times(), &[0.0, 0.1, 0.4]);
        assert_eq!(w.row_errors.len(), 2);
        assert_eq!(w.row_errors[0].line, 4);
    }

    #[test]
    fn backwards_time_is_a_row_error() {
        let csv = "time,amplitude\n0,1\n2,2\n1,3\n3,4\n";
        let w = read_waveform(csv.as_bytes()).unwrap();
        assert_eq!(w.response.times(), &[0.0, 2.0, 3.0]);
        assert_eq!(w.row_errors.len(), 1);
        assert_eq!(w.row_errors[0].line, 4);
    }

    #[test]
    fn missing_amplitude_column_is_schema_error() {
        let err = read_waveform("time,foo\n0,1\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("amplitude"));
    }

    #[test]
    fn no_valid_rows_is_no_data() {
        let err = read_waveform("x,y\n0,nan\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
