//! Export waveforms to CSV and fit results to JSON.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{FitConfig, FitResult, SampledResponse};
use crate::error::AppError;

/// JSON document written by `write_result_json`.
#[derive(Debug, Serialize)]
pub struct ResultFile<'a> {
    pub tool: &'static str,
    pub generated: String,
    pub input: Option<String>,
    pub config: &'a FitConfig,
    pub result: &'a FitResult,
}

/// Write a waveform as `time,amplitude` rows.
pub fn write_waveform_csv(path: &Path, response: &SampledResponse) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::invalid(format!("Failed to create CSV '{}': {e}", path.display())))?;

    writeln!(file, "time,amplitude")
        .map_err(|e| AppError::invalid(format!("Failed to write CSV header: {e}")))?;
    for (t, y) in response.times().iter().zip(response.amplitudes()) {
        writeln!(file, "{t},{y}")
            .map_err(|e| AppError::invalid(format!("Failed to write CSV row: {e}")))?;
    }
    Ok(())
}

/// Write a fit result plus the configuration that produced it.
///
/// Padding entries (`f64::INFINITY`) and undefined correlations serialize as
/// `null`.
pub fn write_result_json(
    path: &Path,
    result: &FitResult,
    config: &FitConfig,
    input: Option<&Path>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::invalid(format!("Failed to create result JSON '{}': {e}", path.display())))?;

    let doc = ResultFile {
        tool: "modalfit",
        generated: chrono::Local::now().to_rfc3339(),
        input: input.map(|p| p.display().to_string()),
        config,
        result,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::invalid(format!("Failed to write result JSON: {e}")))?;
    Ok(())
}
