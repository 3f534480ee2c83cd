//! CSV ingest of sample sets.
//!
//! Expected layout: a header row naming the dimensions, then one row per
//! observation with one numeric column per dimension, in dimension order.
//!
//! ```text
//! significant_wave_height,peak_period
//! 1.21,5.93
//! 3.07,8.12
//! ```
//!
//! The schema is strict: every row must have exactly as many fields as the
//! header and every field must parse as a finite number. The first bad row
//! fails the load (exit code 2) with its line number.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::FitError;

/// Samples loaded from a CSV file, one vector per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub names: Vec<String>,
    pub samples: Vec<Vec<f64>>,
}

impl SampleSet {
    pub fn dimensions(&self) -> usize {
        self.samples.len()
    }

    pub fn observations(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }
}

/// Load a sample set from a CSV file.
pub fn load_samples(path: &Path) -> Result<SampleSet, FitError> {
    let file = File::open(path).map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_samples(file)
}

/// Parse a sample set from any CSV reader.
pub fn read_samples<R: Read>(reader: R) -> Result<SampleSet, FitError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| FitError::Parse(format!("Failed to read CSV headers: {e}")))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(FitError::Parse("CSV has no header columns.".to_string()));
    }

    let names: Vec<String> = headers.iter().map(str::to_string).collect();
    let mut samples = vec![Vec::new(); names.len()];

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| FitError::Parse(format!("line {line}: {e}")))?;
        for (dimension, field) in record.iter().enumerate() {
            let value: f64 = field.parse().map_err(|_| {
                FitError::Parse(format!(
                    "line {line}: column '{}' has non-numeric value '{field}'",
                    names[dimension]
                ))
            })?;
            if !value.is_finite() {
                return Err(FitError::Parse(format!(
                    "line {line}: column '{}' has non-finite value '{field}'",
                    names[dimension]
                )));
            }
            samples[dimension].push(value);
        }
    }

    if samples[0].is_empty() {
        return Err(FitError::Parse("CSV has no data rows.".to_string()));
    }

    tracing::debug!(
        dimensions = names.len(),
        observations = samples[0].len(),
        "loaded samples"
    );
    Ok(SampleSet { names, samples })
}
