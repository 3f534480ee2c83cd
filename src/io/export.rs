//! Exports: fit results to JSON, sample sets to CSV.
//!
//! The fit export carries the fitted joint distribution, the per-dimension
//! interval counts and the full inspection records (including per-interval
//! samples), so a fit can be examined without re-running it. Sample CSVs use
//! the layout `io::ingest` reads.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::FitError;
use crate::fit::Fit;
use crate::io::ingest::SampleSet;

#[derive(Debug, Serialize)]
struct ExportFile<'a> {
    tool: &'static str,
    names: &'a [String],
    #[serde(flatten)]
    fit: &'a Fit,
}

/// Write `fit` as pretty-printed JSON to `path`.
pub fn write_fit_json(path: &Path, names: &[String], fit: &Fit) -> Result<(), FitError> {
    let file = File::create(path).map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_fit(&mut writer, names, fit)?;
    writer.flush().map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize `fit` into any writer.
pub fn write_fit<W: Write>(writer: W, names: &[String], fit: &Fit) -> Result<(), FitError> {
    let export = ExportFile {
        tool: "dfit",
        names,
        fit,
    };
    serde_json::to_writer_pretty(writer, &export)
        .map_err(|e| FitError::Parse(format!("Failed to write fit JSON: {e}")))
}

/// Write a sample set as CSV (header row, one column per dimension).
pub fn write_samples_csv(path: &Path, set: &SampleSet) -> Result<(), FitError> {
    let file = File::create(path).map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_samples(file, set)
}

pub fn write_samples<W: Write>(writer: W, set: &SampleSet) -> Result<(), FitError> {
    let csv_err = |e: csv::Error| FitError::Parse(format!("Failed to write sample CSV: {e}"));
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&set.names).map_err(csv_err)?;
    for row in 0..set.observations() {
        writer
            .write_record(set.samples.iter().map(|s| format!("{:.6}", s[row])))
            .map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| FitError::Parse(format!("Failed to write sample CSV: {e}")))
}
