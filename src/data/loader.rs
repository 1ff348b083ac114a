// ============================================================
// Layer 4 - CSV Sample Loader
// ============================================================
// Reads the cleaned simulation dataset with the csv crate.
//
// Columns are located by header name, so the file may carry
// extra columns (e.g. wheel_index) and any column order.
// Every feature and target column must be present, and every
// cell in those columns must parse as a number.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{fs::File, io::Read, path::PathBuf};

use crate::domain::sample::{
    VehicleSample, FEATURE_COLUMNS, FEATURE_COUNT, TARGET_COLUMNS, TARGET_COUNT,
};
use crate::domain::traits::SampleSource;

/// Loads vehicle samples from a CSV file with named columns.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<VehicleSample>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;

        let samples = read_samples(file)
            .with_context(|| format!("Cannot parse dataset '{}'", self.path.display()))?;

        tracing::debug!("Read {} rows from '{}'", samples.len(), self.path.display());
        Ok(samples)
    }
}

/// Parse samples from any CSV reader. Split out from the loader
/// so the parsing rules can be tested on in-memory data.
pub fn read_samples<R: Read>(input: R) -> Result<Vec<VehicleSample>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let column_index = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Missing column '{name}'"))
    };

    let mut feature_idx = [0usize; FEATURE_COUNT];
    for (slot, name) in feature_idx.iter_mut().zip(FEATURE_COLUMNS) {
        *slot = column_index(name)?;
    }
    let mut target_idx = [0usize; TARGET_COUNT];
    for (slot, name) in target_idx.iter_mut().zip(TARGET_COLUMNS) {
        *slot = column_index(name)?;
    }

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1, first data row is line 2
        let line = row + 2;

        let cell = |idx: usize, name: &str| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("");
            raw.parse::<f64>().with_context(|| {
                format!("Line {line}: column '{name}' is not a number: '{raw}'")
            })
        };

        let mut features = [0f64; FEATURE_COUNT];
        for ((value, &idx), name) in features.iter_mut().zip(&feature_idx).zip(FEATURE_COLUMNS) {
            *value = cell(idx, name)?;
        }
        let mut targets = [0f64; TARGET_COUNT];
        for ((value, &idx), name) in targets.iter_mut().zip(&target_idx).zip(TARGET_COLUMNS) {
            *value = cell(idx, name)?;
        }

        samples.push(VehicleSample::new(features, targets));
    }

    if samples.is_empty() {
        bail!("Dataset contains no rows");
    }

    Ok(samples)
}
