// ============================================================
// Layer 4 - Keypoint CSV Loader
// ============================================================
// Reads the training dataset written by the landmark logger.
//
// File format (no header, one sample per line):
//   label,x0,y0,x1,y1,...,x20,y20
//
//   label     integer class id in [0, num_classes)
//   x_i, y_i  normalised landmark coordinates (42 floats)
//
// Every row must have exactly 43 columns. The first bad row
// aborts the load with its 1-based line number.
//
// Also loads the one-column gesture label file.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::domain::labels::LabelMap;
use crate::domain::sample::{KeypointSample, FEATURE_DIM};
use crate::domain::traits::SampleSource;

/// Columns in one dataset row: label + features
pub const ROW_COLUMNS: usize = 1 + FEATURE_DIM;

/// A malformed dataset row.
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount { line: usize, expected: usize, found: usize },

    #[error("line {line}: label '{value}' is not a class id")]
    BadLabel { line: usize, value: String },

    #[error("line {line}: label {label} is outside [0, {num_classes})")]
    LabelOutOfRange { line: usize, label: usize, num_classes: usize },

    #[error("line {line}, column {column}: '{value}' is not a finite number")]
    BadFeature { line: usize, column: usize, value: String },
}

/// Loads every row of a keypoint CSV file.
/// Implements the SampleSource trait from Layer 3.
pub struct CsvDatasetLoader {
    path:        PathBuf,
    num_classes: usize,
}

impl CsvDatasetLoader {
    pub fn new(path: impl Into<PathBuf>, num_classes: usize) -> Self {
        Self { path: path.into(), num_classes }
    }
}

impl SampleSource for CsvDatasetLoader {
    fn load_all(&self) -> Result<Vec<KeypointSample>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let samples = parse_dataset(&text, self.num_classes)
            .with_context(|| format!("Malformed dataset '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} samples from '{}'",
            samples.len(),
            self.path.display()
        );
        Ok(samples)
    }
}

/// Read and validate a keypoint CSV file.
pub fn load_dataset(path: impl Into<PathBuf>, num_classes: usize) -> Result<Vec<KeypointSample>> {
    CsvDatasetLoader::new(path, num_classes).load_all()
}

/// Parse the full dataset text. Blank lines are ignored.
pub fn parse_dataset(text: &str, num_classes: usize) -> Result<Vec<KeypointSample>, DatasetError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_row(line, i + 1, num_classes))
        .collect()
}

/// Parse one `label,f1,...,f42` row.
pub fn parse_row(line: &str, line_no: usize, num_classes: usize) -> Result<KeypointSample, DatasetError> {
    let columns: Vec<&str> = line.trim().split(',').map(str::trim).collect();

    if columns.len() != ROW_COLUMNS {
        return Err(DatasetError::ColumnCount {
            line:     line_no,
            expected: ROW_COLUMNS,
            found:    columns.len(),
        });
    }

    let label: usize = columns[0].parse().map_err(|_| DatasetError::BadLabel {
        line:  line_no,
        value: columns[0].to_string(),
    })?;

    if label >= num_classes {
        return Err(DatasetError::LabelOutOfRange { line: line_no, label, num_classes });
    }

    let mut features = [0.0f32; FEATURE_DIM];
    for (i, raw) in columns[1..].iter().enumerate() {
        let value = raw
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DatasetError::BadFeature {
                line:   line_no,
                column: i + 2,
                value:  raw.to_string(),
            })?;
        features[i] = value;
    }

    Ok(KeypointSample::new(label, features))
}

/// Load gesture names. A missing file is not fatal: class ids
/// are then shown as numbers.
pub fn load_labels(path: &Path) -> Result<LabelMap> {
    if !path.exists() {
        tracing::warn!(
            "Label file '{}' not found - classes will be shown by id",
            path.display()
        );
        return Ok(LabelMap::default());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read label file '{}'", path.display()))?;
    let labels = LabelMap::parse(&text);
    tracing::debug!("Loaded {} gesture labels", labels.len());
    Ok(labels)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(label: &str, value: &str) -> String {
        let mut cols = vec![label.to_string()];
        cols.extend(std::iter::repeat(value.to_string()).take(FEATURE_DIM));
        cols.join(",")
    }

    #[test]
    fn test_parses_valid_row() {
        let s = parse_row(&row("3", "0.25"), 1, 26).unwrap();
        assert_eq!(s.label, 3);
        assert!(s.features.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn test_rejects_short_row() {
        let err = parse_row("1,0.1,0.2", 4, 26).unwrap_err();
        assert_eq!(err, DatasetError::ColumnCount { line: 4, expected: 43, found: 3 });
    }

    #[test]
    fn test_rejects_label_out_of_range() {
        let err = parse_row(&row("26", "0.0"), 2, 26).unwrap_err();
        assert!(matches!(err, DatasetError::LabelOutOfRange { label: 26, .. }));
    }

    #[test]
    fn test_rejects_non_integer_label() {
        let err = parse_row(&row("-1", "0.0"), 1, 26).unwrap_err();
        assert!(matches!(err, DatasetError::BadLabel { .. }));
    }

    #[test]
    fn test_rejects_bad_feature_with_column() {
        let mut line = row("0", "0.5");
        line.push_str("x");
        let err = parse_row(&line, 9, 26).unwrap_err();
        assert_eq!(
            err,
            DatasetError::BadFeature { line: 9, column: 43, value: "0.5x".to_string() }
        );
        assert!(parse_row(&row("0", "NaN"), 1, 26).is_err());
    }

    #[test]
    fn test_dataset_skips_blank_lines_and_counts_lines() {
        let text = format!("{}\n\n{}\n", row("0", "0.1"), row("1", "-0.1"));
        let samples = parse_dataset(&text, 2).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].label, 1);

        let bad = format!("{}\n\n{}\n", row("0", "0.1"), row("5", "0.1"));
        let err = parse_dataset(&bad, 2).unwrap_err();
        assert!(matches!(err, DatasetError::LabelOutOfRange { line: 3, .. }));
    }

    #[test]
    fn test_loader_reads_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{}", row("2", "0.3")).unwrap();
        writeln!(f, "{}", row("0", "0.4")).unwrap();

        let samples = CsvDatasetLoader::new(f.path(), 3).load_all().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label, 2);
    }

    #[test]
    fn test_missing_dataset_is_an_error() {
        let loader = CsvDatasetLoader::new("definitely/not/here.csv", 3);
        assert!(loader.load_all().is_err());
    }

    #[test]
    fn test_missing_label_file_gives_empty_map() {
        let labels = load_labels(Path::new("definitely/not/here.csv")).unwrap();
        assert!(labels.is_empty());
    }
}
