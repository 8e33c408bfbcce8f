// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: sample-weighted cross-entropy on the training set
//   - train_acc:  fraction of training samples classified correctly
//   - val_loss:   cross-entropy on the held-out split
//   - val_acc:    fraction of held-out samples classified correctly
//
// Output file: <model_dir>/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,3.224500,0.061000,3.189200,0.088000
//   2,3.090100,0.094300,3.054300,0.132000
//
// A fresh training run truncates the file. A resumed run first
// drops rows past the checkpoint epoch, then appends.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,train_loss,train_acc,val_loss,val_acc";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
    pub val_loss:   f64,
    pub val_acc:    f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        train_acc:  f64,
        val_loss:   f64,
        val_acc:    f64,
    ) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    /// Keras-style progress line printed after each epoch
    pub fn progress_line(&self, total_epochs: usize) -> String {
        format!(
            "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
            self.epoch, total_epochs, self.train_loss, self.train_acc, self.val_loss, self.val_acc,
        )
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger. `truncate` starts a fresh file; otherwise
    /// rows are appended and the header is only written for a new file.
    pub fn new(dir: &Path, truncate: bool) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");

        if truncate || !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.val_loss,
            m.val_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Remove rows for epochs after `epoch`. Returns how many were dropped.
    pub fn discard_after(&self, epoch: usize) -> Result<usize> {
        let text = fs::read_to_string(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;

        let mut kept    = String::new();
        let mut dropped = 0;
        for (i, line) in text.lines().enumerate() {
            let row_epoch = line.split(',').next().and_then(|e| e.parse::<usize>().ok());
            match row_epoch {
                Some(e) if i > 0 && e > epoch => dropped += 1,
                _ => {
                    kept.push_str(line);
                    kept.push('\n');
                }
            }
        }

        if dropped > 0 {
            fs::write(&self.csv_path, kept)
                .with_context(|| format!("Cannot write '{}'", self.csv_path.display()))?;
            tracing::info!("Dropped {} metrics rows after epoch {}", dropped, epoch);
        }
        Ok(dropped)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line() {
        let m = EpochMetrics::new(3, 1.23456, 0.5, 1.0, 0.625);
        assert_eq!(
            m.progress_line(1000),
            "Epoch 3/1000 - loss: 1.2346 - accuracy: 0.5000 - val_loss: 1.0000 - val_accuracy: 0.6250"
        );
    }

    #[test]
    fn test_truncate_and_append() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path(), true).unwrap();
        logger.log(&EpochMetrics::new(1, 2.0, 0.1, 2.1, 0.1)).unwrap();

        // resumed run keeps previous rows
        let logger = MetricsLogger::new(dir.path(), false).unwrap();
        logger.log(&EpochMetrics::new(2, 1.5, 0.3, 1.6, 0.3)).unwrap();
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().starts_with("2,1.500000"));

        // fresh run starts over
        let logger = MetricsLogger::new(dir.path(), true).unwrap();
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.trim(), HEADER);
    }

    #[test]
    fn test_discard_after_checkpoint_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), true).unwrap();
        for epoch in 1..=4 {
            logger.log(&EpochMetrics::new(epoch, 1.0, 0.5, 1.0, 0.5)).unwrap();
        }

        assert_eq!(logger.discard_after(2).unwrap(), 2);
        assert_eq!(logger.discard_after(2).unwrap(), 0);

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let epochs: Vec<&str> = text.lines().map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(epochs, vec!["epoch", "1", "2"]);
    }
}
