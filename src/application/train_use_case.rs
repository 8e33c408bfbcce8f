// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1:  Load keypoint.csv               (Layer 4 - data)
//   Step 2:  Seeded 75/25 train/test split   (Layer 4 - data)
//   Step 3:  Build datasets                  (Layer 4 - data)
//   Step 4:  Save run config                 (Layer 6 - infra)
//   Step 5:  Fit with checkpoint + early stop (Layer 5 - ml)
//   Step 6:  Evaluate on the test split      (Layer 5 - ml)
//   Step 7:  Reload saved model, infer row 0 (Layer 5 - ml)
//   Step 8:  Confusion matrix + report       (Layer 6 - infra)
//   Step 9:  Save inference-only model       (Layer 6 - infra)
//   Step 10: Quantize and write .kpq         (Layer 5b - quant)
//   Step 11: Reload .kpq, parity on row 0    (Layer 5b - quant)

use anyhow::{Context, Result};
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::application::{
    evaluate_use_case::report_on_test,
    export_use_case::export_quantized,
};
use crate::data::{
    dataset::KeypointDataset,
    loader::{load_dataset, load_labels},
    splitter::{split_train_test, DEFAULT_SEED, DEFAULT_TRAIN_FRACTION},
};
use crate::domain::{
    sample::{KeypointSample, DEFAULT_NUM_CLASSES},
    traits::{argmax, GestureClassifier},
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    callbacks::DEFAULT_PATIENCE,
    evaluator::evaluate_samples,
    inferencer::Inferencer,
    trainer::run_training,
    Device,
};

pub const DEFAULT_DATASET:        &str = "model/keypoint_classifier/keypoint.csv";
pub const DEFAULT_MODEL_DIR:      &str = "model/keypoint_classifier/keypoint_classifier";
pub const DEFAULT_QUANTIZED_PATH: &str = "model/keypoint_classifier/keypoint_classifier.kpq";
pub const DEFAULT_LABELS:         &str = "model/keypoint_classifier/keypoint_classifier_label.csv";

// ─── Training Configuration ──────────────────────────────────────────────────
// Paths and hyperparameters of one run. Saved next to the
// checkpoint as train_config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset:        String,
    pub model_dir:      String,
    pub quantized_path: String,
    pub labels:         String,
    pub num_classes:    usize,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub patience:       usize,
    pub train_fraction: f64,
    pub seed:           u64,
    pub resume:         bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset:        DEFAULT_DATASET.to_string(),
            model_dir:      DEFAULT_MODEL_DIR.to_string(),
            quantized_path: DEFAULT_QUANTIZED_PATH.to_string(),
            labels:         DEFAULT_LABELS.to_string(),
            num_classes:    DEFAULT_NUM_CLASSES,
            epochs:         1000,
            batch_size:     128,
            lr:             1e-3,
            patience:       DEFAULT_PATIENCE,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            seed:           DEFAULT_SEED,
            resume:         false,
        }
    }
}

/// Load the CSV and cut it into the seeded train/test partitions.
pub fn load_and_split(
    dataset:        &str,
    num_classes:    usize,
    train_fraction: f64,
    seed:           u64,
) -> Result<(Vec<KeypointSample>, Vec<KeypointSample>)> {
    tracing::info!("Loading dataset from '{}'", dataset);
    let samples = load_dataset(dataset, num_classes)?;

    let (train, test) = split_train_test(samples, train_fraction, seed);
    tracing::info!("Split: {} train, {} test (seed {})", train.len(), test.len(), seed);
    Ok((train, test))
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Steps 1-2: Load and split ─────────────────────────────────────────
        let (train, test) =
            load_and_split(&cfg.dataset, cfg.num_classes, cfg.train_fraction, cfg.seed)?;
        let labels = load_labels(Path::new(&cfg.labels))?;

        // ── Step 3: Burn datasets ─────────────────────────────────────────────
        let train_dataset = KeypointDataset::new(train);
        let val_dataset   = KeypointDataset::new(test.clone());

        // ── Step 4: Record the run ────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.model_dir);
        ckpt_manager.save_train_config(cfg)?;

        // ── Step 5: Fit ───────────────────────────────────────────────────────
        let outcome = run_training(cfg, train_dataset, val_dataset, &ckpt_manager)?;
        if outcome.stopped_early {
            tracing::info!("Stopped early at epoch {}", outcome.last_epoch);
        }
        tracing::info!("Best val_loss {:.5}", outcome.best_val_loss);

        // ── Step 6: Evaluate the in-memory model ──────────────────────────────
        let device = Device::default();
        let eval = evaluate_samples(&outcome.model, &test, cfg.batch_size, &device);
        println!(
            "Test evaluation - loss: {:.4} - accuracy: {:.4} ({} samples)",
            eval.loss, eval.accuracy, eval.samples
        );

        // ── Step 7: Reload the best checkpoint ────────────────────────────────
        let inferencer = Inferencer::from_checkpoint(&ckpt_manager)
            .context("Cannot reload the saved model")?;

        match test.first() {
            Some(row) => {
                let probs = inferencer.probabilities(&row.features)?;
                println!("{:?}", probs);
                println!("{}", argmax(&probs));
            }
            None => tracing::warn!("Test split is empty - skipping single-row inference"),
        }

        // ── Step 8: Confusion matrix + classification report ──────────────────
        report_on_test(&inferencer, &test, &labels, ckpt_manager.dir(), cfg.batch_size)?;

        // ── Step 9: Inference-only model ──────────────────────────────────────
        ckpt_manager.save_inference_model(inferencer.model(), &outcome.config)?;

        // ── Steps 10-11: Quantize, reload, parity ─────────────────────────────
        export_quantized(&inferencer, &ckpt_manager, &test, Path::new(&cfg.quantized_path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quant::format;
    use crate::test_support::synthetic_samples;
    use std::fmt::Write as _;

    fn write_csv(path: &Path, samples: &[KeypointSample]) {
        let mut text = String::new();
        for s in samples {
            let feats: Vec<String> = s.features.iter().map(|f| f.to_string()).collect();
            writeln!(text, "{},{}", s.label, feats.join(",")).unwrap();
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_load_and_split_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("keypoint.csv");
        write_csv(&csv, &synthetic_samples(40, 4, 3));

        let path = csv.to_string_lossy();
        let (train_a, test_a) = load_and_split(&path, 4, 0.75, 42).unwrap();
        let (train_b, test_b) = load_and_split(&path, 4, 0.75, 42).unwrap();

        assert_eq!(train_a.len(), 30);
        assert_eq!(test_a.len(), 10);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn test_full_pipeline_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("keypoint.csv");
        write_csv(&csv, &synthetic_samples(80, 3, 11));

        let model_dir = dir.path().join("keypoint_classifier");
        let kpq       = dir.path().join("keypoint_classifier.kpq");

        let cfg = TrainConfig {
            dataset:        csv.to_string_lossy().into_owned(),
            model_dir:      model_dir.to_string_lossy().into_owned(),
            quantized_path: kpq.to_string_lossy().into_owned(),
            labels:         dir.path().join("missing.csv").to_string_lossy().into_owned(),
            num_classes:    3,
            epochs:         5,
            batch_size:     16,
            lr:             1e-2,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg).execute().unwrap();

        let ckpt = CheckpointManager::new(&model_dir);
        assert!(ckpt.has_model());
        assert!(!ckpt.has_optimizer());
        assert!(model_dir.join("train_config.json").exists());
        assert!(model_dir.join("metrics.csv").exists());
        assert!(model_dir.join("confusion_matrix.csv").exists());

        let quantized = format::load(&kpq).unwrap();
        assert_eq!(quantized.num_classes(), 3);
    }

    #[test]
    fn test_whole_dataset_as_train_split_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("keypoint.csv");
        write_csv(&csv, &synthetic_samples(24, 3, 5));
        let kpq = dir.path().join("keypoint_classifier.kpq");

        let cfg = TrainConfig {
            dataset:        csv.to_string_lossy().into_owned(),
            model_dir:      dir.path().join("model").to_string_lossy().into_owned(),
            quantized_path: kpq.to_string_lossy().into_owned(),
            num_classes:    3,
            epochs:         3,
            train_fraction: 1.0,
            ..TrainConfig::default()
        };

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("Test split is empty"));
        assert!(!kpq.exists());
    }
}
