// ============================================================
// Layer 2 - EvaluateUseCase
// ============================================================
// Re-derives the seeded test split, reloads the saved model
// and prints loss, accuracy, the confusion matrix and the
// per-class report. Nothing is retrained.

use anyhow::Result;
use std::path::Path;

use crate::application::train_use_case::load_and_split;
use crate::data::loader::load_labels;
use crate::domain::{labels::LabelMap, sample::KeypointSample};
use crate::infra::{
    checkpoint::CheckpointManager,
    report::{ClassificationReport, ConfusionMatrix},
};
use crate::ml::{
    evaluator::{evaluate_samples, predict_classes},
    inferencer::Inferencer,
};

pub struct EvaluateConfig {
    pub dataset:        String,
    pub model_dir:      String,
    pub labels:         String,
    pub num_classes:    usize,
    pub batch_size:     usize,
    pub train_fraction: f64,
    pub seed:           u64,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        let (_, test) =
            load_and_split(&cfg.dataset, cfg.num_classes, cfg.train_fraction, cfg.seed)?;
        let labels = load_labels(Path::new(&cfg.labels))?;

        let ckpt_manager = CheckpointManager::new(&cfg.model_dir);
        let inferencer   = Inferencer::from_checkpoint(&ckpt_manager)?;

        let eval = evaluate_samples(inferencer.model(), &test, cfg.batch_size, inferencer.device());
        println!(
            "Test evaluation - loss: {:.4} - accuracy: {:.4} ({} samples)",
            eval.loss, eval.accuracy, eval.samples
        );

        report_on_test(&inferencer, &test, &labels, ckpt_manager.dir(), cfg.batch_size)
    }
}

/// Print the confusion matrix and classification report for the
/// test split, and write `confusion_matrix.csv` into `out_dir`.
pub fn report_on_test(
    inferencer: &Inferencer,
    test:       &[KeypointSample],
    labels:     &LabelMap,
    out_dir:    &Path,
    batch_size: usize,
) -> Result<()> {
    if test.is_empty() {
        tracing::warn!("Test split is empty - no report to print");
        return Ok(());
    }

    let y_true: Vec<usize> = test.iter().map(|s| s.label).collect();
    let y_pred = predict_classes(inferencer.model(), test, batch_size, inferencer.device())?;

    let matrix = ConfusionMatrix::compute(&y_true, &y_pred);
    println!("{}", matrix.render(labels));

    let csv_path = out_dir.join("confusion_matrix.csv");
    matrix.write_csv(&csv_path)?;
    tracing::info!("Confusion matrix written to '{}'", csv_path.display());

    println!("Classification Report");
    println!("{}", ClassificationReport::compute(&y_true, &y_pred).render(labels));
    Ok(())
}
