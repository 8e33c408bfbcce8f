// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores the keypoint classifier.
//
// Two forms share one directory:
//
//   Full trainable checkpoint (written on every val_loss
//   improvement during training):
//     model.mpk.gz             ← all learned parameters
//     optimizer.mpk.gz         ← Adam moment estimates
//     training_state.json      ← epoch + best val_loss
//     classifier_config.json   ← model topology
//
//   Inference-only model (written once training is done):
//     model.mpk.gz + classifier_config.json, optimizer removed
//
// Weights use Burn's NamedMpkGzFileRecorder at full precision,
// so a save/load round trip reproduces predictions exactly.
//
// File naming convention:
//   model/keypoint_classifier/keypoint_classifier/
//     model.mpk.gz
//     optimizer.mpk.gz
//     training_state.json
//     classifier_config.json
//     train_config.json      ← the run's paths and hyperparameters
//     metrics.csv
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{ClassifierConfig, KeypointClassifier};

type WeightRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

const MODEL_STEM:     &str = "model";
const OPTIMIZER_STEM: &str = "optimizer";
const WEIGHT_EXT:     &str = "mpk.gz";

/// Where a training run left off
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Epoch whose weights are in the checkpoint
    pub epoch: usize,
    /// val_loss of that epoch
    pub best_val_loss: f64,
}

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the weights file as it appears on disk
    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(format!("{MODEL_STEM}.{WEIGHT_EXT}"))
    }

    fn optimizer_path(&self) -> PathBuf {
        self.dir.join(format!("{OPTIMIZER_STEM}.{WEIGHT_EXT}"))
    }

    pub fn has_model(&self) -> bool {
        self.weights_path().exists() && self.dir.join("classifier_config.json").exists()
    }

    pub fn has_optimizer(&self) -> bool {
        self.optimizer_path().exists()
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))
    }

    // ─── Full checkpoint ──────────────────────────────────────────────────────

    /// Save model weights, optimizer state and the training position.
    pub fn save_checkpoint<B, O>(
        &self,
        model: &KeypointClassifier<B>,
        optim: &O,
        state: &TrainingState,
    ) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<KeypointClassifier<B>, B>,
    {
        self.save_weights(model)?;

        let path = self.dir.join(OPTIMIZER_STEM);
        <WeightRecorder as Recorder<B>>::record(&WeightRecorder::new(), optim.to_record(), path)
            .map_err(|e| anyhow!("Failed to save optimizer state: {e:?}"))?;

        self.write_json("training_state.json", state)?;

        tracing::debug!("Saved checkpoint: epoch {}", state.epoch);
        Ok(())
    }

    /// Restore Adam state saved by `save_checkpoint`.
    pub fn load_optimizer<B, O>(&self, optim: O, device: &B::Device) -> Result<O>
    where
        B: AutodiffBackend,
        O: Optimizer<KeypointClassifier<B>, B>,
    {
        let path = self.dir.join(OPTIMIZER_STEM);
        let record = <WeightRecorder as Recorder<B>>::load::<O::Record>(
            &WeightRecorder::new(),
            path,
            device,
        )
        .map_err(|e| anyhow!("Cannot load optimizer state: {e:?}"))?;

        Ok(optim.load_record(record))
    }

    pub fn load_training_state(&self) -> Result<TrainingState> {
        self.read_json("training_state.json")
            .context("No training state to resume from. Run 'train' without --resume first")
    }

    // ─── Inference-only model ─────────────────────────────────────────────────

    /// Save weights and topology without optimizer state.
    pub fn save_inference_model<B: Backend>(
        &self,
        model:  &KeypointClassifier<B>,
        config: &ClassifierConfig,
    ) -> Result<()> {
        self.save_config(config)?;
        self.save_weights(model)?;

        let optimizer = self.optimizer_path();
        if optimizer.exists() {
            fs::remove_file(&optimizer)
                .with_context(|| format!("Cannot remove '{}'", optimizer.display()))?;
        }

        tracing::info!("Saved inference model to '{}'", self.dir.display());
        Ok(())
    }

    /// Rebuild the model from its saved topology, then load weights.
    pub fn load_model<B: Backend>(&self, device: &B::Device) -> Result<KeypointClassifier<B>> {
        let config = self.load_config()?;
        let model: KeypointClassifier<B> = config.init(device);

        model
            .load_file(self.dir.join(MODEL_STEM), &WeightRecorder::new(), device)
            .map_err(|e| {
                anyhow!(
                    "Cannot load weights '{}': {e:?}. Have you trained the model first?",
                    self.weights_path().display()
                )
            })
    }

    fn save_weights<B: Backend>(&self, model: &KeypointClassifier<B>) -> Result<()> {
        self.ensure_dir()?;
        model
            .clone()
            .save_file(self.dir.join(MODEL_STEM), &WeightRecorder::new())
            .map_err(|e| {
                anyhow!("Failed to save weights to '{}': {e:?}", self.weights_path().display())
            })
    }

    // ─── Configs ──────────────────────────────────────────────────────────────

    pub fn save_config(&self, config: &ClassifierConfig) -> Result<()> {
        self.write_json("classifier_config.json", config)
    }

    pub fn load_config(&self) -> Result<ClassifierConfig> {
        self.read_json("classifier_config.json")
            .context("Make sure you have run 'train' first")
    }

    /// Record the run's hyperparameters next to the weights.
    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json("train_config.json", cfg)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse '{}'", path.display()))
    }
}
