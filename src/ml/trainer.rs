// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
// Per epoch:
//   1. Shuffled pass over the training split, Adam step per batch
//   2. Validation pass over the held-out split (no dropout)
//   3. Metrics printed and appended to metrics.csv
//   4. val_loss improved?            → save full checkpoint
//   5. no improvement for `patience` → stop
//
// The in-memory model after the last epoch is returned; the
// best model is the one on disk.
//
// Key Burn insight:
//   - Training uses TrainBackend (Autodiff<Inner>) for gradients
//   - model.valid() returns the model on InnerBackend
//   - The validation batcher must also use InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::KeypointBatcher, dataset::KeypointDataset};
use crate::infra::{
    checkpoint::{CheckpointManager, TrainingState},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    callbacks::{EarlyStopping, ImprovementMonitor},
    evaluator::{count_correct, evaluate},
    model::{ClassifierConfig, KeypointClassifier},
    Device, InnerBackend, TrainBackend,
};

/// Adam epsilon, matching Keras' default
const ADAM_EPSILON: f32 = 1e-7;

/// What a finished `fit` hands back
pub struct TrainOutcome {
    /// Model as it stood after the final epoch
    pub model:         KeypointClassifier<InnerBackend>,
    pub config:        ClassifierConfig,
    pub last_epoch:    usize,
    pub best_val_loss: f64,
    pub stopped_early: bool,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: KeypointDataset,
    val_dataset:   KeypointDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<TrainOutcome> {
    let device = Device::default();
    tracing::info!("Using device: {:?}", device);
    train_loop(cfg, train_dataset, val_dataset, ckpt_manager, device)
}

fn train_loop(
    cfg:           &TrainConfig,
    train_dataset: KeypointDataset,
    val_dataset:   KeypointDataset,
    ckpt_manager:  &CheckpointManager,
    device:        Device,
) -> Result<TrainOutcome> {
    if train_dataset.samples().is_empty() {
        bail!("Training split is empty - the dataset needs more rows");
    }
    if val_dataset.samples().is_empty() {
        bail!("Test split is empty - lower --train-fraction so val_loss can be monitored");
    }

    TrainBackend::seed(cfg.seed);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new()
        .with_epsilon(ADAM_EPSILON)
        .init::<TrainBackend, KeypointClassifier<TrainBackend>>();

    // ── Build or resume model ─────────────────────────────────────────────────
    let model_cfg = ClassifierConfig::new(cfg.num_classes);
    let mut model: KeypointClassifier<TrainBackend>;
    let mut monitor;
    let mut early_stopping = EarlyStopping::new(cfg.patience, 0.0);
    let start_epoch;

    if cfg.resume {
        let state = ckpt_manager.load_training_state()?;
        let saved = ckpt_manager.load_config()?;
        if saved.num_classes != cfg.num_classes {
            bail!(
                "Checkpoint has {} classes but --num-classes is {}",
                saved.num_classes,
                cfg.num_classes
            );
        }

        model = ckpt_manager.load_model(&device)?;
        if ckpt_manager.has_optimizer() {
            optim = ckpt_manager.load_optimizer(optim, &device)?;
        } else {
            tracing::warn!("No optimizer state in checkpoint - resuming with fresh Adam moments");
        }

        monitor        = ImprovementMonitor::with_best(state.best_val_loss);
        early_stopping = early_stopping.with_best(state.best_val_loss);
        start_epoch    = state.epoch + 1;
        tracing::info!(
            "Resuming after epoch {} (best val_loss {:.5})",
            state.epoch,
            state.best_val_loss
        );
    } else {
        model       = model_cfg.init(&device);
        monitor     = ImprovementMonitor::new();
        start_epoch = 1;
        ckpt_manager.save_config(&model_cfg)?;
    }

    println!("{}", model_cfg.summary());

    let metrics = MetricsLogger::new(ckpt_manager.dir(), !cfg.resume)?;
    if cfg.resume {
        // rows from epochs after the checkpoint are rerun
        metrics.discard_after(start_epoch - 1)?;
    }

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = KeypointBatcher::<TrainBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend - no autodiff overhead) ──────────
    let val_batcher = KeypointBatcher::<InnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut last_epoch    = start_epoch.saturating_sub(1);
    let mut stopped_early = false;

    for epoch in start_epoch..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let n = batch.targets.dims()[0];
            let (loss, logits) = model.forward_classification(batch.features, batch.targets.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>() * n as f64;
            correct  += count_correct(logits, batch.targets);
            seen     += n;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // dropout disabled for deterministic evaluation
        let val = evaluate(&model.valid(), val_loader.as_ref());

        let m = EpochMetrics::new(
            epoch,
            loss_sum / seen.max(1) as f64,
            correct as f64 / seen.max(1) as f64,
            val.loss,
            val.accuracy,
        );
        println!("{}", m.progress_line(cfg.epochs));
        metrics.log(&m)?;
        last_epoch = epoch;

        // ── Checkpoint on improvement ─────────────────────────────────────────
        match monitor.update(val.loss) {
            Some(previous) => {
                println!(
                    "Epoch {:05}: val_loss improved from {:.5} to {:.5}, saving model to {}",
                    epoch,
                    previous,
                    val.loss,
                    ckpt_manager.dir().display()
                );
                let state = TrainingState { epoch, best_val_loss: val.loss };
                ckpt_manager.save_checkpoint(&model, &optim, &state)?;
            }
            None => tracing::debug!(
                "Epoch {:05}: val_loss did not improve from {:.5}",
                epoch,
                monitor.best()
            ),
        }

        // ── Early stopping ────────────────────────────────────────────────────
        if early_stopping.should_stop(val.loss) {
            println!("Epoch {:05}: early stopping", epoch);
            stopped_early = true;
            break;
        }
    }

    tracing::info!(
        "Training complete after epoch {} (metrics in '{}')",
        last_epoch,
        metrics.csv_path().display()
    );

    Ok(TrainOutcome {
        model: model.valid(),
        config: model_cfg,
        last_epoch,
        best_val_loss: monitor.best(),
        stopped_early,
    })
}
