// ============================================================
// Layer 5 - Evaluator
// ============================================================
// Loss and accuracy of a model over a data loader, plus argmax
// predictions for the confusion matrix.
//
// Loss is the sample-weighted mean of per-batch cross-entropy,
// so a short final batch does not skew the result.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::{
    batcher::{KeypointBatch, KeypointBatcher},
    dataset::KeypointDataset,
};
use crate::domain::sample::{KeypointSample, FEATURE_DIM};
use crate::ml::model::KeypointClassifier;

/// Held-out metrics for one pass over a dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

/// Evaluate over every batch a loader yields.
pub fn evaluate<B: Backend>(
    model:  &KeypointClassifier<B>,
    loader: &dyn DataLoader<KeypointBatch<B>>,
) -> Evaluation {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let n = batch.targets.dims()[0];
        let (loss, logits) = model.forward_classification(batch.features, batch.targets.clone());

        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;
        correct  += count_correct(logits, batch.targets);
        total    += n;
    }

    Evaluation {
        loss:     if total > 0 { loss_sum / total as f64 } else { f64::NAN },
        accuracy: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
        samples:  total,
    }
}

/// Evaluate a slice of samples with a fresh, unshuffled loader.
pub fn evaluate_samples<B: Backend>(
    model:      &KeypointClassifier<B>,
    samples:    &[KeypointSample],
    batch_size: usize,
    device:     &B::Device,
) -> Evaluation {
    let loader = DataLoaderBuilder::new(KeypointBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(1)
        .build(KeypointDataset::new(samples.to_vec()));
    evaluate(model, loader.as_ref())
}

/// Number of rows whose argmax matches the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1] - flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

/// Argmax class id for every sample, in input order.
pub fn predict_classes<B: Backend>(
    model:      &KeypointClassifier<B>,
    samples:    &[KeypointSample],
    batch_size: usize,
    device:     &B::Device,
) -> Result<Vec<usize>> {
    let batcher = KeypointBatcher::<B>::new(device.clone());
    let mut predictions = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(batch_size.max(1)) {
        let rows: Vec<[f32; FEATURE_DIM]> = chunk.iter().map(|s| s.features).collect();
        let classes: Vec<i64> = model
            .forward(batcher.features(&rows))
            .argmax(1)
            .flatten::<1>(0, 1)
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read predictions: {e:?}"))?;
        predictions.extend(classes.into_iter().map(|c| c as usize));
    }

    Ok(predictions)
}
