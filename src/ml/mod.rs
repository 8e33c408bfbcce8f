// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All Burn training and inference code lives here.
//
//   model.rs      - The dense keypoint classifier
//                   input(42) → dropout(0.2) → dense(20, relu)
//                   → dropout(0.4) → dense(10, relu)
//                   → dense(num_classes, softmax)
//
//   callbacks.rs  - Checkpoint-on-improvement and early
//                   stopping decisions, free of Burn types
//
//   trainer.rs    - The epoch loop: Adam updates, validation
//                   on the held-out split, callbacks
//
//   evaluator.rs  - Loss / accuracy over a data loader and
//                   argmax predictions for the report
//
//   inferencer.rs - Loads the persisted model for single-row
//                   inference
//
// Backend selection:
//   default         NdArray (CPU)
//   --features wgpu Wgpu (GPU)
// Training wraps the inner backend in Autodiff.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Dense keypoint classifier architecture
pub mod model;

/// Early stopping and improvement tracking
pub mod callbacks;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Held-out evaluation and batch prediction
pub mod evaluator;

/// Inference engine - loads the persisted model and predicts
pub mod inferencer;

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

pub type Device = <InnerBackend as burn::tensor::backend::Backend>::Device;
