// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the use cases:
//
//   checkpoint.rs - Full trainable checkpoints and the
//                   inference-only model (weights + topology)
//
//   metrics.rs    - Per-epoch loss/accuracy CSV log
//
//   report.rs     - Confusion matrix and classification
//                   report for the held-out split

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Confusion matrix and classification report
pub mod report;
