// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal per
// subcommand.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No direct file formats here (that's Layer 4, 5b and 6)
//   - Only workflow coordination

/// Full training pipeline
pub mod train_use_case;

/// Report on a saved model
pub mod evaluate_use_case;

/// Int8 export and parity check
pub mod export_use_case;

/// Single-pose classification with the quantized model
pub mod predict_use_case;
