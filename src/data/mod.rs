// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from the keypoint CSV on disk to tensor batches.
//
//   keypoint.csv
//       │
//       ▼
//   CsvDatasetLoader  → parses and validates rows
//       │
//       ▼
//   split_train_test  → seeded 75/25 partition
//       │
//       ▼
//   KeypointDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   KeypointBatcher   → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

/// Parses the keypoint CSV and the gesture label file
pub mod loader;

/// Implements Burn's Dataset trait for keypoint samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/test split
pub mod splitter;
