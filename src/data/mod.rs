// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the data file and tensor batches:
//
//   data file
//       │
//       ▼
//   loader     → RegressionTable (rows, labels, boundaries)
//       │
//       ▼
//   dataset    → MultiTaskDataset, instances grouped by task
//       │
//       ▼
//   splitter   → per-task train/test split
//       │
//       ▼
//   sampler    → task-balanced draws for every training step
//       │
//       ▼
//   batcher    → tensors on the training device

/// Reads the comma-separated regression file format
pub mod loader;

/// Implements Burn's Dataset trait over task-grouped instances
pub mod dataset;

/// Stratified train/test split, task by task
pub mod splitter;

/// Equal number of instances per task on every draw
pub mod sampler;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
