// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to any single
// business layer:
//
//   metrics.rs → Evaluation metrics logging
//                Appends the per-task and mean test error of
//                every evaluation cycle to a CSV file.

/// Evaluation metrics CSV logger
pub mod metrics;
