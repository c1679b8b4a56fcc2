// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer loads data through this trait and
// never sees how or where the rows are stored.
//
// Implementations:
//   - RegressionFile → the comma-separated task file format

use crate::domain::instance::RegressionTable;
use crate::error::Result;

// ─── RegressionSource ─────────────────────────────────────────────────────────
/// Anything that can produce a multi-task regression table.
pub trait RegressionSource {
    /// Load every row, label and the task boundaries.
    /// Fails on malformed input; there is no partial recovery.
    fn load(&self) -> Result<RegressionTable>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}
