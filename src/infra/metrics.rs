// ============================================================
// Layer 6 — Evaluation Metrics Logger
// ============================================================
// Appends one CSV row per evaluation cycle:
//
//   epoch,step,train_objective,mean_error,task_0,task_1,...
//   0,0,12.481000,3.104522,2.981000,3.228044
//   5,40,4.017730,1.220931,1.002113,1.439749
//
// Output file: <dir>/metrics.csv. A header is written only when
// the file is new, so several runs can share one file as long as
// they have the same task count.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::Serialize;

use crate::ml::evaluator::TaskErrors;

/// One evaluation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct EvalMetrics {
    pub epoch: usize,

    /// Optimizer step after which the evaluation ran
    pub step: usize,

    /// Objective (data loss + L2 penalty) of that step's batch
    pub train_objective: f64,

    pub errors: TaskErrors,
}

impl EvalMetrics {
    pub fn new(epoch: usize, step: usize, train_objective: f64, errors: TaskErrors) -> Self {
        Self { epoch, step, train_objective, errors }
    }

    /// True if the mean test error beats `best_mean`.
    pub fn is_improvement(&self, best_mean: f64) -> bool {
        self.errors.mean < best_mean
    }
}

pub struct MetricsLogger {
    csv_path:  PathBuf,
    num_tasks: usize,
}

impl MetricsLogger {
    /// Create `dir` if needed and write the header for `num_tasks` tasks.
    pub fn new(dir: impl Into<String>, num_tasks: usize) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            let task_columns: Vec<String> = (0..num_tasks).map(|t| format!("task_{t}")).collect();
            writeln!(f, "epoch,step,train_objective,mean_error,{}", task_columns.join(","))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, num_tasks })
    }

    pub fn log(&self, m: &EvalMetrics) -> Result<()> {
        anyhow::ensure!(
            m.errors.num_tasks() == self.num_tasks,
            "metrics row has {} tasks, CSV expects {}",
            m.errors.num_tasks(),
            self.num_tasks
        );

        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let per_task: Vec<String> = m.errors.per_task.iter().map(|e| format!("{e:.6}")).collect();
        writeln!(
            f,
            "{},{},{:.6},{:.6},{}",
            m.epoch,
            m.step,
            m.train_objective,
            m.errors.mean,
            per_task.join(","),
        )?;

        tracing::debug!("Logged epoch {} metrics: mean_error={:.4}", m.epoch, m.errors.mean);
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
