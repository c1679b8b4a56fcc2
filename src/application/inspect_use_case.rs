// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Loads and validates a regression file without training:
//
//   Step 1: Parse the file               (Layer 4 - data)
//   Step 2: Build the dataset            (Layer 4 - data)
//   Step 3: Summarise tasks and labels
//   Step 4: Optionally dry-run the split (Layer 4 - data)
//
// A file that passes here is accepted by `train` as well, as
// long as the same train size is used.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::{dataset::MultiTaskDataset, loader::RegressionFile, splitter::train_count};
use crate::domain::settings::TrainSize;
use crate::domain::traits::RegressionSource;

/// Per-task numbers shown by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task:       usize,
    pub size:       usize,
    pub label_mean: f64,
    /// (train, test) counts for the requested train size
    pub split:      Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub source:    String,
    pub num_tasks: usize,
    pub dim:       usize,
    pub total:     usize,
    pub tasks:     Vec<TaskSummary>,
}

pub struct InspectUseCase {
    source:     RegressionFile,
    train_size: Option<f64>,
}

impl InspectUseCase {
    pub fn new(data_file: impl Into<String>, train_size: Option<f64>) -> Self {
        Self { source: RegressionFile::new(data_file.into()), train_size }
    }

    pub fn execute(&self) -> Result<DatasetSummary> {
        let table = self
            .source
            .load()
            .with_context(|| format!("Failed to load '{}'", self.source.describe()))?;
        let dataset = MultiTaskDataset::from_table(table)?;

        let train_size = self.train_size.map(TrainSize::from_value).transpose()?;

        let tasks = (0..dataset.num_tasks())
            .map(|task| -> Result<TaskSummary> {
                let instances = dataset.task_instances(task);
                let size      = instances.len();
                let label_mean =
                    instances.iter().map(|i| f64::from(i.label)).sum::<f64>() / size as f64;
                let split = train_size
                    .map(|ts| train_count(task, size, ts).map(|n| (n, size - n)))
                    .transpose()?;
                Ok(TaskSummary { task, size, label_mean, split })
            })
            .collect::<Result<Vec<_>>>()?;

        let summary = DatasetSummary {
            source:    self.source.describe(),
            num_tasks: dataset.num_tasks(),
            dim:       dataset.dim(),
            total:     dataset.instances().len(),
            tasks,
        };
        tracing::info!(
            "'{}': {} tasks, {} instances, dim {}",
            summary.source,
            summary.num_tasks,
            summary.total,
            summary.dim
        );
        Ok(summary)
    }
}
