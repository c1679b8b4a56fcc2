// ============================================================
// Layer 3 — Instance and RegressionTable
// ============================================================
// An Instance is one row of the multi-task dataset: a feature
// vector, its regression target and the task it belongs to.
//
// A RegressionTable is what a data source hands over before
// any validation against the partition has happened: raw rows,
// raw labels and the task boundaries.

use crate::domain::partition::TaskPartition;

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub features: Vec<f32>,
    pub label:    f32,
    /// Index into the task partition
    pub task:     usize,
}

impl Instance {
    pub fn new(features: Vec<f32>, label: f32, task: usize) -> Self {
        Self { features, label, task }
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

#[derive(Debug, Clone)]
pub struct RegressionTable {
    pub features:  Vec<Vec<f32>>,
    pub labels:    Vec<f32>,
    pub partition: TaskPartition,
}

impl RegressionTable {
    pub fn num_tasks(&self) -> usize {
        self.partition.num_tasks()
    }
}
