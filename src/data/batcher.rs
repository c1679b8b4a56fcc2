// ============================================================
// Layer 4 — Regression Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Instance>
// into tensors on the target device.
//
//   Input:  N instances, each with `dim` features
//   Output: features [N, dim], labels [N, 1], task_ids [N]
//
// The batcher keeps row order untouched. Callers hand it
// instances already grouped by task (sampler draws, or a whole
// dataset), so the matching TaskPartition is known to them.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::domain::instance::Instance;

// ─── RegressionBatch ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct RegressionBatch<B: Backend> {
    /// Shape: [N, dim]
    pub features: Tensor<B, 2>,

    /// Shape: [N, 1]
    pub labels: Tensor<B, 2>,

    /// Shape: [N]; indexes head weights and task embeddings
    pub task_ids: Tensor<B, 1, Int>,
}

impl<B: Backend> RegressionBatch<B> {
    pub fn len(&self) -> usize {
        self.features.dims()[0]
    }
}

// ─── TaskBatcher ──────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TaskBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TaskBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Instance, RegressionBatch<B>> for TaskBatcher<B> {
    fn batch(&self, items: Vec<Instance>) -> RegressionBatch<B> {
        let count = items.len();
        let dim   = items.first().map(Instance::dim).unwrap_or(0);

        let features: Vec<f32> = items
            .iter()
            .flat_map(|i| i.features.iter().copied())
            .collect();
        let labels: Vec<f32> = items.iter().map(|i| i.label).collect();
        let task_ids: Vec<i32> = items.iter().map(|i| i.task as i32).collect();

        let features = Tensor::<B, 2>::from_data(TensorData::new(features, [count, dim]), &self.device);
        let labels   = Tensor::<B, 2>::from_data(TensorData::new(labels, [count, 1]), &self.device);
        let task_ids = Tensor::<B, 1, Int>::from_ints(task_ids.as_slice(), &self.device);

        RegressionBatch { features, labels, task_ids }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_shapes_and_values() {
        let device  = Default::default();
        let batcher = TaskBatcher::<NdArray>::new(device);
        let batch   = batcher.batch(vec![
            Instance::new(vec![1.0, 2.0, 3.0], 0.5, 0),
            Instance::new(vec![4.0, 5.0, 6.0], 1.5, 1),
        ]);

        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(),   [2, 1]);
        assert_eq!(batch.task_ids.dims(), [2]);
        assert_eq!(batch.len(), 2);

        let feats: Vec<f32> = batch.features.into_data().to_vec().unwrap();
        assert_eq!(feats, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let labels: Vec<f32> = batch.labels.into_data().to_vec().unwrap();
        assert_eq!(labels, vec![0.5, 1.5]);
        let ids: Vec<i64> = batch.task_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(ids, vec![0, 1]);
    }
}
