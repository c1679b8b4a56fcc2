// ============================================================
// Layer 5 — Held-Out Evaluation
// ============================================================
// Scores a parameter snapshot on the full test set:
//
//   1. encode the whole train set (no batching)
//   2. task embeddings from the train rows of every task
//   3. encode the whole test set
//   4. append each test row's task embedding
//   5. frozen per-task heads → predictions
//   6. per-task MSE, plus the mean across tasks
//
// Reads parameters only; calling it twice on the same snapshot
// and data returns the same numbers.

use burn::{data::dataloader::batcher::Batcher, prelude::*};
use serde::Serialize;

use crate::data::batcher::{RegressionBatch, TaskBatcher};
use crate::data::dataset::MultiTaskDataset;
use crate::domain::partition::TaskPartition;
use crate::domain::settings::Activation;
use crate::error::{HgnnError, Result};
use crate::ml::loss::per_task_mse;
use crate::ml::model::HgnnModel;

/// Test MSE of every task and their unweighted mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskErrors {
    pub per_task: Vec<f64>,
    pub mean:     f64,
}

impl TaskErrors {
    pub fn from_per_task(per_task: Vec<f64>) -> Self {
        let mean = per_task.iter().sum::<f64>() / per_task.len().max(1) as f64;
        Self { per_task, mean }
    }

    pub fn num_tasks(&self) -> usize {
        self.per_task.len()
    }

    /// `num_tasks + 1` values; the last one is the mean.
    pub fn as_row(&self) -> Vec<f64> {
        let mut row = self.per_task.clone();
        row.push(self.mean);
        row
    }

    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.per_task.iter().all(|e| e.is_finite())
    }
}

/// A whole dataset as tensors, plus its task layout.
#[derive(Debug, Clone)]
pub struct EvaluationSet<B: Backend> {
    pub batch:     RegressionBatch<B>,
    pub partition: TaskPartition,
}

impl<B: Backend> EvaluationSet<B> {
    pub fn from_dataset(dataset: &MultiTaskDataset, device: &B::Device) -> Self {
        let batch = TaskBatcher::<B>::new(device.clone()).batch(dataset.instances().to_vec());
        Self { batch, partition: dataset.partition().clone() }
    }
}

pub fn evaluate<B: Backend>(
    model:  &HgnnModel<B>,
    choice: Activation,
    train:  &EvaluationSet<B>,
    test:   &EvaluationSet<B>,
) -> Result<TaskErrors> {
    let num_tasks = model.num_tasks();
    if train.partition.num_tasks() != num_tasks || test.partition.num_tasks() != num_tasks {
        return Err(HgnnError::InvalidConfig(format!(
            "model has {num_tasks} heads but train/test sets have {}/{} tasks",
            train.partition.num_tasks(),
            test.partition.num_tasks()
        )));
    }

    let train_hidden    = model.encode_instances(train.batch.features.clone(), choice);
    let task_embeddings = model.task_embeddings(train_hidden, &train.partition);

    let test_hidden = model.encode_instances(test.batch.features.clone(), choice);
    let fused       = model.fuse(test_hidden, task_embeddings, test.batch.task_ids.clone());
    let predictions = model.predict(fused, test.batch.task_ids.clone());

    let per_task: Vec<f32> = per_task_mse(predictions, test.batch.labels.clone(), &test.partition)
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| HgnnError::Tensor(format!("{e:?}")))?;

    Ok(TaskErrors::from_per_task(per_task.into_iter().map(f64::from).collect()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::RegressionTable;
    use crate::ml::model::HgnnConfig;
    use burn::backend::NdArray;
    use rand::{rngs::StdRng, SeedableRng};

    type TestBackend = NdArray;

    fn dataset(sizes: &[usize], offset: f32) -> MultiTaskDataset {
        let partition = TaskPartition::from_sizes(sizes).unwrap();
        let total     = partition.total();
        MultiTaskDataset::from_table(RegressionTable {
            features: (0..total)
                .map(|i| vec![i as f32 * 0.1 + offset, 1.0 - i as f32 * 0.05, 0.3])
                .collect(),
            labels:   (0..total).map(|i| (i % 4) as f32).collect(),
            partition,
        })
        .unwrap()
    }

    #[test]
    fn test_task_errors_row_layout() {
        let e = TaskErrors::from_per_task(vec![1.0, 3.0]);
        assert_eq!(e.mean, 2.0);
        assert_eq!(e.as_row(), vec![1.0, 3.0, 2.0]);
        assert_eq!(e.num_tasks(), 2);
        assert!(e.is_finite());
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let device = Default::default();
        let model: HgnnModel<TestBackend> = HgnnConfig::new(3, 6, 2)
            .init(&mut StdRng::seed_from_u64(21), &device);
        let train = EvaluationSet::from_dataset(&dataset(&[6, 4], 0.0), &device);
        let test  = EvaluationSet::from_dataset(&dataset(&[3, 2], 0.5), &device);

        let first  = evaluate(&model, Activation::Tanh, &train, &test).unwrap();
        let second = evaluate(&model, Activation::Tanh, &train, &test).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_row().len(), 3);
        assert!(first.is_finite());
        assert!(first.per_task.iter().all(|e| *e >= 0.0));
    }

    #[test]
    fn test_task_count_mismatch_is_rejected() {
        let device = Default::default();
        let model: HgnnModel<TestBackend> = HgnnConfig::new(3, 4, 3)
            .init(&mut StdRng::seed_from_u64(1), &device);
        let train = EvaluationSet::from_dataset(&dataset(&[6, 4], 0.0), &device);
        let test  = EvaluationSet::from_dataset(&dataset(&[3, 2], 0.5), &device);
        assert!(matches!(
            evaluate(&model, Activation::Tanh, &train, &test),
            Err(HgnnError::InvalidConfig(_))
        ));
    }
}
