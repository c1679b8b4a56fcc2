// ============================================================
// Layer 4 — Stratified Train/Test Splitter
// ============================================================
// Splits every task separately so each task keeps its own
// train and test instances:
//
//   for each task, in task order:
//     shuffle the task's instances
//     first `train_count` → train set
//     the rest           → test set
//
// train_count per task:
//   TrainSize::Fraction(f) → ceil(task_size * f)
//   TrainSize::PerTask(n)  → n clamped to [1, task_size - 10]
//
// Tasks that cannot be split are rejected instead of producing
// an empty test block:
//   - PerTask mode on a task with 10 or fewer instances
//   - any split that leaves a task without test instances
//
// Uses Fisher-Yates via rand::seq::SliceRandom.

use rand::{seq::SliceRandom, Rng};

use crate::data::dataset::MultiTaskDataset;
use crate::domain::instance::Instance;
use crate::domain::partition::TaskPartition;
use crate::domain::settings::TrainSize;
use crate::error::{HgnnError, Result};

/// Instances held back from training in PerTask mode.
pub const MIN_TEST_HEADROOM: usize = 10;

#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train: MultiTaskDataset,
    pub test:  MultiTaskDataset,
}

/// Number of training instances a task of `task_size` contributes.
pub fn train_count(task: usize, task_size: usize, train_size: TrainSize) -> Result<usize> {
    let count = match train_size {
        TrainSize::Fraction(f) => (task_size as f64 * f).ceil() as usize,
        TrainSize::PerTask(n) => {
            if task_size <= MIN_TEST_HEADROOM {
                return Err(HgnnError::DegenerateTask {
                    task,
                    size:   task_size,
                    reason: format!(
                        "an absolute train size needs more than {MIN_TEST_HEADROOM} instances per task"
                    ),
                });
            }
            n.min(task_size - MIN_TEST_HEADROOM).max(1)
        }
    };
    if count >= task_size {
        return Err(HgnnError::DegenerateTask {
            task,
            size:   task_size,
            reason: format!("train count {count} leaves no test instances"),
        });
    }
    Ok(count)
}

/// Split `data` task by task into train and test sets.
pub fn split_by_task<R: Rng + ?Sized>(
    data:       &MultiTaskDataset,
    train_size: TrainSize,
    rng:        &mut R,
) -> Result<DataSplit> {
    let partition = data.partition();

    let mut train: Vec<Instance> = Vec::new();
    let mut test:  Vec<Instance> = Vec::new();
    let mut train_sizes = Vec::with_capacity(partition.num_tasks());
    let mut test_sizes  = Vec::with_capacity(partition.num_tasks());

    for task in 0..partition.num_tasks() {
        let size  = partition.size(task);
        let count = train_count(task, size, train_size)?;

        let mut order: Vec<usize> = partition.range(task).collect();
        order.shuffle(&mut *rng);

        let instances = data.instances();
        train.extend(order[..count].iter().map(|&i| instances[i].clone()));
        test.extend(order[count..].iter().map(|&i| instances[i].clone()));
        train_sizes.push(count);
        test_sizes.push(size - count);
    }

    tracing::debug!(
        "Stratified split: train per task {:?}, test per task {:?}",
        train_sizes,
        test_sizes
    );

    Ok(DataSplit {
        train: MultiTaskDataset::new(train, TaskPartition::from_sizes(&train_sizes)?)?,
        test:  MultiTaskDataset::new(test,  TaskPartition::from_sizes(&test_sizes)?)?,
    })
}
