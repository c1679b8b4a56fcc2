use burn::data::dataset::Dataset;

use crate::domain::instance::{Instance, RegressionTable};
use crate::domain::partition::TaskPartition;
use crate::error::{HgnnError, Result};

/// Instances of every task stored contiguously in task order,
/// together with the partition describing the task blocks.
#[derive(Debug, Clone)]
pub struct MultiTaskDataset {
    instances: Vec<Instance>,
    partition: TaskPartition,
    dim:       usize,
}

impl MultiTaskDataset {
    pub fn from_table(table: RegressionTable) -> Result<Self> {
        let RegressionTable { features, labels, partition } = table;
        if features.len() != labels.len() {
            return Err(HgnnError::InvalidPartition(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        let instances = features
            .into_iter()
            .zip(labels)
            .zip(partition.task_ids())
            .map(|((f, label), task)| Instance::new(f, label, task))
            .collect();
        Self::new(instances, partition)
    }

    /// `instances` must already be grouped by task in partition order.
    pub fn new(instances: Vec<Instance>, partition: TaskPartition) -> Result<Self> {
        if instances.len() != partition.total() {
            return Err(HgnnError::InvalidPartition(format!(
                "partition covers {} instances, dataset holds {}",
                partition.total(),
                instances.len()
            )));
        }
        let dim = instances.first().map(Instance::dim).unwrap_or(0);
        if dim == 0 {
            return Err(HgnnError::InvalidPartition(
                "instances need at least one feature".to_string(),
            ));
        }
        for (index, instance) in instances.iter().enumerate() {
            if instance.dim() != dim {
                return Err(HgnnError::InvalidPartition(format!(
                    "instance {index} has {} features, expected {dim}",
                    instance.dim()
                )));
            }
            if partition.task_of(index) != Some(instance.task) {
                return Err(HgnnError::InvalidPartition(format!(
                    "instance {index} is tagged task {} but lies outside its block",
                    instance.task
                )));
            }
        }
        Ok(Self { instances, partition, dim })
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn partition(&self) -> &TaskPartition {
        &self.partition
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_tasks(&self) -> usize {
        self.partition.num_tasks()
    }

    pub fn task_instances(&self, task: usize) -> &[Instance] {
        &self.instances[self.partition.range(task)]
    }
}

impl Dataset<Instance> for MultiTaskDataset {
    fn get(&self, index: usize) -> Option<Instance> {
        self.instances.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.instances.len()
    }
}
