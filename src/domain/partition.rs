// ============================================================
// Layer 3 — Task Partition
// ============================================================
// Instances of all tasks live in one flat array, grouped by
// task. The partition records where each task's block starts:
//
//   boundaries = [0, 20, 35]
//   task 0 → rows 0..20
//   task 1 → rows 20..35
//
// Invariants (checked on construction, never re-checked):
//   - boundaries[0] == 0
//   - strictly increasing, so no task is empty
//   - at least one task

use std::ops::Range;

use crate::error::{HgnnError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPartition {
    boundaries: Vec<usize>,
}

impl TaskPartition {
    /// Build a partition from 0-indexed cumulative offsets.
    pub fn new(boundaries: Vec<usize>) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(HgnnError::InvalidPartition(format!(
                "need at least 2 boundaries for one task, got {}",
                boundaries.len()
            )));
        }
        if boundaries[0] != 0 {
            return Err(HgnnError::InvalidPartition(format!(
                "first boundary must be 0, got {}",
                boundaries[0]
            )));
        }
        if let Some(task) = boundaries.windows(2).position(|w| w[1] <= w[0]) {
            return Err(HgnnError::InvalidPartition(format!(
                "boundaries must be strictly increasing; task {task} spans {}..{}",
                boundaries[task],
                boundaries[task + 1]
            )));
        }
        Ok(Self { boundaries })
    }

    /// Data files store offsets 1-indexed (first task starts at 1).
    pub fn from_one_indexed(offsets: &[usize]) -> Result<Self> {
        let boundaries = offsets
            .iter()
            .map(|&o| {
                o.checked_sub(1).ok_or_else(|| {
                    HgnnError::InvalidPartition("1-indexed offsets cannot be 0".to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(boundaries)
    }

    pub fn from_sizes(sizes: &[usize]) -> Result<Self> {
        let mut boundaries = Vec::with_capacity(sizes.len() + 1);
        boundaries.push(0);
        let mut total = 0;
        for &size in sizes {
            total += size;
            boundaries.push(total);
        }
        Self::new(boundaries)
    }

    /// Layout of a sampled batch: every task contributes `per_task` rows.
    pub fn uniform(num_tasks: usize, per_task: usize) -> Result<Self> {
        Self::from_sizes(&vec![per_task; num_tasks])
    }

    pub fn num_tasks(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Total instance count across tasks.
    pub fn total(&self) -> usize {
        self.boundaries[self.boundaries.len() - 1]
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn range(&self, task: usize) -> Range<usize> {
        self.boundaries[task]..self.boundaries[task + 1]
    }

    pub fn size(&self, task: usize) -> usize {
        self.boundaries[task + 1] - self.boundaries[task]
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.boundaries.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Task owning the instance at `index`, or None when out of range.
    pub fn task_of(&self, index: usize) -> Option<usize> {
        if index >= self.total() {
            return None;
        }
        // partition_point gives the first boundary > index
        Some(self.boundaries.partition_point(|&b| b <= index) - 1)
    }

    /// Task id of every instance, in storage order.
    pub fn task_ids(&self) -> Vec<usize> {
        (0..self.num_tasks())
            .flat_map(|t| std::iter::repeat(t).take(self.size(t)))
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_sum_to_total() {
        let p = TaskPartition::new(vec![0, 20, 35, 36]).unwrap();
        assert_eq!(p.num_tasks(), 3);
        assert_eq!(p.sizes(), vec![20, 15, 1]);
        assert_eq!(p.sizes().iter().sum::<usize>(), p.total());
    }

    #[test]
    fn test_every_instance_has_exactly_one_task() {
        let p   = TaskPartition::new(vec![0, 3, 5, 9]).unwrap();
        let ids = p.task_ids();
        assert_eq!(ids.len(), p.total());
        for (i, &t) in ids.iter().enumerate() {
            assert_eq!(p.task_of(i), Some(t));
            assert!(p.range(t).contains(&i));
        }
        assert_eq!(p.task_of(9), None);
    }

    #[test]
    fn test_one_indexed_offsets_shift_down() {
        let p = TaskPartition::from_one_indexed(&[1, 21, 36]).unwrap();
        assert_eq!(p.boundaries(), &[0, 20, 35]);
        assert!(TaskPartition::from_one_indexed(&[0, 5]).is_err());
    }

    #[test]
    fn test_rejects_invalid_boundaries() {
        assert!(TaskPartition::new(vec![0]).is_err());
        assert!(TaskPartition::new(vec![1, 5]).is_err());
        // empty task
        assert!(TaskPartition::new(vec![0, 4, 4, 9]).is_err());
        assert!(TaskPartition::new(vec![0, 6, 3]).is_err());
    }

    #[test]
    fn test_uniform_layout() {
        let p = TaskPartition::uniform(3, 4).unwrap();
        assert_eq!(p.boundaries(), &[0, 4, 8, 12]);
        assert!(TaskPartition::uniform(2, 0).is_err());
    }
}
