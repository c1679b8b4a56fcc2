// ============================================================
// Layer 4 — Task-Balanced Sampler
// ============================================================
// Every training step sees the same number of instances from
// every task. A draw returns `batch_size * num_tasks` instances
// laid out task after task:
//
//   [ task 0 × batch_size | task 1 × batch_size | ... ]
//
// Each task keeps its own shuffled index list and a cursor:
//
//   task smaller than batch_size
//       → all of its instances, then uniform draws with
//         replacement until the block is full
//   cursor + batch_size <= task_size
//       → the next contiguous slice; wrap and reshuffle when
//         the cursor hits the end exactly
//   otherwise
//       → the last batch_size entries; wrap and reshuffle
//
// Invariant: the cursor always stays in [0, task_size).

use rand::{rngs::StdRng, seq::SliceRandom, Rng};

use crate::data::dataset::MultiTaskDataset;
use crate::domain::instance::Instance;

#[derive(Debug, Clone)]
struct TaskCursor {
    /// Dataset indices of this task, in the current shuffled order
    order:    Vec<usize>,
    position: usize,
}

pub struct TaskBalancedSampler<'a> {
    data:       &'a MultiTaskDataset,
    batch_size: usize,
    cursors:    Vec<TaskCursor>,
    rng:        StdRng,
}

impl<'a> TaskBalancedSampler<'a> {
    pub fn new(data: &'a MultiTaskDataset, batch_size: usize, mut rng: StdRng) -> Self {
        let cursors = (0..data.num_tasks())
            .map(|task| {
                let mut order: Vec<usize> = data.partition().range(task).collect();
                order.shuffle(&mut rng);
                TaskCursor { order, position: 0 }
            })
            .collect();
        Self { data, batch_size, cursors, rng }
    }

    /// Dataset indices of the next batch, task blocks in task order.
    pub fn next_indices(&mut self) -> Vec<usize> {
        let batch_size = self.batch_size;
        let mut picked = Vec::with_capacity(batch_size * self.cursors.len());

        for cursor in &mut self.cursors {
            let size = cursor.order.len();

            if size < batch_size {
                picked.extend_from_slice(&cursor.order);
                picked.extend(
                    (size..batch_size).map(|_| cursor.order[self.rng.gen_range(0..size)]),
                );
            } else if cursor.position + batch_size <= size {
                let start = cursor.position;
                picked.extend_from_slice(&cursor.order[start..start + batch_size]);
                cursor.position += batch_size;
                if cursor.position == size {
                    cursor.position = 0;
                    cursor.order.shuffle(&mut self.rng);
                }
            } else {
                picked.extend_from_slice(&cursor.order[size - batch_size..]);
                cursor.position = 0;
                cursor.order.shuffle(&mut self.rng);
            }
        }
        picked
    }

    /// Instances of the next batch; see `next_indices` for the layout.
    pub fn next_batch(&mut self) -> Vec<Instance> {
        let instances = self.data.instances();
        self.next_indices()
            .into_iter()
            .map(|i| instances[i].clone())
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::RegressionTable;
    use crate::domain::partition::TaskPartition;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn dataset(sizes: &[usize]) -> MultiTaskDataset {
        let partition = TaskPartition::from_sizes(sizes).unwrap();
        let total     = partition.total();
        MultiTaskDataset::from_table(RegressionTable {
            features: (0..total).map(|i| vec![i as f32]).collect(),
            labels:   (0..total).map(|i| i as f32 * 0.5).collect(),
            partition,
        })
        .unwrap()
    }

    #[test]
    fn test_batch_layout() {
        let data    = dataset(&[9, 6]);
        let mut s   = TaskBalancedSampler::new(&data, 4, StdRng::seed_from_u64(0));
        let batch   = s.next_batch();
        assert_eq!(batch.len(), 8);
        assert!(batch[..4].iter().all(|i| i.task == 0));
        assert!(batch[4..].iter().all(|i| i.task == 1));
        // labels travel with their features
        assert!(batch.iter().all(|i| i.label == i.features[0] * 0.5));
    }

    #[test]
    fn test_coverage_over_one_pass() {
        for &(size, batch_size) in &[(10usize, 4usize), (8, 4), (9, 3), (7, 7), (13, 5)] {
            let data  = dataset(&[size]);
            let mut s = TaskBalancedSampler::new(&data, batch_size, StdRng::seed_from_u64(11));
            let draws = (size + batch_size - 1) / batch_size;
            let seen: HashSet<usize> = (0..draws).flat_map(|_| s.next_indices()).collect();
            assert_eq!(seen.len(), size, "size={size} batch={batch_size}");
        }
    }

    #[test]
    fn test_small_task_is_padded_with_its_own_instances() {
        let data  = dataset(&[3, 12]);
        let mut s = TaskBalancedSampler::new(&data, 5, StdRng::seed_from_u64(2));
        for _ in 0..4 {
            let idx   = s.next_indices();
            let small = &idx[..5];
            let firsts: HashSet<usize> = small[..3].iter().copied().collect();
            assert_eq!(firsts, (0..3).collect::<HashSet<_>>());
            assert!(small[3..].iter().all(|&i| i < 3));
        }
    }

    #[test]
    fn test_cursor_wraps_and_stays_in_range() {
        let data  = dataset(&[10]);
        let mut s = TaskBalancedSampler::new(&data, 4, StdRng::seed_from_u64(5));
        for _ in 0..20 {
            let idx = s.next_indices();
            assert_eq!(idx.len(), 4);
            assert!(idx.iter().all(|&i| i < 10));
            assert!(s.cursors[0].position < 10);
        }
        // 10 = 4 + 4 + last four → back at the start
        let mut s = TaskBalancedSampler::new(&data, 4, StdRng::seed_from_u64(5));
        s.next_indices();
        s.next_indices();
        assert_eq!(s.cursors[0].position, 8);
        s.next_indices();
        assert_eq!(s.cursors[0].position, 0);
    }
}
