// ============================================================
// Layer 5 — Multi-Task Regression Loss
// ============================================================
// Per-task mean squared error, computed as one segmented
// reduction instead of a loop over instances:
//
//   sq_err   = (pred - label)²                    [N, 1]
//   M[t, i]  = 1 / size(t)  if instance i ∈ task t
//              0            otherwise             [T, N]
//   per_task = M · sq_err                         [T, 1]
//
// Objective = Σ per_task + λ · (‖W_in‖² + ‖W_heads‖²)

use burn::prelude::*;

use crate::domain::partition::TaskPartition;

/// Averaging matrix [T, N] for the task blocks of `partition`.
/// Tasks are never empty (partition invariant), so every divisor is ≥ 1.
pub fn segment_means<B: Backend>(partition: &TaskPartition, device: &B::Device) -> Tensor<B, 2> {
    let num_tasks = partition.num_tasks();
    let total     = partition.total();

    let mut weights = vec![0.0f32; num_tasks * total];
    for task in 0..num_tasks {
        let share = 1.0 / partition.size(task) as f32;
        for i in partition.range(task) {
            weights[task * total + i] = share;
        }
    }
    Tensor::from_data(TensorData::new(weights, [num_tasks, total]), device)
}

/// Mean squared error of every task: [N, 1] × [N, 1] → [T, 1].
pub fn per_task_mse<B: Backend>(
    predictions: Tensor<B, 2>,
    labels:      Tensor<B, 2>,
    partition:   &TaskPartition,
) -> Tensor<B, 2> {
    let device  = predictions.device();
    let squared = (predictions - labels).powf_scalar(2.0);
    segment_means::<B>(partition, &device).matmul(squared)
}

/// Squared Frobenius norm, as a single-element tensor.
pub fn squared_norm<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Tensor<B, 1> {
    tensor.powf_scalar(2.0).sum()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_segment_means_rows_average_their_block() {
        let device    = Default::default();
        let partition = TaskPartition::new(vec![0, 2, 5]).unwrap();
        let m: Vec<f32> = segment_means::<TestBackend>(&partition, &device)
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(m.len(), 10);
        assert_eq!(&m[0..5], &[0.5, 0.5, 0.0, 0.0, 0.0]);
        for (a, b) in m[5..].iter().zip([0.0, 0.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]) {
            assert!((a - b).abs() < 1e-7);
        }
    }

    #[test]
    fn test_per_task_mse_matches_hand_computation() {
        let device    = Default::default();
        let partition = TaskPartition::new(vec![0, 2, 3]).unwrap();
        let preds  = Tensor::<TestBackend, 2>::from_floats([[1.0], [2.0], [5.0]], &device);
        let labels = Tensor::<TestBackend, 2>::from_floats([[0.0], [4.0], [2.0]], &device);

        let mse: Vec<f32> = per_task_mse(preds, labels, &partition)
            .into_data()
            .to_vec()
            .unwrap();
        // task 0: (1 + 4) / 2, task 1: 9 / 1
        assert_eq!(mse, vec![2.5, 9.0]);
    }

    #[test]
    fn test_squared_norm() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 3>::from_floats([[[1.0], [2.0]], [[-2.0], [0.0]]], &device);
        let n: f32 = squared_norm(t).into_scalar();
        assert_eq!(n, 9.0);
    }
}
