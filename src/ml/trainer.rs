// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Step-based training with task-balanced batches and Adam.
//
//   INIT      model, optimiser, sampler, full train/test tensors
//   repeat steps_per_epoch * max_epoch times:
//     SAMPLE    batch_size instances from every task
//     FORWARD   objective = Σ per-task MSE + λ · L2
//     BACKWARD  gradients, optional value clipping, Adam step
//     EVAL      on the first step of every eval_every-th epoch
//   TERMINATE one more evaluation if the last one predates the
//             final parameters
//
// Burn notes:
//   - Training runs on an AutodiffBackend
//   - model.valid() returns the model on B::InnerBackend, so the
//     evaluation tensors are built on the inner backend as well
//   - The optimiser consumes the model and hands back the update

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TaskBatcher, sampler::TaskBalancedSampler, splitter::DataSplit};
use crate::domain::partition::TaskPartition;
use crate::domain::settings::DeviceSelector;
use crate::error::HgnnError;
use crate::infra::metrics::{EvalMetrics, MetricsLogger};
use crate::ml::evaluator::{evaluate, EvaluationSet, TaskErrors};
use crate::ml::model::{HgnnConfig, HgnnModel};

type CpuBackend = Autodiff<NdArray>;
type GpuBackend = Autodiff<Wgpu>;

// ─── Schedule ─────────────────────────────────────────────────────────────────
/// Step counting shared by the loop and its tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSchedule {
    pub steps_per_epoch: usize,
    pub max_epoch:       usize,
    pub eval_every:      usize,
}

impl TrainingSchedule {
    /// One epoch = enough balanced batches to cover the train set once.
    pub fn new(train_total: usize, batch_size: usize, num_tasks: usize, max_epoch: usize, eval_every: usize) -> Self {
        let per_step        = (batch_size * num_tasks).max(1);
        let steps_per_epoch = train_total.div_ceil(per_step).max(1);
        Self { steps_per_epoch, max_epoch, eval_every: eval_every.max(1) }
    }

    pub fn total_steps(&self) -> usize {
        self.steps_per_epoch * self.max_epoch
    }

    pub fn epoch_of(&self, step: usize) -> usize {
        step / self.steps_per_epoch
    }

    pub fn is_eval_step(&self, step: usize) -> bool {
        step % self.steps_per_epoch == 0 && self.epoch_of(step) % self.eval_every == 0
    }

    /// base / (1 + epoch)
    pub fn learning_rate(&self, base: f64, epoch: usize) -> f64 {
        base / (1.0 + epoch as f64)
    }
}

/// Value clipping to [-|t|, |t|], whatever the sign of the threshold.
pub fn gradient_clipping(threshold: Option<f32>) -> Option<GradientClippingConfig> {
    threshold.map(|t| GradientClippingConfig::Value(t.abs()))
}

// ─── Entry point ──────────────────────────────────────────────────────────────
pub fn run_training(
    cfg:     &TrainConfig,
    split:   &DataSplit,
    rng:     &mut StdRng,
    metrics: Option<&MetricsLogger>,
) -> Result<TaskErrors> {
    match cfg.device {
        DeviceSelector::Cpu => {
            let device = NdArrayDevice::Cpu;
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<CpuBackend>(cfg, split, rng, metrics, device)
        }
        DeviceSelector::Gpu(index) => {
            let device = WgpuDevice::DiscreteGpu(index);
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<GpuBackend>(cfg, split, rng, metrics, device)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    split:   &DataSplit,
    rng:     &mut StdRng,
    metrics: Option<&MetricsLogger>,
    device:  B::Device,
) -> Result<TaskErrors> {
    let num_tasks = split.train.num_tasks();

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = HgnnConfig::new(split.train.dim(), cfg.hidden_dim, num_tasks)
        .with_attention_hidden_dim(cfg.attention_hidden_dim)
        .with_fusion_dim(cfg.fusion_dim);
    let mut model: HgnnModel<B> = model_cfg.init(rng, &device);
    tracing::info!(
        "Model ready: {} tasks, dim={}, hidden={}, head width={}",
        num_tasks,
        split.train.dim(),
        cfg.hidden_dim,
        model_cfg.head_width()
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_grad_clipping(gradient_clipping(cfg.grad_clip));
    let mut optim = optim_cfg.init();

    // ── Sampling (AutodiffBackend) ────────────────────────────────────────────
    // Batches are laid out task after task, batch_size rows each
    let batch_partition = TaskPartition::uniform(num_tasks, cfg.batch_size)?;
    let mut sampler     = TaskBalancedSampler::new(&split.train, cfg.batch_size, StdRng::seed_from_u64(rng.gen()));
    let batcher         = TaskBatcher::<B>::new(device.clone());

    // ── Evaluation tensors (InnerBackend) ─────────────────────────────────────
    let train_eval = EvaluationSet::<B::InnerBackend>::from_dataset(&split.train, &device);
    let test_eval  = EvaluationSet::<B::InnerBackend>::from_dataset(&split.test, &device);

    let schedule = TrainingSchedule::new(
        split.train.len(),
        cfg.batch_size,
        num_tasks,
        cfg.max_epoch,
        cfg.eval_every,
    );
    tracing::info!(
        "Training for {} epochs x {} steps (lr={}, clip={:?})",
        schedule.max_epoch,
        schedule.steps_per_epoch,
        cfg.learning_rate,
        cfg.grad_clip
    );

    let mut latest: Option<(usize, TaskErrors)> = None;
    let mut best_mean      = f64::INFINITY;
    let mut last_objective = f64::NAN;

    // ── Step loop ─────────────────────────────────────────────────────────────
    for step in 0..schedule.total_steps() {
        let epoch = schedule.epoch_of(step);
        let batch = batcher.batch(sampler.next_batch());

        let output    = model.forward_loss(&batch, &batch_partition, cfg.activation, cfg.reg_lambda);
        let objective: f64 = output.objective.clone().into_scalar().elem::<f64>();
        if !objective.is_finite() {
            return Err(HgnnError::NonFiniteLoss { step }.into());
        }
        last_objective = objective;

        // Backward pass + Adam update
        let grads = output.objective.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(schedule.learning_rate(cfg.learning_rate, epoch), model, grads);

        if schedule.is_eval_step(step) {
            let errors = evaluate(&model.valid(), cfg.activation, &train_eval, &test_eval)?;
            println!("epoch={}, test_errors={}", epoch, errors.mean);
            report(metrics, EvalMetrics::new(epoch, step, objective, errors.clone()), &mut best_mean)?;
            latest = Some((step, errors));
        }
    }

    // ── Final evaluation ──────────────────────────────────────────────────────
    let last_step = schedule.total_steps().checked_sub(1);
    let errors = match latest {
        Some((step, errors)) if Some(step) == last_step => errors,
        _ => {
            let step   = last_step.unwrap_or(0);
            let epoch  = schedule.epoch_of(step);
            let errors = evaluate(&model.valid(), cfg.activation, &train_eval, &test_eval)?;
            report(metrics, EvalMetrics::new(epoch, step, last_objective, errors.clone()), &mut best_mean)?;
            errors
        }
    };

    tracing::info!("Training complete! Per-task test errors: {:?}", errors.per_task);
    Ok(errors)
}

fn report(metrics: Option<&MetricsLogger>, m: EvalMetrics, best_mean: &mut f64) -> Result<()> {
    if m.is_improvement(*best_mean) {
        *best_mean = m.errors.mean;
        tracing::info!("epoch {}: new best mean test error {:.6}", m.epoch, m.errors.mean);
    } else {
        tracing::info!("epoch {}: mean test error {:.6}", m.epoch, m.errors.mean);
    }
    if let Some(logger) = metrics {
        logger.log(&m)?;
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::MultiTaskDataset;
    use crate::data::splitter::split_by_task;
    use crate::domain::instance::RegressionTable;
    use crate::domain::settings::TrainSize;
    use burn::module::Param;
    use burn::optim::SgdConfig;

    fn two_task_data() -> MultiTaskDataset {
        let partition = TaskPartition::from_sizes(&[20, 15]).unwrap();
        let features: Vec<Vec<f32>> = (0..35)
            .map(|i| {
                let x = i as f32 / 35.0;
                vec![x, (3.0 * x).sin(), 1.0 - x * x]
            })
            .collect();
        let labels = features
            .iter()
            .enumerate()
            .map(|(i, f)| if i < 20 { f[0] + 0.5 * f[1] } else { f[2] - f[0] })
            .collect();
        MultiTaskDataset::from_table(RegressionTable { features, labels, partition }).unwrap()
    }

    #[test]
    fn test_schedule_counts() {
        let s = TrainingSchedule::new(25, 4, 2, 3, 5);
        assert_eq!(s.steps_per_epoch, 4);
        assert_eq!(s.total_steps(), 12);
        assert_eq!(s.epoch_of(7), 1);
        assert!(s.is_eval_step(0));
        assert!(!s.is_eval_step(4));
        assert!(!s.is_eval_step(1));

        let every = TrainingSchedule::new(8, 4, 2, 3, 1);
        assert_eq!(every.steps_per_epoch, 1);
        assert!((0..3).all(|step| every.is_eval_step(step)));
    }

    #[test]
    fn test_learning_rate_decay() {
        let s = TrainingSchedule::new(10, 1, 1, 10, 5);
        assert_eq!(s.learning_rate(0.02, 0), 0.02);
        assert_eq!(s.learning_rate(0.02, 1), 0.01);
        assert!((s.learning_rate(0.02, 4) - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_clipping_uses_absolute_threshold() {
        assert!(gradient_clipping(None).is_none());
        match gradient_clipping(Some(-5.0)) {
            Some(GradientClippingConfig::Value(t)) => assert_eq!(t, 5.0),
            _ => panic!("unexpected clipping config"),
        }
    }

    #[derive(Module, Debug)]
    struct Probe<B: Backend> {
        weights: Param<Tensor<B, 1>>,
    }

    #[test]
    fn test_clipped_sgd_step_moves_by_clipped_gradient() {
        type B = Autodiff<NdArray>;
        let device = Default::default();
        let probe = Probe::<B> {
            weights: Param::from_tensor(Tensor::zeros([4], &device)),
        };

        // d/dw (w · g) = g
        let g    = Tensor::<B, 1>::from_floats([100.0, -100.0, 2.0, -7.0], &device);
        let loss = (probe.weights.val() * g).sum();

        let grads     = GradientsParams::from_grads(loss.backward(), &probe);
        let mut optim = SgdConfig::new()
            .with_gradient_clipping(gradient_clipping(Some(5.0)))
            .init();
        let probe = optim.step(1.0, probe, grads);

        let w: Vec<f32> = probe.weights.val().into_data().to_vec().unwrap();
        assert_eq!(w, vec![-5.0, 5.0, -2.0, 5.0]);
    }

    #[test]
    fn test_end_to_end_two_tasks() {
        let mut rng = StdRng::seed_from_u64(42);
        let split   = split_by_task(&two_task_data(), TrainSize::Fraction(0.7), &mut rng).unwrap();
        assert_eq!(split.train.num_tasks(), 2);

        let cfg = TrainConfig {
            hidden_dim:           8,
            batch_size:           4,
            max_epoch:            1,
            attention_hidden_dim: 4,
            fusion_dim:           3,
            ..TrainConfig::default()
        };

        let errors = run_training(&cfg, &split, &mut rng, None).unwrap();
        assert_eq!(errors.num_tasks(), 2);
        assert_eq!(errors.as_row().len(), 3);
        assert!(errors.is_finite());
        assert!(errors.mean >= 0.0);
    }

    #[test]
    fn test_metrics_rows_are_written() {
        let dir     = tempfile::tempdir().unwrap();
        let logger  = MetricsLogger::new(dir.path().to_string_lossy(), 2).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let split   = split_by_task(&two_task_data(), TrainSize::Fraction(0.5), &mut rng).unwrap();

        let cfg = TrainConfig {
            hidden_dim: 6,
            batch_size: 5,
            max_epoch:  2,
            eval_every: 1,
            grad_clip:  Some(5.0),
            ..TrainConfig::default()
        };
        run_training(&cfg, &split, &mut rng, Some(&logger)).unwrap();

        // header, one row per epoch, plus the final evaluation
        let text = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 4);
    }
}
