use burn::{module::Param, prelude::*, tensor::activation};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::data::batcher::RegressionBatch;
use crate::domain::partition::TaskPartition;
use crate::domain::settings::Activation;
use crate::ml::attention::attend;
use crate::ml::loss::{per_task_mse, squared_norm};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; adding them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct HgnnConfig {
    pub input_dim:  usize,
    pub hidden_dim: usize,
    pub num_tasks:  usize,
    /// Width of the first task-level attention projection
    #[config(default = 16)]
    pub attention_hidden_dim: usize,
    /// Width of the cross-task embedding appended to every instance
    #[config(default = 8)]
    pub fusion_dim: usize,
    #[config(default = 0.1)]
    pub init_std: f64,
}

impl HgnnConfig {
    /// Input width of every regression head.
    pub fn head_width(&self) -> usize {
        self.hidden_dim + self.fusion_dim
    }

    pub fn init<B: Backend, R: Rng + ?Sized>(&self, rng: &mut R, device: &B::Device) -> HgnnModel<B> {
        let std = self.init_std;
        HgnnModel {
            input_weights:         init_param(rng, [self.input_dim, self.hidden_dim], std, device),
            hidden_weights:        init_param(rng, [self.hidden_dim, self.hidden_dim], std, device),
            task_attention_first:  init_param(rng, [self.hidden_dim, self.attention_hidden_dim], std, device),
            task_attention_second: init_param(rng, [self.attention_hidden_dim, self.fusion_dim], std, device),
            head_weights:          init_param(rng, [self.num_tasks, self.head_width(), 1], std, device),
        }
    }
}

/// Normal(0, std) samples, redrawn while they fall beyond two standard deviations.
pub fn truncated_normal<R: Rng + ?Sized>(rng: &mut R, count: usize, std: f64) -> Vec<f32> {
    let mut values = Vec::with_capacity(count);
    while values.len() < count {
        let z: f64 = StandardNormal.sample(&mut *rng);
        if z.abs() <= 2.0 {
            values.push((z * std) as f32);
        }
    }
    values
}

fn init_param<B: Backend, R: Rng + ?Sized, const D: usize>(
    rng:    &mut R,
    shape:  [usize; D],
    std:    f64,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let values = truncated_normal(rng, shape.iter().product(), std);
    Param::from_tensor(Tensor::from_data(TensorData::new(values, shape), device))
}

/// Nonlinearity of the instance encoder.
pub fn activate<B: Backend, const D: usize>(x: Tensor<B, D>, choice: Activation) -> Tensor<B, D> {
    match choice {
        Activation::Tanh     => activation::tanh(x),
        Activation::Relu     => activation::relu(x),
        Activation::Elu      => {
            // exp of the clamped input so the unused branch never overflows
            let negative = x.clone().lower_equal_elem(0.0);
            let decayed  = x.clone().clamp_max(0.0).exp().sub_scalar(1.0);
            x.mask_where(negative, decayed)
        }
        Activation::Identity => x,
    }
}

/// Shared encoder, hierarchical attention and one linear head per task.
#[derive(Module, Debug)]
pub struct HgnnModel<B: Backend> {
    /// [dim, hidden_dim]
    pub input_weights:         Param<Tensor<B, 2>>,
    /// [hidden_dim, hidden_dim]; instance-level attention projection
    pub hidden_weights:        Param<Tensor<B, 2>>,
    /// [hidden_dim, attention_hidden_dim]
    pub task_attention_first:  Param<Tensor<B, 2>>,
    /// [attention_hidden_dim, fusion_dim]
    pub task_attention_second: Param<Tensor<B, 2>>,
    /// [num_tasks, hidden_dim + fusion_dim, 1]
    pub head_weights:          Param<Tensor<B, 3>>,
}

pub struct RegressionOutput<B: Backend> {
    /// Data loss plus the L2 penalty; what the optimizer minimises
    pub objective:   Tensor<B, 1>,
    /// [num_tasks, 1]
    pub task_losses: Tensor<B, 2>,
    /// [N, 1]
    pub predictions: Tensor<B, 2>,
}

impl<B: Backend> HgnnModel<B> {
    pub fn num_tasks(&self) -> usize {
        self.head_weights.val().dims()[0]
    }

    /// activation(X · W_in): [N, dim] → [N, hidden_dim]
    pub fn encode_instances(&self, features: Tensor<B, 2>, choice: Activation) -> Tensor<B, 2> {
        activate(features.matmul(self.input_weights.val()), choice)
    }

    /// Cross-task embedding of every task: [N, hidden_dim] → [T, fusion_dim].
    ///
    /// Instance attention runs inside each task block and is max-pooled
    /// into one row per task; two task-level attention stages follow.
    pub fn task_embeddings(&self, hidden: Tensor<B, 2>, partition: &TaskPartition) -> Tensor<B, 2> {
        let [_, width] = hidden.dims();
        let hidden_weights = self.hidden_weights.val();

        let pooled: Vec<Tensor<B, 2>> = (0..partition.num_tasks())
            .map(|task| {
                let block = hidden.clone().slice([partition.range(task), 0..width]);
                // pooled along the last axis; the CPU backend only scatters there on backward
                attend(hidden_weights.clone(), block)
                    .transpose()
                    .max_dim(1)
                    .transpose()
            })
            .collect();

        let tasks = Tensor::cat(pooled, 0);
        let tasks = attend(self.task_attention_first.val(), tasks);
        attend(self.task_attention_second.val(), tasks)
    }

    /// Append each instance's task embedding: → [N, hidden_dim + fusion_dim].
    pub fn fuse(
        &self,
        hidden:          Tensor<B, 2>,
        task_embeddings: Tensor<B, 2>,
        task_ids:        Tensor<B, 1, Int>,
    ) -> Tensor<B, 2> {
        Tensor::cat(vec![hidden, task_embeddings.select(0, task_ids)], 1)
    }

    /// Each row through its own task's head (no bias): → [N, 1].
    pub fn predict(&self, fused: Tensor<B, 2>, task_ids: Tensor<B, 1, Int>) -> Tensor<B, 2> {
        let [num_tasks, width, _] = self.head_weights.val().dims();
        let heads = self
            .head_weights
            .val()
            .reshape([num_tasks, width])
            .select(0, task_ids);
        (fused * heads).sum_dim(1)
    }

    /// Predictions for rows grouped by task according to `partition`.
    pub fn forward(
        &self,
        features:  Tensor<B, 2>,
        task_ids:  Tensor<B, 1, Int>,
        partition: &TaskPartition,
        choice:    Activation,
    ) -> Tensor<B, 2> {
        let hidden = self.encode_instances(features, choice);
        let tasks  = self.task_embeddings(hidden.clone(), partition);
        let fused  = self.fuse(hidden, tasks, task_ids.clone());
        self.predict(fused, task_ids)
    }

    /// ‖W_in‖² + ‖W_heads‖²
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        squared_norm(self.input_weights.val()) + squared_norm(self.head_weights.val())
    }

    pub fn forward_loss(
        &self,
        batch:      &RegressionBatch<B>,
        partition:  &TaskPartition,
        choice:     Activation,
        reg_lambda: f64,
    ) -> RegressionOutput<B> {
        let predictions = self.forward(
            batch.features.clone(),
            batch.task_ids.clone(),
            partition,
            choice,
        );
        let task_losses = per_task_mse(predictions.clone(), batch.labels.clone(), partition);
        let objective   = task_losses.clone().sum() + self.l2_penalty().mul_scalar(reg_lambda);
        RegressionOutput { objective, task_losses, predictions }
    }
}
