// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `inspect`
// and all their configurable flags.
//
// Activation and device flags are parsed through their FromStr
// impls, so `--activation 2` and `--activation relu` both work,
// as do `--device cpu`, `--device gpu` and `--device gpu:1`.

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::settings::{Activation, DeviceSelector};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the hierarchical multi-task regressor and report test errors
    Train(TrainArgs),

    /// Validate a data file and print per-task statistics
    Inspect(InspectArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON file with a full training configuration.
    /// When given, the remaining flags are ignored.
    #[arg(long)]
    pub config: Option<String>,

    /// Multi-task regression data file
    #[arg(long, default_value = "data/sarcos_2000.txt")]
    pub data_file: String,

    /// Below 1: share of every task used for training.
    /// 1 or more: training instances per task
    #[arg(long, default_value_t = 0.7)]
    pub train_size: f64,

    /// Width of the shared instance encoder
    #[arg(long, default_value_t = 600)]
    pub hidden_dim: usize,

    /// Instances drawn from every task per step
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Weight of the L2 penalty on encoder and head weights
    #[arg(long, default_value_t = 0.2)]
    pub reg_lambda: f64,

    #[arg(long, default_value_t = 200)]
    pub max_epoch: usize,

    /// cpu, gpu or gpu:N
    #[arg(long, default_value = "cpu")]
    pub device: DeviceSelector,

    /// tanh, relu, elu, identity (or 1, 2, 3, other)
    #[arg(long, default_value = "tanh")]
    pub activation: Activation,

    /// Width of the first task-level attention projection
    #[arg(long, default_value_t = 16)]
    pub attention_hidden_dim: usize,

    /// Width of the task embedding appended to every instance
    #[arg(long, default_value_t = 8)]
    pub fusion_dim: usize,

    /// Base learning rate; epoch e uses lr / (1 + e)
    #[arg(long, default_value_t = 0.02)]
    pub learning_rate: f64,

    /// Evaluate on the test set every N epochs
    #[arg(long, default_value_t = 5)]
    pub eval_every: usize,

    /// Clip every gradient component to [-|t|, |t|]
    #[arg(long, allow_hyphen_values = true)]
    pub grad_clip: Option<f32>,

    /// Seed for the split, the sampler and initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for metrics.csv
    #[arg(long)]
    pub metrics_dir: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_file:            a.data_file,
            train_size:           a.train_size,
            hidden_dim:           a.hidden_dim,
            batch_size:           a.batch_size,
            reg_lambda:           a.reg_lambda,
            max_epoch:            a.max_epoch,
            device:               a.device,
            activation:           a.activation,
            attention_hidden_dim: a.attention_hidden_dim,
            fusion_dim:           a.fusion_dim,
            learning_rate:        a.learning_rate,
            eval_every:           a.eval_every,
            grad_clip:            a.grad_clip,
            seed:                 a.seed,
            metrics_dir:          a.metrics_dir,
        }
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Multi-task regression data file
    #[arg(long, default_value = "data/sarcos_2000.txt")]
    pub data_file: String,

    /// Also show the train/test counts this train size would give
    #[arg(long)]
    pub train_size: Option<f64>,
}
