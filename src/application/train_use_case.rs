// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration  (Layer 3 - domain)
//   Step 2: Seed the random generator
//   Step 3: Load the regression file     (Layer 4 - data)
//   Step 4: Stratified train/test split  (Layer 4 - data)
//   Step 5: Open the metrics CSV         (Layer 6 - infra)
//   Step 6: Run the training loop        (Layer 5 - ml)
//
// Every configuration error surfaces before a tensor exists.

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::data::{dataset::MultiTaskDataset, loader::RegressionFile, splitter::split_by_task};
use crate::domain::settings::{Activation, DeviceSelector, TrainSize};
use crate::domain::traits::RegressionSource;
use crate::error::HgnnError;
use crate::infra::metrics::MetricsLogger;
use crate::ml::evaluator::TaskErrors;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Missing fields in a
// JSON config file fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_file:            String,
    /// Below 1: share of every task; 1 or more: instances per task
    pub train_size:           f64,
    pub hidden_dim:           usize,
    /// Instances drawn from every task per step
    pub batch_size:           usize,
    pub reg_lambda:           f64,
    pub max_epoch:            usize,
    pub device:               DeviceSelector,
    pub activation:           Activation,
    pub attention_hidden_dim: usize,
    pub fusion_dim:           usize,
    /// Epoch e trains with learning_rate / (1 + e)
    pub learning_rate:        f64,
    pub eval_every:           usize,
    pub grad_clip:            Option<f32>,
    pub seed:                 Option<u64>,
    pub metrics_dir:          Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_file:            "data/sarcos_2000.txt".to_string(),
            train_size:           0.7,
            hidden_dim:           600,
            batch_size:           32,
            reg_lambda:           0.2,
            max_epoch:            200,
            device:               DeviceSelector::Cpu,
            activation:           Activation::Tanh,
            attention_hidden_dim: 16,
            fusion_dim:           8,
            learning_rate:        0.02,
            eval_every:           5,
            grad_clip:            None,
            seed:                 None,
            metrics_dir:          None,
        }
    }
}

impl TrainConfig {
    /// Load a JSON config file; absent keys keep their defaults.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{path}'"))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config file '{path}'"))
    }

    /// Check every field and resolve the train size mode.
    pub fn validate(&self) -> crate::error::Result<TrainSize> {
        let positive = [
            ("hidden_dim", self.hidden_dim),
            ("batch_size", self.batch_size),
            ("max_epoch", self.max_epoch),
            ("attention_hidden_dim", self.attention_hidden_dim),
            ("fusion_dim", self.fusion_dim),
            ("eval_every", self.eval_every),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(HgnnError::InvalidConfig(format!("{name} must be at least 1")));
        }
        if !self.reg_lambda.is_finite() || self.reg_lambda < 0.0 {
            return Err(HgnnError::InvalidConfig(format!(
                "reg_lambda must be a finite non-negative number, got {}",
                self.reg_lambda
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(HgnnError::InvalidConfig(format!(
                "learning_rate must be a finite positive number, got {}",
                self.learning_rate
            )));
        }
        if let Some(t) = self.grad_clip {
            if !t.is_finite() {
                return Err(HgnnError::InvalidConfig(format!("grad_clip must be finite, got {t}")));
            }
        }
        TrainSize::from_value(self.train_size)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline; returns the final test errors.
    pub fn execute(&self) -> Result<TaskErrors> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        let train_size = cfg.validate()?;

        // ── Step 2: Seed ──────────────────────────────────────────────────────
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        // ── Step 3: Load data ─────────────────────────────────────────────────
        let source = RegressionFile::new(&cfg.data_file);
        tracing::info!("Loading regression data from '{}'", source.describe());
        let table = source
            .load()
            .with_context(|| format!("Failed to load '{}'", source.describe()))?;
        let dataset = MultiTaskDataset::from_table(table)?;
        tracing::info!(
            "Loaded {} instances of dim {} across {} tasks",
            dataset.instances().len(),
            dataset.dim(),
            dataset.num_tasks()
        );

        // ── Step 4: Train / test split per task ───────────────────────────────
        let split = split_by_task(&dataset, train_size, &mut rng)?;
        tracing::info!(
            "Split: {} train {:?}, {} test {:?}",
            split.train.instances().len(),
            split.train.partition().sizes(),
            split.test.instances().len(),
            split.test.partition().sizes()
        );

        // ── Step 5: Metrics sink ──────────────────────────────────────────────
        let metrics = cfg
            .metrics_dir
            .as_ref()
            .map(|dir| MetricsLogger::new(dir.clone(), dataset.num_tasks()))
            .transpose()?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, &split, &mut rng, metrics.as_ref())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_setup() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.hidden_dim, 600);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.max_epoch, 200);
        assert_eq!(cfg.activation, Activation::Tanh);
        assert_eq!(cfg.validate().unwrap(), TrainSize::Fraction(0.7));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { train_size: 0.0, ..TrainConfig::default() },
            TrainConfig { train_size: 12.5, ..TrainConfig::default() },
            TrainConfig { reg_lambda: -1.0, ..TrainConfig::default() },
            TrainConfig { learning_rate: f64::NAN, ..TrainConfig::default() },
            TrainConfig { grad_clip: Some(f32::INFINITY), ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(HgnnError::InvalidConfig(_))), "{cfg:?}");
        }
        let per_task = TrainConfig { train_size: 50.0, ..TrainConfig::default() };
        assert_eq!(per_task.validate().unwrap(), TrainSize::PerTask(50));
    }

    #[test]
    fn test_json_config_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "hidden_dim": 64, "activation": "relu", "device": {{ "gpu": 1 }}, "grad_clip": 5.0 }}"#
        )
        .unwrap();

        let cfg = TrainConfig::from_json_file(&file.path().to_string_lossy()).unwrap();
        assert_eq!(cfg.hidden_dim, 64);
        assert_eq!(cfg.activation, Activation::Relu);
        assert_eq!(cfg.device, DeviceSelector::Gpu(1));
        assert_eq!(cfg.grad_clip, Some(5.0));
        assert_eq!(cfg.batch_size, 32);
    }

    #[test]
    fn test_execute_end_to_end() {
        // two tasks of 14 and 12 instances, dim 2
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2\n1,15,27").unwrap();
        let mut labels = Vec::new();
        for i in 0..26 {
            let x = i as f32 / 26.0;
            writeln!(file, "{x},{}", 1.0 - x).unwrap();
            labels.push(format!("{}", if i < 14 { 2.0 * x } else { -x }));
        }
        writeln!(file, "{}", labels.join(",")).unwrap();

        let cfg = TrainConfig {
            data_file:  file.path().to_string_lossy().into_owned(),
            hidden_dim: 6,
            batch_size: 4,
            max_epoch:  2,
            seed:       Some(11),
            ..TrainConfig::default()
        };
        let errors = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(errors.num_tasks(), 2);
        assert!(errors.is_finite());
    }

    #[test]
    fn test_execute_reports_missing_file() {
        let cfg = TrainConfig {
            data_file: "definitely/not/here.txt".to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("definitely/not/here.txt"));
    }
}
