// ============================================================
// Layer 3 — Typed Run Settings
// ============================================================
// Choices that used to travel as magic integers are plain
// enums here, parsed once when the configuration is loaded:
//
//   Activation     → nonlinearity of the instance encoder
//   DeviceSelector → CPU or the n-th GPU
//   TrainSize      → per-task fraction or absolute count
//
// FromStr impls double as clap value parsers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::HgnnError;

// ─── Activation ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Tanh,
    Relu,
    Elu,
    Identity,
}

impl Activation {
    /// Legacy integer codes: 1 = tanh, 2 = relu, 3 = elu, anything else = identity.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Activation::Tanh,
            2 => Activation::Relu,
            3 => Activation::Elu,
            _ => Activation::Identity,
        }
    }
}

impl FromStr for Activation {
    type Err = HgnnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Ok(code) = s.parse::<i64>() {
            return Ok(Self::from_code(code));
        }
        match s.as_str() {
            "tanh"             => Ok(Activation::Tanh),
            "relu"             => Ok(Activation::Relu),
            "elu"              => Ok(Activation::Elu),
            "identity" | "none" => Ok(Activation::Identity),
            other => Err(HgnnError::InvalidConfig(format!(
                "unknown activation '{other}' (expected tanh, relu, elu or identity)"
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Tanh     => "tanh",
            Activation::Relu     => "relu",
            Activation::Elu      => "elu",
            Activation::Identity => "identity",
        };
        f.write_str(name)
    }
}

// ─── DeviceSelector ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSelector {
    #[default]
    Cpu,
    /// Index of the discrete GPU to run on
    Gpu(usize),
}

impl FromStr for DeviceSelector {
    type Err = HgnnError;

    /// Accepts `cpu`, `gpu` (same as `gpu:0`) and `gpu:N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.split_once(':') {
            None if s == "cpu" => Ok(DeviceSelector::Cpu),
            None if s == "gpu" => Ok(DeviceSelector::Gpu(0)),
            Some(("gpu", index)) => index
                .parse::<usize>()
                .map(DeviceSelector::Gpu)
                .map_err(|_| HgnnError::InvalidConfig(format!("invalid GPU index '{index}'"))),
            _ => Err(HgnnError::InvalidConfig(format!(
                "unknown device '{s}' (expected cpu, gpu or gpu:N)"
            ))),
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Cpu        => f.write_str("cpu"),
            DeviceSelector::Gpu(index) => write!(f, "gpu:{index}"),
        }
    }
}

// ─── TrainSize ────────────────────────────────────────────────────────────────
/// How many instances of each task go to the training set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainSize {
    /// Share of every task, in (0, 1); rounded up per task
    Fraction(f64),
    /// Same absolute count for every task, clamped to [1, task_size - 10]
    PerTask(usize),
}

impl TrainSize {
    /// Values below 1 are fractions, values of 1 or more are counts.
    pub fn from_value(value: f64) -> Result<Self, HgnnError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(HgnnError::InvalidConfig(format!(
                "train size must be a positive number, got {value}"
            )));
        }
        if value < 1.0 {
            return Ok(TrainSize::Fraction(value));
        }
        if value.fract() != 0.0 {
            return Err(HgnnError::InvalidConfig(format!(
                "train size {value} is neither a fraction below 1 nor a whole count"
            )));
        }
        Ok(TrainSize::PerTask(value as usize))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_codes() {
        assert_eq!(Activation::from_code(1), Activation::Tanh);
        assert_eq!(Activation::from_code(2), Activation::Relu);
        assert_eq!(Activation::from_code(3), Activation::Elu);
        assert_eq!(Activation::from_code(0), Activation::Identity);
        assert_eq!(Activation::from_code(7), Activation::Identity);
    }

    #[test]
    fn test_activation_parse() {
        assert_eq!("ReLU".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("3".parse::<Activation>().unwrap(), Activation::Elu);
        assert_eq!("none".parse::<Activation>().unwrap(), Activation::Identity);
        assert!("sigmoid".parse::<Activation>().is_err());
    }

    #[test]
    fn test_device_parse() {
        assert_eq!("cpu".parse::<DeviceSelector>().unwrap(), DeviceSelector::Cpu);
        assert_eq!("gpu".parse::<DeviceSelector>().unwrap(), DeviceSelector::Gpu(0));
        assert_eq!("GPU:2".parse::<DeviceSelector>().unwrap(), DeviceSelector::Gpu(2));
        assert!("gpu:x".parse::<DeviceSelector>().is_err());
        assert!("tpu".parse::<DeviceSelector>().is_err());
        assert_eq!(DeviceSelector::Gpu(3).to_string(), "gpu:3");
    }

    #[test]
    fn test_train_size_modes() {
        assert_eq!(TrainSize::from_value(0.7).unwrap(), TrainSize::Fraction(0.7));
        assert_eq!(TrainSize::from_value(1.0).unwrap(), TrainSize::PerTask(1));
        assert_eq!(TrainSize::from_value(25.0).unwrap(), TrainSize::PerTask(25));
        assert!(TrainSize::from_value(0.0).is_err());
        assert!(TrainSize::from_value(-0.5).is_err());
        assert!(TrainSize::from_value(2.5).is_err());
        assert!(TrainSize::from_value(f64::NAN).is_err());
    }
}
