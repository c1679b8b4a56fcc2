// ============================================================
// Crate Error Type
// ============================================================
// Typed errors raised by the domain, data and ml layers.
// The CLI and application layers wrap these in anyhow so
// every failure reaches the user with its context chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HgnnError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    /// `line` is 1-based, matching what an editor shows.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid task partition: {0}")]
    InvalidPartition(String),

    #[error("task {task} ({size} instances) cannot be used: {reason}")]
    DegenerateTask {
        task:   usize,
        size:   usize,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training loss became non-finite at step {step}")]
    NonFiniteLoss { step: usize },

    #[error("tensor data error: {0}")]
    Tensor(String),
}

pub type Result<T> = std::result::Result<T, HgnnError>;
