// ============================================================
// Layer 4 — Regression File Loader
// ============================================================
// Reads the multi-task regression text format:
//
//   line 1        number of tasks
//   line 2        task boundary offsets, 1-indexed, comma-separated
//                 (num_tasks + 1 values)
//   lines 3..N-1  one instance per line, comma-separated features
//   line N        comma-separated labels, one per instance
//
// Example (two tasks of 2 and 1 instances, dim = 2):
//   2
//   1,3,4
//   0.5,1.0
//   0.1,0.2
//   3.0,4.0
//   1.5,0.7,2.2
//
// Any malformed token or count mismatch is an error carrying
// the offending line number. Nothing is partially recovered.

use std::{fs, path::PathBuf, str::FromStr};

use crate::domain::instance::RegressionTable;
use crate::domain::partition::TaskPartition;
use crate::domain::traits::RegressionSource;
use crate::error::{HgnnError, Result};

/// A regression data file on disk.
pub struct RegressionFile {
    path: PathBuf,
}

impl RegressionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegressionSource for RegressionFile {
    fn load(&self) -> Result<RegressionTable> {
        read_regression_data_from_file(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read and validate a regression data file.
pub fn read_regression_data_from_file(path: impl Into<PathBuf>) -> Result<RegressionTable> {
    let path = path.into();
    let contents = fs::read_to_string(&path).map_err(|source| HgnnError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let table = parse_regression_text(&contents)?;

    tracing::debug!(
        "Read '{}': {} tasks, {} instances, boundaries {:?}",
        path.display(),
        table.num_tasks(),
        table.labels.len(),
        table.partition.boundaries()
    );
    Ok(table)
}

/// Parse the file format from an in-memory string.
pub fn parse_regression_text(contents: &str) -> Result<RegressionTable> {
    let mut lines: Vec<&str> = contents.lines().collect();
    // Editors often leave a trailing newline or two
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() < 4 {
        return Err(HgnnError::Parse {
            line:    lines.len().max(1),
            message: format!(
                "expected at least 4 lines (task count, offsets, one instance, labels), found {}",
                lines.len()
            ),
        });
    }

    let num_tasks: usize = parse_token(lines[0].trim(), 1)?;

    let expected = num_tasks.checked_add(1).ok_or_else(|| HgnnError::Parse {
        line:    1,
        message: format!("task count {num_tasks} is out of range"),
    })?;

    let offsets: Vec<usize> = parse_row(lines[1], 2)?;
    if offsets.len() != expected {
        return Err(HgnnError::Parse {
            line:    2,
            message: format!(
                "{} tasks need {} boundary offsets, found {}",
                num_tasks,
                expected,
                offsets.len()
            ),
        });
    }
    let partition = TaskPartition::from_one_indexed(&offsets)?;

    let label_line = lines.len() - 1;
    let mut features: Vec<Vec<f32>> = Vec::with_capacity(label_line - 2);
    for (idx, line) in lines[2..label_line].iter().enumerate() {
        let line_no = idx + 3;
        let row: Vec<f32> = parse_row(line, line_no)?;
        if let Some(first) = features.first() {
            if row.len() != first.len() {
                return Err(HgnnError::Parse {
                    line:    line_no,
                    message: format!("expected {} features, found {}", first.len(), row.len()),
                });
            }
        }
        features.push(row);
    }

    let labels: Vec<f32> = parse_row(lines[label_line], label_line + 1)?;
    if labels.len() != features.len() {
        return Err(HgnnError::Parse {
            line:    label_line + 1,
            message: format!(
                "{} instances but {} labels",
                features.len(),
                labels.len()
            ),
        });
    }
    if partition.total() != features.len() {
        return Err(HgnnError::InvalidPartition(format!(
            "boundaries cover {} instances but the file has {}",
            partition.total(),
            features.len()
        )));
    }

    Ok(RegressionTable { features, labels, partition })
}

fn parse_row<T: FromStr>(line: &str, line_no: usize) -> Result<Vec<T>> {
    line.split(',')
        .map(|token| parse_token(token.trim(), line_no))
        .collect()
}

fn parse_token<T: FromStr>(token: &str, line_no: usize) -> Result<T> {
    token.parse::<T>().map_err(|_| HgnnError::Parse {
        line:    line_no,
        message: format!("cannot parse '{token}'"),
    })
}
