// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and delegates all
// work to Layer 2 (application). This is the only layer that
// prints results for the user.
//
//   1. `train`   → trains the model and prints test errors
//   2. `inspect` → validates a data file and prints its layout

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;

#[derive(Parser, Debug)]
#[command(
    name = "hgnn-mtl",
    version = "0.1.0",
    about = "Hierarchical graph-attention multi-task regression."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let config = match args.config.clone() {
        Some(path) => {
            tracing::info!("Reading training configuration from '{}'", path);
            TrainConfig::from_json_file(&path)?
        }
        None => args.into(),
    };
    tracing::info!("Starting training on '{}' ({})", config.data_file, config.device);

    let errors = TrainUseCase::new(config).execute()?;

    for (task, error) in errors.per_task.iter().enumerate() {
        println!("task {task}: test_error={error}");
    }
    println!("final test_errors={}", errors.mean);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let summary = InspectUseCase::new(args.data_file, args.train_size).execute()?;

    println!("file:      {}", summary.source);
    println!("tasks:     {}", summary.num_tasks);
    println!("instances: {}", summary.total);
    println!("dimension: {}", summary.dim);
    for task in &summary.tasks {
        match task.split {
            Some((train, test)) => println!(
                "task {:>3}: {:>6} instances, label mean {:>10.4}, train {train} / test {test}",
                task.task, task.size, task.label_mean
            ),
            None => println!(
                "task {:>3}: {:>6} instances, label mean {:>10.4}",
                task.task, task.size, task.label_mean
            ),
        }
    }
    Ok(())
}
