// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, built on clap.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   - trains the model and exports the traced artifact
//   2. `predict` - runs an exported artifact on one feature row
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::domain::traits::TorquePredictor;

#[derive(Parser, Debug)]
#[command(
    name = "traction-mlp",
    version = "0.1.0",
    about = "Train a traction-control torque model and export it for a native runtime."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.data_path);

    let report = TrainUseCase::new(args.into()).execute()?;

    if report.stopped_early {
        println!("Early stopping triggered after {} epochs.", report.epochs_run);
    }
    match report.best_epoch {
        Some(epoch) => println!(
            "Best validation loss {:.4} at epoch {}.",
            report.best_val_loss, epoch
        ),
        None => println!("Validation loss never improved; exported the last model."),
    }
    println!("Traced model saved to {}", report.export_path.display());
    println!("Scalers saved to {}", report.scaler_path.display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let predictor = PredictUseCase::new(Path::new(&args.model))?;
    let command   = predictor.predict(&args.features)?;

    println!(
        "drive_torque={:.3} N·m  brake_torque={:.3} N·m",
        command.drive_torque, command.brake_torque
    );
    Ok(())
}
