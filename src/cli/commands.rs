// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`,
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;
use crate::ml::{device::BackendKind, loss::LossKind};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the torque model on simulation data and export it
    Train(TrainArgs),

    /// Predict torque commands for one wheel state with an exported model
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file with feature and target columns
    #[arg(long, default_value = "./datasets/simulation_data_cleaned.csv")]
    pub data_path: String,

    /// Directory for the checkpoint, config and metrics
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Where to write the traced model (scalers go next to it)
    #[arg(long, default_value = "./mlp_model_traced.json")]
    pub export_path: String,

    /// Width of both hidden layers
    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Maximum number of epochs
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of samples used for training; the rest validates
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Learning-rate multiplier on a validation plateau
    #[arg(long, default_value_t = 0.2)]
    pub lr_factor: f64,

    /// Plateau epochs tolerated before the learning rate is reduced
    #[arg(long, default_value_t = 2)]
    pub lr_patience: usize,

    /// Keep the learning rate fixed
    #[arg(long)]
    pub no_scheduler: bool,

    /// Loss function: mse or mae
    #[arg(long, default_value = "mse")]
    pub loss: LossKind,

    /// Compute backend: ndarray (CPU) or wgpu (GPU)
    #[arg(long, default_value = "ndarray")]
    pub backend: BackendKind,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:      a.data_path,
            artifact_dir:   a.artifact_dir,
            export_path:    a.export_path,
            hidden_size:    a.hidden_size,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            patience:       a.patience,
            lr:             a.lr,
            seed:           a.seed,
            train_fraction: a.train_fraction,
            lr_factor:      a.lr_factor,
            lr_patience:    a.lr_patience,
            use_scheduler:  !a.no_scheduler,
            loss:           a.loss,
            backend:        a.backend,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Traced model written by `train`
    #[arg(long, default_value = "./mlp_model_traced.json")]
    pub model: String,

    /// The eight feature values, comma separated, in column order:
    /// slip_ratio, angular_velocity, linear_speed, current_brake_torque,
    /// current_drive_torque, speed_to_velocity_ratio, excess_drive_torque,
    /// slip_deviation
    #[arg(long, value_delimiter = ',', num_args = 1.., allow_negative_numbers = true)]
    pub features: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["traction-mlp", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();

        assert_eq!(cfg.data_path, def.data_path);
        assert_eq!(cfg.export_path, def.export_path);
        assert_eq!(cfg.hidden_size, 128);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.epochs, 50);
        assert_eq!(cfg.patience, 5);
        assert_eq!(cfg.seed, 42);
        assert!(cfg.use_scheduler);
        assert_eq!(cfg.loss, LossKind::Mse);
        assert_eq!(cfg.backend, BackendKind::Ndarray);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "traction-mlp", "train", "--loss", "mae", "--backend", "wgpu", "--no-scheduler",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.loss, LossKind::Mae);
        assert_eq!(cfg.backend, BackendKind::Wgpu);
        assert!(!cfg.use_scheduler);
    }

    #[test]
    fn test_predict_parses_feature_list() {
        let cli = Cli::try_parse_from([
            "traction-mlp", "predict", "--features", "0.1,20,5,-10,50,0.25,3,0.02",
        ]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        assert_eq!(args.features, vec![0.1, 20.0, 5.0, -10.0, 50.0, 0.25, 3.0, 0.02]);
    }
}
