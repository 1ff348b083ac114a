// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Seed backend and host RNGs   (Layer 5 - ml)
//   Step 2: Load the simulation CSV      (Layer 4 - data)
//   Step 3: Fit feature/target scalers   (Layer 4 - data)
//   Step 4: Train / validation split     (Layer 4 - data)
//   Step 5: Build datasets and loaders   (Layer 4/5)
//   Step 6: Save config                  (Layer 6 - infra)
//   Step 7: Run training loop            (Layer 5 - ml)
//   Step 8: Save best checkpoint         (Layer 6 - infra)
//   Step 9: Export traced model + scalers (Layer 6 - infra)
//
// The pipeline is generic over the autodiff backend; execute()
// picks the concrete backend from the config.

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::TractionDataset,
    loader::CsvLoader,
    scaler::{MinMaxScaler, ScalerBundle},
    splitter::split_train_val,
};
use crate::domain::{
    sample::{FEATURE_COUNT, TARGET_COUNT},
    traits::SampleSource,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    export::{export_traced, scaler_path},
    metrics::MetricsLogger,
};
use crate::ml::{
    device::{seed_everything, BackendKind},
    loss::LossKind,
    model::MlpConfig,
    scheduler::PlateauConfig,
    trainer::{build_loaders, default_optimizer, train_with_early_stopping, EarlyStoppingOptions},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:      String,
    pub artifact_dir:   String,
    pub export_path:    String,
    pub hidden_size:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub patience:       usize,
    pub lr:             f64,
    pub seed:           u64,
    pub train_fraction: f64,
    pub lr_factor:      f64,
    pub lr_patience:    usize,
    pub use_scheduler:  bool,
    pub loss:           LossKind,
    pub backend:        BackendKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:      "./datasets/simulation_data_cleaned.csv".to_string(),
            artifact_dir:   "artifacts".to_string(),
            export_path:    "./mlp_model_traced.json".to_string(),
            hidden_size:    128,
            batch_size:     64,
            epochs:         50,
            patience:       5,
            lr:             1e-3,
            seed:           42,
            train_fraction: 0.8,
            lr_factor:      0.2,
            lr_patience:    2,
            use_scheduler:  true,
            loss:           LossKind::Mse,
            backend:        BackendKind::Ndarray,
        }
    }
}

/// Summary of a finished run, for the CLI to print.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs_run:    usize,
    pub best_epoch:    Option<usize>,
    pub best_val_loss: f64,
    pub stopped_early: bool,
    pub export_path:   PathBuf,
    pub scaler_path:   PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline on the configured backend
    pub fn execute(&self) -> Result<TrainReport> {
        match self.config.backend {
            BackendKind::Ndarray => {
                tracing::info!("Using NdArray (CPU) backend");
                run_pipeline::<Autodiff<NdArray>>(&self.config, NdArrayDevice::Cpu)
            }
            BackendKind::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                run_pipeline::<Autodiff<Wgpu>>(&self.config, device)
            }
        }
    }
}

pub fn run_pipeline<B: AutodiffBackend>(cfg: &TrainConfig, device: B::Device) -> Result<TrainReport> {
    ensure!(cfg.batch_size > 0, "Batch size must be positive");
    ensure!(
        cfg.train_fraction > 0.0 && cfg.train_fraction < 1.0,
        "Train fraction must be strictly between 0 and 1, got {}",
        cfg.train_fraction
    );

    // ── Step 1: Seed everything ───────────────────────────────────────────────
    let mut rng = seed_everything::<B>(cfg.seed);

    // ── Step 2: Load samples ──────────────────────────────────────────────────
    tracing::info!("Loading dataset from '{}'", cfg.data_path);
    let samples = CsvLoader::new(&cfg.data_path).load_all()?;
    let non_finite = samples.iter().filter(|s| !s.is_finite()).count();
    ensure!(non_finite == 0, "Dataset has {non_finite} rows with NaN or infinite values");
    tracing::info!("Loaded {} samples", samples.len());

    // ── Step 3: Fit scalers on the full dataset ───────────────────────────────
    let features: Vec<[f64; FEATURE_COUNT]> = samples.iter().map(|s| s.features).collect();
    let targets:  Vec<[f64; TARGET_COUNT]>  = samples.iter().map(|s| s.targets).collect();
    let scalers = ScalerBundle {
        features: MinMaxScaler::fit(&features)?,
        targets:  MinMaxScaler::fit(&targets)?,
    };

    // ── Step 4: Train / validation split ──────────────────────────────────────
    let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, &mut rng);
    ensure!(
        !train_samples.is_empty() && !val_samples.is_empty(),
        "Dataset too small to split: {} train, {} validation",
        train_samples.len(),
        val_samples.len()
    );
    tracing::info!(
        "Split: {} train, {} validation",
        train_samples.len(),
        val_samples.len()
    );

    // ── Step 5: Datasets and loaders ──────────────────────────────────────────
    let train_dataset = TractionDataset::from_samples(&train_samples, &scalers.features, &scalers.targets)?;
    let val_dataset   = TractionDataset::from_samples(&val_samples, &scalers.features, &scalers.targets)?;
    let (train_loader, val_loader) =
        build_loaders::<B>(train_dataset, val_dataset, cfg.batch_size, cfg.seed, &device);

    // ── Step 6: Save config, open metrics ─────────────────────────────────────
    let ckpt_manager = CheckpointManager::new(&cfg.artifact_dir)?;
    ckpt_manager.save_config(cfg)?;
    let metrics = MetricsLogger::new(&cfg.artifact_dir)?;

    // ── Step 7: Train ─────────────────────────────────────────────────────────
    let model_cfg = MlpConfig::new(FEATURE_COUNT, TARGET_COUNT).with_hidden_size(cfg.hidden_size);
    let model     = model_cfg.init::<B>(&device);
    tracing::info!(
        "Model ready: {} → {} → {} → {}",
        FEATURE_COUNT, cfg.hidden_size, cfg.hidden_size, TARGET_COUNT
    );

    let mut scheduler = cfg.use_scheduler.then(|| {
        PlateauConfig::new()
            .with_factor(cfg.lr_factor)
            .with_patience(cfg.lr_patience)
            .init(cfg.lr)
    });

    let options = EarlyStoppingOptions {
        max_epochs:    cfg.epochs,
        patience:      cfg.patience,
        learning_rate: cfg.lr,
    };

    let outcome = train_with_early_stopping(
        model,
        train_loader,
        val_loader,
        cfg.loss,
        default_optimizer().init(),
        scheduler.as_mut(),
        &options,
        Some(&scalers.targets),
        Some(&metrics),
    )?;
    tracing::info!("Epoch metrics written to {}", metrics.csv_path().display());
    if let Some(s) = &scheduler {
        tracing::info!("Final learning rate: {:.2e}", s.learning_rate());
    }

    // ── Step 8: Persist the restored model ────────────────────────────────────
    let checkpoint = ckpt_manager.save_model(&outcome.model, "best_model")?;
    tracing::info!("Best model checkpoint saved to {}", checkpoint.display());

    // ── Step 9: Export for the native runtime ─────────────────────────────────
    let export_path = PathBuf::from(&cfg.export_path);
    let traced = export_traced(&outcome.model.valid(), FEATURE_COUNT, &export_path)?;
    traced.verify(1e-4)?;

    let scaler_path = scaler_path(&export_path);
    scalers.save(&scaler_path)?;
    tracing::info!("Scalers saved to {}", scaler_path.display());

    Ok(TrainReport {
        epochs_run:    outcome.history.len(),
        best_epoch:    outcome.best_epoch,
        best_val_loss: outcome.best_val_loss,
        stopped_early: outcome.stopped_early,
        export_path,
        scaler_path,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{io::Write, path::Path};

    use crate::infra::export::TracedModel;

    /// Write a small synthetic dataset following the controller's
    /// ramp rules, so the targets are a learnable function of the features.
    pub(crate) fn write_dataset(path: &Path, rows: usize) {
        let mut f = std::fs::File::create(path).unwrap();
        writeln!(
            f,
            "wheel_index,slip_ratio,angular_velocity,linear_speed,current_brake_torque,\
current_drive_torque,speed_to_velocity_ratio,excess_drive_torque,slip_deviation,\
desired_brake_torque,desired_drive_torque"
        ).unwrap();

        let desired_slip = 0.1;
        for i in 0..rows {
            let t     = i as f64 / rows as f64;
            let slip  = 0.3 * t;
            let speed = 5.0 + 20.0 * ((i * 7) % rows) as f64 / rows as f64;
            let omega = speed * (1.0 + slip) / 0.3;
            let brake = 200.0 * ((i * 3) % rows) as f64 / rows as f64;
            let drive = 150.0 * ((i * 5) % rows) as f64 / rows as f64;
            let err   = slip - desired_slip;
            let (want_brake, want_drive) = if err > 0.0 {
                ((brake + 500.0 * err * 0.01).min(200.0), (drive - 300.0 * err * 0.01).max(0.0))
            } else {
                ((brake + 500.0 * err * 0.01).max(0.0), (drive - 300.0 * err * 0.01).min(150.0))
            };
            writeln!(
                f,
                "{},{},{},{},{},{},{},{},{},{},{}",
                i % 4, slip, omega, speed, brake, drive,
                speed / omega, (drive - want_drive).max(0.0), err,
                want_brake, want_drive,
            ).unwrap();
        }
    }

    pub(crate) fn small_config(dir: &Path) -> TrainConfig {
        let data = dir.join("data.csv");
        write_dataset(&data, 200);
        TrainConfig {
            data_path:    data.display().to_string(),
            artifact_dir: dir.join("artifacts").display().to_string(),
            export_path:  dir.join("model.json").display().to_string(),
            hidden_size:  16,
            batch_size:   32,
            epochs:       4,
            patience:     2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_pipeline_writes_all_artifacts() {
        let _guard = crate::ml::burn_test_lock();
        let dir = tempfile::tempdir().unwrap();
        let cfg = small_config(dir.path());

        let report = run_pipeline::<Autodiff<NdArray>>(&cfg, NdArrayDevice::Cpu).unwrap();

        assert!(report.epochs_run >= 1 && report.epochs_run <= 4);
        assert!(report.best_epoch.is_some());
        assert!(report.best_val_loss.is_finite());
        assert!(report.export_path.exists());
        assert!(report.scaler_path.exists());
        assert!(dir.path().join("artifacts/best_model.mpk").exists());
        assert!(dir.path().join("artifacts/train_config.json").exists());
        assert!(dir.path().join("artifacts/metrics.csv").exists());

        TracedModel::load(&report.export_path).unwrap().verify(1e-4).unwrap();
    }

    #[test]
    fn test_pipeline_is_deterministic_for_fixed_seed() {
        let _guard = crate::ml::burn_test_lock();
        let run = || {
            let dir = tempfile::tempdir().unwrap();
            let cfg = small_config(dir.path());
            let report = run_pipeline::<Autodiff<NdArray>>(&cfg, NdArrayDevice::Cpu).unwrap();
            TracedModel::load(&report.export_path).unwrap()
        };

        let a = run();
        let b = run();
        assert_eq!(a.ops, b.ops);
        assert_eq!(a.example_input, b.example_input);
    }

    #[test]
    fn test_rejects_degenerate_split() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { train_fraction: 1.0, ..small_config(dir.path()) };
        assert!(run_pipeline::<Autodiff<NdArray>>(&cfg, NdArrayDevice::Cpu).is_err());
    }

    #[test]
    fn test_missing_dataset_is_error() {
        let _guard = crate::ml::burn_test_lock();
        let cfg = TrainConfig {
            data_path: "no/such/file.csv".to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("no/such/file.csv"));
    }
}
