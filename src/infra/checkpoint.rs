// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's recorders.
//
// What gets saved:
//   1. Model weights (<name>.mpk)  - full-precision parameters
//   2. train_config.json           - the run's TrainConfig
//
// Full precision (not CompactRecorder's half precision) is
// used so a reloaded checkpoint matches the model that was
// traced and exported.
//
// Loading rebuilds the architecture from MlpConfig, loads the
// record into it, and checks every layer shape. Burn replaces
// parameter tensors wholesale on load, so a checkpoint from a
// different architecture would otherwise load silently.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{ensure, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Mlp, MlpConfig};

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Save model weights as `<dir>/<name>.mpk`.
    pub fn save_model<B: Backend>(&self, model: &Mlp<B>, name: &str) -> Result<PathBuf> {
        // The recorder adds the extension
        let path = self.dir.join(name);

        ModelRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path.with_extension("mpk"))
    }

    /// Instantiate the architecture described by `config` and load the
    /// weights saved under `name` into it.
    pub fn load_model<B: Backend>(
        &self,
        config: &MlpConfig,
        name:   &str,
        device: &B::Device,
    ) -> Result<Mlp<B>> {
        let path = self.dir.join(name);

        let record = ModelRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        let model = config.init::<B>(device).load_record(record);

        let expected = config.layer_shapes();
        let actual   = model.layer_shapes();
        ensure!(
            expected == actual,
            "Checkpoint '{}' does not match the architecture: layer shapes {:?}, expected {:?}",
            path.display(),
            actual,
            expected
        );

        tracing::info!("Model loaded from {}", path.display());
        Ok(model)
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn weights(model: &Mlp<TestBackend>) -> Vec<f32> {
        model.output.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_model_round_trip_is_exact() {
        let _guard = crate::ml::burn_test_lock();
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let config = MlpConfig::new(8, 2).with_hidden_size(16);
        let model  = config.init::<TestBackend>(&device);

        let path = ckpt.save_model(&model, "best_model").unwrap();
        assert!(path.exists());

        let loaded = ckpt.load_model::<TestBackend>(&config, "best_model", &device).unwrap();
        assert_eq!(weights(&loaded), weights(&model));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let _guard = crate::ml::burn_test_lock();
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();

        let saved = MlpConfig::new(8, 2).with_hidden_size(16).init::<TestBackend>(&device);
        ckpt.save_model(&saved, "m").unwrap();

        let other = MlpConfig::new(8, 2).with_hidden_size(32);
        let err = ckpt.load_model::<TestBackend>(&other, "m", &device).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_missing_checkpoint_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = MlpConfig::new(8, 2);
        assert!(ckpt.load_model::<TestBackend>(&cfg, "absent", &Default::default()).is_err());
    }

    #[test]
    fn test_corrupt_checkpoint_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        fs::write(dir.path().join("junk.mpk"), b"not a record").unwrap();
        let cfg  = MlpConfig::new(8, 2).with_hidden_size(4);
        assert!(ckpt.load_model::<TestBackend>(&cfg, "junk", &Default::default()).is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = TrainConfig { epochs: 7, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().epochs, 7);
    }
}
