// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Runs the exported model the way the downstream controller
// does, without Burn:
//
//   features (physical units)
//       → feature scaler
//       → traced graph (native runtime)
//       → inverse target scaler
//       → clamp to actuator limits
//       → TorqueCommand

use anyhow::{ensure, Result};
use std::path::Path;

use crate::data::scaler::ScalerBundle;
use crate::domain::{sample::TorqueCommand, traits::TorquePredictor};
use crate::infra::export::{scaler_path, TracedModel};

pub struct PredictUseCase {
    model:   TracedModel,
    scalers: ScalerBundle,
}

impl PredictUseCase {
    /// Load the traced model and the scaler file written next to it.
    pub fn new(model_path: &Path) -> Result<Self> {
        let model   = TracedModel::load(model_path)?;
        let scalers = ScalerBundle::load(&scaler_path(model_path))?;

        ensure!(
            scalers.features.width() == model.input_size
                && scalers.targets.width() == model.output_size,
            "Scalers ({} → {}) do not match the model ({} → {})",
            scalers.features.width(),
            scalers.targets.width(),
            model.input_size,
            model.output_size
        );

        tracing::info!("Model loaded successfully from: {}", model_path.display());
        Ok(Self { model, scalers })
    }
}

impl TorquePredictor for PredictUseCase {
    fn predict(&self, features: &[f64]) -> Result<TorqueCommand> {
        let scaled: Vec<f32> = self
            .scalers
            .features
            .transform_row(features)?
            .into_iter()
            .map(|v| v as f32)
            .collect();

        let output: Vec<f64> = self.model.forward(&scaled)?.into_iter().map(f64::from).collect();
        let targets = self.scalers.targets.inverse_transform_row(&output)?;

        Ok(TorqueCommand::from_targets(&targets))
    }
}
