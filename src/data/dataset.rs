use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::scaler::MinMaxScaler;
use crate::domain::sample::VehicleSample;

/// One scaled sample, ready for batching.
/// Both vectors are in [0, 1] for data inside the fitted range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TractionItem {
    pub features: Vec<f32>,
    pub targets:  Vec<f32>,
}

pub struct TractionDataset {
    items: Vec<TractionItem>,
}

impl TractionDataset {
    #[cfg(test)]
    pub fn new(items: Vec<TractionItem>) -> Self { Self { items } }

    /// Scale every sample with the fitted feature and target scalers.
    pub fn from_samples(
        samples:        &[VehicleSample],
        feature_scaler: &MinMaxScaler,
        target_scaler:  &MinMaxScaler,
    ) -> Result<Self> {
        let items = samples
            .iter()
            .map(|s| {
                let features = feature_scaler.transform_row(&s.features)?;
                let targets  = target_scaler.transform_row(&s.targets)?;
                Ok(TractionItem {
                    features: features.into_iter().map(|v| v as f32).collect(),
                    targets:  targets.into_iter().map(|v| v as f32).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }
}

impl Dataset<TractionItem> for TractionDataset {
    fn get(&self, index: usize) -> Option<TractionItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
