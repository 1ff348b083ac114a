// ============================================================
// Layer 4 - Min-Max Scaler
// ============================================================
// Per-column linear map of the fitted minimum to 0 and the
// fitted maximum to 1:
//
//   x_scaled = (x - data_min) / (data_max - data_min)
//   x        = x_scaled * (data_max - data_min) + data_min
//
// A constant column has zero range; it uses a range of 1 so
// transform stays finite (it then maps every value to 0).
//
// The fitted parameters are serialisable. They are written
// next to the exported model so the runtime that consumes the
// model can apply the same scaling.

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// A fitted min-max scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Per-column minimum seen during fit
    pub data_min: Vec<f64>,
    /// Per-column maximum seen during fit
    pub data_max: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit on `rows`, each row holding one value per column.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let Some(first) = rows.first() else {
            bail!("Cannot fit MinMaxScaler on empty data");
        };
        let width = first.as_ref().len();
        ensure!(width > 0, "Cannot fit MinMaxScaler on rows with no columns");

        let mut data_min = vec![f64::INFINITY; width];
        let mut data_max = vec![f64::NEG_INFINITY; width];

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            ensure!(
                row.len() == width,
                "Row {i} has {} columns, expected {width}",
                row.len()
            );
            for (c, &v) in row.iter().enumerate() {
                data_min[c] = data_min[c].min(v);
                data_max[c] = data_max[c].max(v);
            }
        }

        Ok(Self { data_min, data_max })
    }

    pub fn width(&self) -> usize {
        self.data_min.len()
    }

    /// Per-column range, with zero ranges replaced by 1
    pub fn data_range(&self) -> Vec<f64> {
        self.data_min
            .iter()
            .zip(&self.data_max)
            .map(|(&lo, &hi)| {
                let range = hi - lo;
                if range == 0.0 { 1.0 } else { range }
            })
            .collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.data_min.iter().zip(self.data_range()))
            .map(|(&x, (&lo, range))| (x - lo) / range)
            .collect())
    }

    pub fn inverse_transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row)?;
        Ok(row
            .iter()
            .zip(self.data_min.iter().zip(self.data_range()))
            .map(|(&x, (&lo, range))| x * range + lo)
            .collect())
    }

    fn check_width(&self, row: &[f64]) -> Result<()> {
        ensure!(
            row.len() == self.width(),
            "Scaler was fitted on {} columns, got {}",
            self.width(),
            row.len()
        );
        Ok(())
    }
}

/// The two scalers a trained model depends on, persisted as JSON
/// alongside the exported artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerBundle {
    pub features: MinMaxScaler,
    pub targets:  MinMaxScaler,
}

impl ScalerBundle {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write scalers to '{}'", path.display()))?;
        tracing::debug!("Saved scalers to '{}'", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read scalers from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed scaler file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<[f64; 3]> {
        vec![
            [1.0, -50.0, 7.0],
            [3.0,  10.0, 7.0],
            [2.0,  70.0, 7.0],
        ]
    }

    #[test]
    fn test_min_and_max_map_to_exact_bounds() {
        let data   = rows();
        let scaler = MinMaxScaler::fit(&data).unwrap();
        let scaled: Vec<Vec<f64>> = data
            .iter()
            .map(|r| scaler.transform_row(r).unwrap())
            .collect();

        assert_eq!(scaled[0][0], 0.0);
        assert_eq!(scaled[1][0], 1.0);
        assert_eq!(scaled[0][1], 0.0);
        assert_eq!(scaled[2][1], 1.0);
        assert_eq!(scaled[1][1], 0.5);
    }

    #[test]
    fn test_constant_column_stays_finite() {
        let scaler = MinMaxScaler::fit(&rows()).unwrap();
        let scaled = scaler.transform_row(&[2.0, 0.0, 7.0]).unwrap();
        assert_eq!(scaled[2], 0.0);
        assert_eq!(scaler.data_range()[2], 1.0);
    }

    #[test]
    fn test_inverse_recovers_physical_units() {
        let scaler = MinMaxScaler::fit(&rows()).unwrap();
        let back   = scaler.inverse_transform_row(&[0.5, 0.25, 0.0]).unwrap();
        assert_eq!(back, vec![2.0, -20.0, 7.0]);
    }

    #[test]
    fn test_empty_fit_is_error() {
        let empty: Vec<[f64; 2]> = Vec::new();
        assert!(MinMaxScaler::fit(&empty).is_err());
    }

    #[test]
    fn test_width_mismatch_is_error() {
        let scaler = MinMaxScaler::fit(&rows()).unwrap();
        assert!(scaler.transform_row(&[1.0]).is_err());
    }

    #[test]
    fn test_bundle_survives_disk() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("scalers.json");
        let bundle = ScalerBundle {
            features: MinMaxScaler::fit(&rows()).unwrap(),
            targets:  MinMaxScaler::fit(&[[0.0, 150.0], [200.0, 0.0]]).unwrap(),
        };
        bundle.save(&path).unwrap();
        assert_eq!(ScalerBundle::load(&path).unwrap(), bundle);
    }
}
