// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not
// against the CSV loader or the exported runtime directly.

use anyhow::Result;
use crate::domain::sample::{TorqueCommand, VehicleSample};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce labelled vehicle samples.
///
/// Implementations:
///   - CsvLoader → reads the cleaned simulation CSV
pub trait SampleSource {
    /// Load every available sample from this source.
    fn load_all(&self) -> Result<Vec<VehicleSample>>;
}

// ─── TorquePredictor ──────────────────────────────────────────────────────────
/// Any component that turns one feature row (physical units)
/// into a torque command.
///
/// Implementations:
///   - PredictUseCase → exported traced model + persisted scalers
pub trait TorquePredictor {
    fn predict(&self, features: &[f64]) -> Result<TorqueCommand>;
}
