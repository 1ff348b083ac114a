// ============================================================
// Layer 5 - Backend Selection and Seeding
// ============================================================
// Burn picks the backend at compile time (a type parameter),
// so "device selection" is an enum the application layer
// matches on to instantiate the right generic pipeline.
//
// Seeding is best-effort: NdArray (CPU) runs are reproducible
// for a fixed seed; Wgpu kernels are not guaranteed to be
// bit-identical between runs.

use burn::tensor::backend::Backend;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// CPU via ndarray
    #[default]
    Ndarray,
    /// GPU via wgpu (Vulkan / Metal / DX12)
    Wgpu,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ndarray" | "cpu" => Ok(BackendKind::Ndarray),
            "wgpu" | "gpu"    => Ok(BackendKind::Wgpu),
            other => Err(format!("unknown backend '{other}' (expected ndarray or wgpu)")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ndarray => write!(f, "ndarray"),
            BackendKind::Wgpu    => write!(f, "wgpu"),
        }
    }
}

/// Seed the backend RNG (parameter init, random tensors) and return
/// a StdRng with the same seed for host-side draws such as the split.
pub fn seed_everything<B: Backend>(seed: u64) -> StdRng {
    B::seed(seed);
    tracing::debug!("Seeded {} and host RNG with {}", B::name(), seed);
    StdRng::seed_from_u64(seed)
}
