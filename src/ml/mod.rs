// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Model definition and everything that drives training.
//
//   model.rs          - 3-layer MLP (Linear → ReLU → Linear → ReLU → Linear)
//                       plus op-by-op tracing for export
//
//   trainer.rs        - epoch loop: train pass, physical-unit validation,
//                       LR scheduling, best-state snapshot and restore
//
//   early_stopping.rs - best-loss / stall-counter bookkeeping
//
//   scheduler.rs      - reduce-on-plateau learning rate
//
//   loss.rs           - MSE / MAE criterion
//
//   device.rs         - backend choice and seeding
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Feed-forward regression model
pub mod model;

/// Training loop with early stopping
pub mod trainer;

/// Stall counter and best-loss tracking
pub mod early_stopping;

/// Plateau-driven learning rate reduction
pub mod scheduler;

/// Regression loss functions
pub mod loss;

/// Backend selection and RNG seeding
pub mod device;

/// Burn's NdArray backend keeps its RNG in a process-wide slot, so
/// tests that seed it or initialise models must not interleave.
#[cfg(test)]
pub(crate) fn burn_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::Mutex;
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
