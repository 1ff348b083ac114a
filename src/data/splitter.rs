// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used for early stopping and LR scheduling
//
// The RNG is passed in by the caller. With a seeded StdRng the
// split is reproducible, and both partitions are fixed for
// the rest of the run.
//
// Split ratio: 80% training, 20% validation (configurable).
// The validation count is rounded up.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` with `rng` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `rng`            - Source of randomness for the shuffle
///
/// # Returns
/// A tuple (train_samples, val_samples)
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    // Validation takes ceil(total * (1 - fraction)) samples, the rest train:
    // 11 samples at 0.8 → 3 validation, 8 training.
    // The 1e-9 absorbs float noise in (1 - fraction), e.g. 1 - 0.7.
    let total     = samples.len();
    let val_share = 1.0 - train_fraction.clamp(0.0, 1.0);
    let val_count = ((total as f64) * val_share - 1e-9).ceil().max(0.0) as usize;
    let split_at  = total - val_count.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}
