// ============================================================
// Layer 5 - Training Loop with Early Stopping
// ============================================================
// Train + validation loop using Burn's DataLoader and an
// optimizer supplied by the caller (Adam in the pipeline).
//
// Key points:
//   - Training uses the autodiff backend B for gradients
//   - model.valid() returns the model on B::InnerBackend, and
//     validation batches are built on that backend too
//   - Training loss is in normalised units; validation loss is
//     computed after inverse-scaling predictions and targets,
//     so it is in physical torque units
//   - Both losses are size-weighted means over samples
//   - The best parameter record is kept in memory and loaded
//     back into the model when the loop ends

use anyhow::{bail, ensure, Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::data::{
    batcher::{TractionBatch, TractionBatcher},
    dataset::TractionDataset,
    scaler::MinMaxScaler,
};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::{
    early_stopping::EarlyStopping,
    loss::LossKind,
    model::Mlp,
    scheduler::ReduceLrOnPlateau,
};

pub type BatchLoader<B> = Arc<dyn DataLoader<TractionBatch<B>>>;

/// Epoch budget and optimiser step size for one run.
#[derive(Debug, Clone, Copy)]
pub struct EarlyStoppingOptions {
    pub max_epochs:    usize,
    pub patience:      usize,
    pub learning_rate: f64,
}

/// What a finished run hands back to the caller.
pub struct TrainingOutcome<B: AutodiffBackend> {
    /// Model holding the best parameters seen (or the last ones if
    /// no epoch ever improved)
    pub model:         Mlp<B>,
    pub history:       Vec<EpochMetrics>,
    pub best_epoch:    Option<usize>,
    pub best_val_loss: f64,
    pub stopped_early: bool,
}

/// Adam with epsilon 1e-8 instead of burn's 1e-5 default.
pub fn default_optimizer() -> AdamConfig {
    AdamConfig::new().with_epsilon(1e-8)
}

/// Shuffled training loader on the autodiff backend and sequential
/// validation loader on the inner backend.
pub fn build_loaders<B: AutodiffBackend>(
    train_dataset: TractionDataset,
    val_dataset:   TractionDataset,
    batch_size:    usize,
    seed:          u64,
    device:        &B::Device,
) -> (BatchLoader<B>, BatchLoader<B::InnerBackend>) {
    let train_loader = DataLoaderBuilder::new(TractionBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .shuffle(seed)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(TractionBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(batch_size)
        .build(val_dataset);

    (train_loader, val_loader)
}

/// Maps scaled model outputs back to physical units on-device:
/// x * range + data_min, broadcast over the batch dimension.
pub struct InverseScale<B: Backend> {
    range:  Tensor<B, 2>,
    offset: Tensor<B, 2>,
}

impl<B: Backend> InverseScale<B> {
    pub fn new(scaler: &MinMaxScaler, device: &B::Device) -> Self {
        let width  = scaler.width();
        let range: Vec<f32>  = scaler.data_range().into_iter().map(|v| v as f32).collect();
        let offset: Vec<f32> = scaler.data_min.iter().map(|&v| v as f32).collect();
        Self {
            range:  Tensor::from_data(TensorData::new(range, [1, width]), device),
            offset: Tensor::from_data(TensorData::new(offset, [1, width]), device),
        }
    }

    pub fn apply(&self, scaled: Tensor<B, 2>) -> Tensor<B, 2> {
        scaled * self.range.clone() + self.offset.clone()
    }
}

/// Size-weighted mean loss over `loader`, in physical units.
pub fn validation_loss<B: Backend>(
    model:   &Mlp<B>,
    loader:  &BatchLoader<B>,
    loss:    LossKind,
    inverse: &InverseScale<B>,
) -> f64 {
    let mut sum   = 0.0f64;
    let mut count = 0usize;

    for batch in loader.iter() {
        let n       = batch.size();
        let output  = inverse.apply(model.forward(batch.features));
        let targets = inverse.apply(batch.targets);
        let value: f64 = loss.forward(output, targets).into_scalar().elem();
        sum   += value * n as f64;
        count += n;
    }

    if count > 0 { sum / count as f64 } else { f64::NAN }
}

#[allow(clippy::too_many_arguments)]
pub fn train_with_early_stopping<B, O>(
    mut model:     Mlp<B>,
    train_loader:  BatchLoader<B>,
    val_loader:    BatchLoader<B::InnerBackend>,
    loss:          LossKind,
    mut optim:     O,
    mut scheduler: Option<&mut ReduceLrOnPlateau>,
    options:       &EarlyStoppingOptions,
    target_scaler: Option<&MinMaxScaler>,
    metrics:       Option<&MetricsLogger>,
) -> Result<TrainingOutcome<B>>
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
{
    // Validation loss is compared in physical units; without the
    // fitted target scaler that comparison has no meaning.
    let Some(target_scaler) = target_scaler else {
        bail!("A fitted target scaler is required to compute validation loss");
    };
    ensure!(
        target_scaler.width() == model.output_size(),
        "Target scaler has {} columns but the model outputs {}",
        target_scaler.width(),
        model.output_size()
    );

    let device = model
        .devices()
        .into_iter()
        .next()
        .context("Model has no parameters on any device")?;
    let inverse = InverseScale::<B::InnerBackend>::new(target_scaler, &device);

    let mut stopper       = EarlyStopping::new(options.patience);
    let mut best_record   = None;
    let mut history       = Vec::new();
    let mut stopped_early = false;
    let mut lr            = options.learning_rate;

    for epoch in 1..=options.max_epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_count    = 0usize;

        for batch in train_loader.iter() {
            let n      = batch.size();
            let output = model.forward(batch.features);
            let batch_loss = loss.forward(output, batch.targets);

            let value: f64 = batch_loss.clone().into_scalar().elem();
            train_loss_sum += value * n as f64;
            train_count    += n;

            let grads = batch_loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        let train_loss = if train_count > 0 {
            train_loss_sum / train_count as f64
        } else { f64::NAN };

        // ── Validation phase (no autodiff) ────────────────────────────────────
        let val_loss = validation_loss(&model.valid(), &val_loader, loss, &inverse);

        let record = EpochMetrics::new(epoch, train_loss, val_loss, lr);
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.6} | val_loss={:.4} | lr={:.2e}",
            epoch, options.max_epochs, train_loss, val_loss, lr,
        );
        if let Some(logger) = metrics {
            logger.log(&record)?;
        }
        history.push(record);

        if let Some(s) = scheduler.as_deref_mut() {
            lr = s.step(val_loss);
        }

        let observation = stopper.observe(epoch, val_loss);
        if observation.improved {
            best_record = Some(model.clone().into_record());
        }
        if observation.should_stop {
            tracing::warn!(
                "Early stopping at epoch {}: no improvement for {} epochs",
                epoch,
                stopper.stalled_epochs()
            );
            stopped_early = epoch < options.max_epochs;
            break;
        }
    }

    if let Some(record) = best_record {
        model = model.load_record(record);
        tracing::info!(
            "Restored best model from epoch {} (val_loss={:.4})",
            stopper.best_epoch().unwrap_or_default(),
            stopper.best_loss()
        );
    }

    Ok(TrainingOutcome {
        model,
        history,
        best_epoch:    stopper.best_epoch(),
        best_val_loss: stopper.best_loss(),
        stopped_early,
    })
}
