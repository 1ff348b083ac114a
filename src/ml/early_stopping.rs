// ============================================================
// Layer 5 - Early Stopping
// ============================================================
// Tracks the best validation loss and how many consecutive
// epochs have failed to beat it.
//
// Rules:
//   - an epoch improves only if its loss is strictly below the
//     best seen so far (NaN never improves)
//   - an improvement resets the stall counter
//   - training stops once the stall counter reaches `patience`
//
// With patience = 0 the counter is already at the limit after
// the first epoch, so training runs exactly one epoch.

/// Result of observing one epoch's validation loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// The loss beat the previous best; snapshot the model
    pub improved:    bool,
    /// The stall counter reached patience; stop training
    pub should_stop: bool,
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    best_loss:  f64,
    best_epoch: Option<usize>,
    stalled:    usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss:  f64::INFINITY,
            best_epoch: None,
            stalled:    0,
        }
    }

    pub fn observe(&mut self, epoch: usize, val_loss: f64) -> Observation {
        let improved = val_loss < self.best_loss;
        if improved {
            self.best_loss  = val_loss;
            self.best_epoch = Some(epoch);
            self.stalled    = 0;
        } else {
            self.stalled += 1;
        }

        Observation { improved, should_stop: self.stalled >= self.patience }
    }

    pub fn best_loss(&self) -> f64 { self.best_loss }

    pub fn best_epoch(&self) -> Option<usize> { self.best_epoch }

    pub fn stalled_epochs(&self) -> usize { self.stalled }
}
