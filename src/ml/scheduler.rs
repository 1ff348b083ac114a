// ============================================================
// Layer 5 - Reduce-on-Plateau Learning-Rate Scheduler
// ============================================================
// Burn's LrScheduler trait steps without a metric, so plateau
// detection is done here and the resulting rate is passed to
// Optimizer::step on every batch.
//
//   is_better(loss) := loss < best * (1 - threshold)
//   bad_steps > patience  →  lr = max(lr * factor, min_lr)
//
// A reduction smaller than `eps` is skipped. Every reduction
// resets the bad-step counter.

use burn::prelude::*;

#[derive(Config, Debug)]
pub struct PlateauConfig {
    /// Multiplier applied to the rate on a plateau
    #[config(default = 0.2)]
    pub factor:    f64,
    /// Non-improving steps tolerated before a reduction
    #[config(default = 2)]
    pub patience:  usize,
    /// Relative improvement required to reset the counter
    #[config(default = 1e-4)]
    pub threshold: f64,
    #[config(default = 0.0)]
    pub min_lr:    f64,
    #[config(default = 1e-8)]
    pub eps:       f64,
}

impl PlateauConfig {
    pub fn init(&self, initial_lr: f64) -> ReduceLrOnPlateau {
        ReduceLrOnPlateau {
            config:    self.clone(),
            lr:        initial_lr,
            best:      f64::INFINITY,
            bad_steps: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    config:    PlateauConfig,
    lr:        f64,
    best:      f64,
    bad_steps: usize,
}

impl ReduceLrOnPlateau {
    /// Record one monitored loss and return the rate to use next.
    pub fn step(&mut self, loss: f64) -> f64 {
        if loss < self.best * (1.0 - self.config.threshold) {
            self.best      = loss;
            self.bad_steps = 0;
        } else {
            self.bad_steps += 1;
        }

        if self.bad_steps > self.config.patience {
            let reduced = (self.lr * self.config.factor).max(self.config.min_lr);
            if self.lr - reduced > self.config.eps {
                tracing::warn!("Reducing learning rate {:.2e} → {:.2e}", self.lr, reduced);
                self.lr = reduced;
            }
            self.bad_steps = 0;
        }

        self.lr
    }

    pub fn learning_rate(&self) -> f64 { self.lr }
}
