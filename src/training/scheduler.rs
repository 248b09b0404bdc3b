//! Learning-rate adaptation for the training loop.

/// Reduce-on-plateau policy: when the validation loss fails to improve for
/// `patience` consecutive epochs, multiply the learning rate by `factor`.
#[derive(Debug, Clone)]
pub struct ReduceOnPlateau {
    best_metric: f64,
    epochs_without_improvement: usize,
    current_lr: f64,
    factor: f64,
    patience: usize,
    min_lr: f64,
}

impl ReduceOnPlateau {
    /// Create a new policy tracking a loss that should decrease
    pub fn new(initial_lr: f64, factor: f64, patience: usize, min_lr: f64) -> Self {
        Self {
            best_metric: f64::INFINITY,
            epochs_without_improvement: 0,
            current_lr: initial_lr,
            factor,
            patience,
            min_lr,
        }
    }

    /// Observe an epoch's validation loss and return the learning rate to
    /// use for the next epoch.
    pub fn step(&mut self, metric: f64) -> f64 {
        if metric < self.best_metric {
            self.best_metric = metric;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;

            if self.epochs_without_improvement >= self.patience {
                let new_lr = (self.current_lr * self.factor).max(self.min_lr);
                if new_lr < self.current_lr {
                    self.current_lr = new_lr;
                    self.epochs_without_improvement = 0;
                }
            }
        }

        self.current_lr
    }

    /// Current learning rate
    pub fn lr(&self) -> f64 {
        self.current_lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improving_loss_keeps_rate() {
        let mut policy = ReduceOnPlateau::new(0.1, 0.5, 3, 1e-8);

        assert_eq!(policy.step(1.0), 0.1);
        assert_eq!(policy.step(0.9), 0.1);
        assert_eq!(policy.step(0.8), 0.1);
    }

    #[test]
    fn test_plateau_reduces_rate_after_patience() {
        let mut policy = ReduceOnPlateau::new(0.1, 0.5, 3, 1e-8);

        policy.step(0.8);
        assert_eq!(policy.step(0.85), 0.1);
        assert_eq!(policy.step(0.86), 0.1);
        assert_eq!(policy.step(0.87), 0.05);
    }

    #[test]
    fn test_rate_never_drops_below_minimum() {
        let mut policy = ReduceOnPlateau::new(0.1, 0.1, 1, 0.01);

        policy.step(0.8);
        assert_eq!(policy.step(0.9), 0.01);
        assert_eq!(policy.step(0.9), 0.01);
        assert_eq!(policy.step(0.9), 0.01);
    }
}
