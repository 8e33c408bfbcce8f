// ============================================================
// Layer 5 - Training Callbacks
// ============================================================
// The two decisions the epoch loop delegates:
//
//   ImprovementMonitor  "did val_loss beat the best so far?"
//                       → save a checkpoint
//
//   EarlyStopping       "has val_loss failed to improve for
//                       `patience` epochs in a row?"
//                       → stop training
//
// Both monitor val_loss in "min" mode. They are plain structs
// with no tensor types so the stopping rules are unit-testable.

/// Epochs without improvement before training stops
pub const DEFAULT_PATIENCE: usize = 20;

// ─── ImprovementMonitor ───────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImprovementMonitor {
    best: f64,
}

impl ImprovementMonitor {
    pub fn new() -> Self {
        Self { best: f64::INFINITY }
    }

    /// Start from a previously recorded best (resumed runs)
    pub fn with_best(best: f64) -> Self {
        Self { best }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    /// Record a new value. Returns the previous best if this one
    /// is strictly lower, None otherwise.
    pub fn update(&mut self, value: f64) -> Option<f64> {
        if value < self.best {
            let previous = self.best;
            self.best = value;
            Some(previous)
        } else {
            None
        }
    }
}

impl Default for ImprovementMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:  usize,
    min_delta: f64,
    best:      f64,
    wait:      usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta: min_delta.abs(),
            best: f64::INFINITY,
            wait: 0,
        }
    }

    pub fn with_best(mut self, best: f64) -> Self {
        self.best = best;
        self
    }

    /// Epochs since the last improvement
    pub fn wait(&self) -> usize {
        self.wait
    }

    /// Feed one epoch's val_loss. Returns true when training should stop.
    /// NaN never counts as an improvement.
    pub fn should_stop(&mut self, val_loss: f64) -> bool {
        if val_loss + self.min_delta < self.best {
            self.best = val_loss;
            self.wait = 0;
            return false;
        }

        self.wait += 1;
        self.wait >= self.patience
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_reports_previous_best() {
        let mut m = ImprovementMonitor::new();
        assert_eq!(m.update(2.0), Some(f64::INFINITY));
        assert_eq!(m.update(1.5), Some(2.0));
        assert_eq!(m.update(1.5), None);
        assert_eq!(m.update(1.7), None);
        assert_eq!(m.best(), 1.5);
    }

    #[test]
    fn test_stops_after_patience_flat_epochs() {
        let mut es = EarlyStopping::new(3, 0.0);
        assert!(!es.should_stop(1.0));
        assert!(!es.should_stop(1.0)); // wait 1
        assert!(!es.should_stop(1.1)); // wait 2
        assert!(es.should_stop(1.0));  // wait 3
    }

    #[test]
    fn test_improvement_resets_wait() {
        let mut es = EarlyStopping::new(2, 0.0);
        es.should_stop(1.0);
        es.should_stop(1.2);
        assert_eq!(es.wait(), 1);
        assert!(!es.should_stop(0.9));
        assert_eq!(es.wait(), 0);
    }

    #[test]
    fn test_min_delta_requires_real_improvement() {
        let mut es = EarlyStopping::new(1, 0.1);
        es.should_stop(1.0);
        // 0.95 is lower but not by more than min_delta
        assert!(es.should_stop(0.95));
    }

    #[test]
    fn test_min_delta_accepts_large_drop() {
        let mut es = EarlyStopping::new(1, 0.1);
        assert!(!es.should_stop(1.0));
        assert!(!es.should_stop(0.85));
        assert_eq!(es.wait(), 0);
        // within min_delta of the new best
        assert!(es.should_stop(0.8));
    }

    #[test]
    fn test_nan_is_not_improvement() {
        let mut es = EarlyStopping::new(1, 0.0).with_best(1.0);
        assert!(es.should_stop(f64::NAN));

        let mut m = ImprovementMonitor::with_best(1.0);
        assert_eq!(m.update(f64::NAN), None);
    }
}
