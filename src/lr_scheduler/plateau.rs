use super::{ScheduleEvent, SchedulePolicy, ScheduleKind, ScheduleState};

/// Reduces the rate by `factor` after `patience` epochs without improvement.
///
/// Unlike the closed-form policies this one is path dependent: the rate
/// depends on the whole history of epoch losses fed to it.
#[derive(Debug, Clone)]
pub struct ReduceOnPlateau {
    factor: f32,
    patience: usize,
    /// Minimum absolute decrease that counts as an improvement
    threshold: f32,
    min_lr: Option<f32>,
    /// Lowest loss seen so far
    best_metric: f32,
    epochs_since_improvement: usize,
    event: Option<ScheduleEvent>,
}

impl ReduceOnPlateau {
    pub fn new(factor: f32, patience: usize, threshold: f32, min_lr: Option<f32>) -> Self {
        ReduceOnPlateau {
            factor,
            patience,
            threshold,
            min_lr,
            best_metric: f32::INFINITY,
            epochs_since_improvement: 0,
            event: None,
        }
    }

    pub fn best_metric(&self) -> f32 {
        self.best_metric
    }

    pub fn epochs_since_improvement(&self) -> usize {
        self.epochs_since_improvement
    }
}

impl SchedulePolicy for ReduceOnPlateau {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::Plateau
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        base_lr
    }

    fn on_epoch(&mut self, state: &ScheduleState, epoch_loss: f32) -> f32 {
        // NaN never compares as an improvement
        if epoch_loss < self.best_metric - self.threshold {
            self.best_metric = epoch_loss;
            self.epochs_since_improvement = 0;
            return state.current_lr;
        }

        self.epochs_since_improvement += 1;
        if self.epochs_since_improvement < self.patience {
            return state.current_lr;
        }

        self.epochs_since_improvement = 0;
        let floor = self.min_lr.unwrap_or(0.0);
        let reduced = (state.current_lr * self.factor).max(floor);
        if reduced < state.current_lr {
            self.event = Some(ScheduleEvent::Reduced {
                from: state.current_lr,
                to: reduced,
            });
            reduced
        } else {
            state.current_lr
        }
    }

    fn take_event(&mut self) -> Option<ScheduleEvent> {
        self.event.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr_scheduler::{ScheduleConfig, Scheduler};
    use crate::test_utils::{assert_close, epoch_rates};

    fn plateau_scheduler(patience: usize, min_lr: Option<f32>) -> Scheduler {
        let config = ScheduleConfig::Plateau {
            factor: 0.5,
            patience,
            threshold: 1e-4,
            min_lr,
        };
        Scheduler::new(config, 0.1).unwrap()
    }

    fn feed(scheduler: &mut Scheduler, losses: &[f32]) -> usize {
        let mut reductions = 0;
        for &loss in losses {
            let epoch = scheduler.state().epoch_index;
            scheduler.on_epoch(epoch, loss).unwrap();
            if let Some(ScheduleEvent::Reduced { .. }) = scheduler.last_event() {
                reductions += 1;
            }
        }
        reductions
    }

    #[test]
    fn test_decreasing_loss_never_reduces() {
        let mut scheduler = plateau_scheduler(2, None);
        let losses: Vec<f32> = (0..50).map(|i| 10.0 - 0.1 * i as f32).collect();
        assert_eq!(feed(&mut scheduler, &losses), 0);
        assert_eq!(scheduler.current_lr(), 0.1);
    }

    #[test]
    fn test_patience_plus_one_flat_losses_reduce_once() {
        let patience = 5;
        let mut scheduler = plateau_scheduler(patience, None);
        let losses = vec![1.0; patience + 1];
        assert_eq!(feed(&mut scheduler, &losses), 1);
        assert_close(scheduler.current_lr(), 0.05, 1e-7);
    }

    #[test]
    fn test_counter_resets_after_reduction() {
        let mut scheduler = plateau_scheduler(3, None);
        // One improvement, then two full patience windows
        let losses = vec![1.0; 7];
        assert_eq!(feed(&mut scheduler, &losses), 2);
        assert_close(scheduler.current_lr(), 0.025, 1e-7);
    }

    #[test]
    fn test_improvement_resets_counter() {
        let mut policy = ReduceOnPlateau::new(0.5, 3, 1e-4, None);
        let state = ScheduleState::new(ScheduleKind::Plateau, 0.1, 0.1);

        policy.on_epoch(&state, 1.0);
        policy.on_epoch(&state, 1.0);
        policy.on_epoch(&state, 1.0);
        assert_eq!(policy.epochs_since_improvement(), 2);

        policy.on_epoch(&state, 0.5);
        assert_eq!(policy.epochs_since_improvement(), 0);
        assert_eq!(policy.best_metric(), 0.5);
    }

    #[test]
    fn test_change_within_threshold_is_not_improvement() {
        let mut policy = ReduceOnPlateau::new(0.5, 3, 0.01, None);
        let state = ScheduleState::new(ScheduleKind::Plateau, 0.1, 0.1);
        policy.on_epoch(&state, 1.0);
        policy.on_epoch(&state, 0.995);
        assert_eq!(policy.epochs_since_improvement(), 1);
        assert_eq!(policy.best_metric(), 1.0);
    }

    #[test]
    fn test_nan_loss_counts_as_no_improvement() {
        let mut scheduler = plateau_scheduler(1, None);
        assert_eq!(feed(&mut scheduler, &[1.0, f32::NAN]), 1);
    }

    #[test]
    fn test_min_lr_floor() {
        let mut scheduler = plateau_scheduler(1, Some(0.03));
        feed(&mut scheduler, &[1.0; 10]);
        assert_close(scheduler.current_lr(), 0.03, 1e-7);
        // Already at the floor, no further reductions are reported
        assert_eq!(feed(&mut scheduler, &[1.0; 3]), 0);
    }

    #[test]
    fn test_rates_depend_on_loss_path() {
        let flat = epoch_rates(&mut plateau_scheduler(2, None), &[1.0, 1.0, 1.0, 1.0]);
        let improving = epoch_rates(&mut plateau_scheduler(2, None), &[1.0, 0.9, 0.8, 0.7]);
        assert_eq!(improving, vec![0.1; 5]);
        assert_close(flat[3], 0.05, 1e-7);
        assert_close(flat[4], 0.05, 1e-7);
    }
}
