use super::{SchedulePolicy, ScheduleKind, ScheduleState};

/// Multiplies the rate by `gamma` every `step_size` epochs
#[derive(Debug, Clone)]
pub struct StepDecay {
    step_size: usize,
    gamma: f32,
}

impl StepDecay {
    pub fn new(step_size: usize, gamma: f32) -> Self {
        StepDecay { step_size, gamma }
    }

    /// `base_lr * gamma ^ floor(epoch / step_size)`
    pub fn lr_at(&self, base_lr: f32, epoch: usize) -> f32 {
        let decays = epoch / self.step_size.max(1);
        base_lr * self.gamma.powi(decays as i32)
    }
}

impl SchedulePolicy for StepDecay {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::Step
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        self.lr_at(base_lr, 0)
    }

    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        self.lr_at(state.base_lr, state.next_epoch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr_scheduler::{ScheduleConfig, Scheduler};
    use crate::test_utils::assert_close;

    #[test]
    fn test_step_decay_schedule() {
        let config = ScheduleConfig::Step {
            step_size: 10,
            gamma: 0.5,
        };
        let mut scheduler = Scheduler::new(config, 0.1).unwrap();

        let mut rates = vec![scheduler.current_lr()];
        for epoch in 0..20 {
            rates.push(scheduler.on_epoch(epoch, 1.0).unwrap());
        }

        for lr in &rates[0..10] {
            assert_close(*lr, 0.1, 1e-7);
        }
        for lr in &rates[10..20] {
            assert_close(*lr, 0.05, 1e-7);
        }
        assert_close(rates[20], 0.025, 1e-7);
    }

    #[test]
    fn test_lr_at_is_pure() {
        let policy = StepDecay::new(3, 0.1);
        assert_eq!(policy.lr_at(1.0, 7), policy.lr_at(1.0, 7));
        assert_close(policy.lr_at(1.0, 7), 0.01, 1e-7);
    }
}
