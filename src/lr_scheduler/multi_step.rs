use super::{SchedulePolicy, ScheduleKind, ScheduleState};

/// Multiplies the rate by `gamma` once for every milestone epoch passed
#[derive(Debug, Clone)]
pub struct MultiStep {
    /// Sorted, strictly increasing
    milestones: Vec<usize>,
    gamma: f32,
}

impl MultiStep {
    pub fn new(milestones: Vec<usize>, gamma: f32) -> Self {
        MultiStep { milestones, gamma }
    }

    /// `base_lr * gamma ^ (number of milestones <= epoch)`
    pub fn lr_at(&self, base_lr: f32, epoch: usize) -> f32 {
        let passed = self.milestones.partition_point(|&milestone| milestone <= epoch);
        base_lr * self.gamma.powi(passed as i32)
    }
}

impl SchedulePolicy for MultiStep {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::MultiStep
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        self.lr_at(base_lr, 0)
    }

    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        self.lr_at(state.base_lr, state.next_epoch())
    }
}
