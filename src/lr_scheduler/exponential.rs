use super::{SchedulePolicy, ScheduleKind, ScheduleState};

/// Geometric decay, recomputed from `base_lr` each epoch
#[derive(Debug, Clone)]
pub struct Exponential {
    gamma: f32,
}

impl Exponential {
    pub fn new(gamma: f32) -> Self {
        Exponential { gamma }
    }

    /// `base_lr * gamma ^ epoch`
    pub fn lr_at(&self, base_lr: f32, epoch: usize) -> f32 {
        base_lr * self.gamma.powi(epoch.min(i32::MAX as usize) as i32)
    }
}

impl SchedulePolicy for Exponential {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::Exponential
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        base_lr
    }

    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        self.lr_at(state.base_lr, state.next_epoch())
    }
}
