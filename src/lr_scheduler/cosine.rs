use super::{SchedulePolicy, ScheduleKind, ScheduleState};
use std::f32::consts::PI;

/// Half-cosine decay from `base_lr` to `lr_min` over `t_max` epochs,
/// holding at `lr_min` afterwards
#[derive(Debug, Clone)]
pub struct CosineAnnealing {
    t_max: usize,
    lr_min: f32,
}

impl CosineAnnealing {
    pub fn new(t_max: usize, lr_min: f32) -> Self {
        CosineAnnealing { t_max, lr_min }
    }

    pub fn lr_at(&self, base_lr: f32, epoch: usize) -> f32 {
        if self.t_max == 0 {
            return base_lr;
        }
        let progress = epoch.min(self.t_max) as f32 / self.t_max as f32;
        self.lr_min + 0.5 * (base_lr - self.lr_min) * (1.0 + (PI * progress).cos())
    }
}

impl SchedulePolicy for CosineAnnealing {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::Cosine
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        self.lr_at(base_lr, 0)
    }

    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        self.lr_at(state.base_lr, state.next_epoch())
    }
}
