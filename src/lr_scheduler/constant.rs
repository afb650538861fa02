use super::{SchedulePolicy, ScheduleKind, ScheduleState};

/// Keeps the learning rate at `base_lr` for the whole run
#[derive(Debug, Clone, Copy, Default)]
pub struct Constant;

impl SchedulePolicy for Constant {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::None
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        base_lr
    }

    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        state.base_lr
    }
}
