use super::{ScheduleEvent, SchedulePolicy, ScheduleKind, ScheduleState};
use std::f32::consts::PI;

/// Cosine decay within cycles that restart at `base_lr`.
/// The first cycle lasts `t_0` epochs and each restart multiplies the length by `t_mult`.
#[derive(Debug, Clone)]
pub struct CosineWarmRestarts {
    t_mult: usize,
    lr_min: f32,
    /// Epoch at which the current cycle began, never ahead of the run
    current_cycle_start: usize,
    cycle_length: usize,
    event: Option<ScheduleEvent>,
}

impl CosineWarmRestarts {
    pub fn new(t_0: usize, t_mult: usize, lr_min: f32) -> Self {
        CosineWarmRestarts {
            t_mult,
            lr_min,
            current_cycle_start: 0,
            cycle_length: t_0.max(1),
            event: None,
        }
    }

    pub fn current_cycle_start(&self) -> usize {
        self.current_cycle_start
    }

    pub fn cycle_length(&self) -> usize {
        self.cycle_length
    }

    /// Moves the cycle boundary forward so that `epoch` falls inside the current cycle.
    /// Calling it again with the same epoch changes nothing.
    pub fn advance_to(&mut self, epoch: usize) {
        while epoch.saturating_sub(self.current_cycle_start) >= self.cycle_length {
            self.current_cycle_start += self.cycle_length;
            self.cycle_length = self.cycle_length.saturating_mul(self.t_mult);
            self.event = Some(ScheduleEvent::Restarted {
                epoch: self.current_cycle_start,
                cycle_length: self.cycle_length,
            });
        }
    }

    /// Learning rate at `epoch` within the current cycle
    pub fn lr_at(&self, base_lr: f32, epoch: usize) -> f32 {
        let elapsed = epoch.saturating_sub(self.current_cycle_start) as f32;
        let progress = elapsed / self.cycle_length as f32;
        self.lr_min + 0.5 * (base_lr - self.lr_min) * (1.0 + (PI * progress).cos())
    }
}

impl SchedulePolicy for CosineWarmRestarts {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::CosineRestart
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        base_lr
    }

    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        let epoch = state.next_epoch();
        self.advance_to(epoch);
        self.lr_at(state.base_lr, epoch)
    }

    fn take_event(&mut self) -> Option<ScheduleEvent> {
        self.event.take()
    }
}
