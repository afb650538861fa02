use super::{SchedulePolicy, ScheduleKind, ScheduleState};
use std::f32::consts::PI;

/// Shape used to interpolate between the endpoints of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnealStrategy {
    Linear,
    #[default]
    Cos,
}

impl AnnealStrategy {
    /// Moves from `start` to `end` as `pct` goes from 0 to 1
    pub fn interpolate(self, start: f32, end: f32, pct: f32) -> f32 {
        match self {
            AnnealStrategy::Linear => start + (end - start) * pct,
            AnnealStrategy::Cos => {
                let cos_out = (pct * PI).cos() + 1.0;
                end + (start - end) / 2.0 * cos_out
            }
        }
    }
}

/// Momentum bounds cycled inversely to the learning rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumRange {
    /// Momentum at the learning rate peak
    pub base: f32,
    /// Momentum at both ends of the run
    pub max: f32,
}

/// One-Cycle learning rate policy, updated per step.
///
/// Rises from `base_lr / div_factor` to `max_lr` over the first `pct_start`
/// of `total_steps`, then anneals to `base_lr / div_factor / final_div_factor`.
/// Steps past `total_steps` hold the final value.
#[derive(Debug, Clone)]
pub struct OneCycle {
    /// Maximum learning rate at peak of cycle
    pub max_lr: f32,
    /// Total number of steps in the run
    pub total_steps: usize,
    /// Percentage of training spent in ascent to max_lr
    pub pct_start: f32,
    /// Factor to divide base_lr by to get initial learning rate
    pub div_factor: f32,
    /// Factor to divide initial_lr by to get final learning rate
    pub final_div_factor: f32,
    pub anneal: AnnealStrategy,
    pub momentum: Option<MomentumRange>,
}

/// Where a step falls within the cycle
enum Phase {
    Ascent(f32),
    Descent(f32),
}

impl OneCycle {
    fn initial(&self, base_lr: f32) -> f32 {
        base_lr / self.div_factor
    }

    fn final_lr(&self, base_lr: f32) -> f32 {
        self.initial(base_lr) / self.final_div_factor
    }

    fn phase(&self, step: usize) -> Phase {
        let step = step.min(self.total_steps);
        let steps_to_max = (self.total_steps as f32 * self.pct_start) as usize;

        if step < steps_to_max {
            Phase::Ascent(step as f32 / steps_to_max as f32)
        } else {
            let remaining = (self.total_steps - steps_to_max).max(1);
            Phase::Descent((step - steps_to_max) as f32 / remaining as f32)
        }
    }

    /// Learning rate for the given step
    pub fn lr_at(&self, base_lr: f32, step: usize) -> f32 {
        match self.phase(step) {
            Phase::Ascent(pct) => {
                self.anneal
                    .interpolate(self.initial(base_lr), self.max_lr, pct)
            }
            Phase::Descent(pct) => {
                self.anneal
                    .interpolate(self.max_lr, self.final_lr(base_lr), pct)
            }
        }
    }

    /// Momentum for the given step, high where the rate is low
    pub fn momentum_at(&self, step: usize) -> Option<f32> {
        let range = self.momentum?;
        let momentum = match self.phase(step) {
            Phase::Ascent(pct) => self.anneal.interpolate(range.max, range.base, pct),
            Phase::Descent(pct) => self.anneal.interpolate(range.base, range.max, pct),
        };
        Some(momentum)
    }
}

impl SchedulePolicy for OneCycle {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::OneCycle
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        self.lr_at(base_lr, 0)
    }

    fn on_step(&mut self, state: &ScheduleState) -> f32 {
        self.lr_at(state.base_lr, state.next_step())
    }

    fn momentum(&self, state: &ScheduleState) -> Option<f32> {
        self.momentum_at(state.step_index)
    }
}
