use super::{SchedulePolicy, ScheduleKind, ScheduleState};

/// Amplitude policy across cycles
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CyclicMode {
    /// Constant amplitude
    Triangular,
    /// Amplitude halves after every complete cycle
    #[default]
    Triangular2,
    /// Amplitude scaled by `gamma ^ step`
    ExpRange { gamma: f32 },
}

impl CyclicMode {
    fn amplitude_scale(self, cycle: usize, step: usize) -> f32 {
        match self {
            CyclicMode::Triangular => 1.0,
            CyclicMode::Triangular2 => 0.5f32.powi(cycle.min(i32::MAX as usize) as i32),
            CyclicMode::ExpRange { gamma } => gamma.powi(step.min(i32::MAX as usize) as i32),
        }
    }
}

/// Triangular wave between `base_lr` and `max_lr`, updated per step
#[derive(Debug, Clone)]
pub struct Cyclic {
    max_lr: f32,
    step_size_up: usize,
    step_size_down: usize,
    mode: CyclicMode,
}

impl Cyclic {
    pub fn new(max_lr: f32, step_size_up: usize, step_size_down: usize, mode: CyclicMode) -> Self {
        Cyclic {
            max_lr,
            step_size_up: step_size_up.max(1),
            step_size_down: step_size_down.max(1),
            mode,
        }
    }

    fn cycle_length(&self) -> usize {
        self.step_size_up + self.step_size_down
    }

    /// Zero-based index of the cycle containing `step`
    pub fn cycle_of(&self, step: usize) -> usize {
        step / self.cycle_length()
    }

    pub fn lr_at(&self, base_lr: f32, step: usize) -> f32 {
        let position = step % self.cycle_length();

        // Fraction of the way from base_lr to the peak
        let height = if position <= self.step_size_up {
            position as f32 / self.step_size_up as f32
        } else {
            (self.cycle_length() - position) as f32 / self.step_size_down as f32
        };

        let amplitude = (self.max_lr - base_lr) * self.mode.amplitude_scale(self.cycle_of(step), step);
        base_lr + amplitude * height
    }
}

impl SchedulePolicy for Cyclic {
    fn kind(&self) -> ScheduleKind {
        ScheduleKind::Cyclic
    }

    fn initial_lr(&self, base_lr: f32) -> f32 {
        self.lr_at(base_lr, 0)
    }

    fn on_step(&mut self, state: &ScheduleState) -> f32 {
        self.lr_at(state.base_lr, state.next_step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr_scheduler::{ScheduleConfig, Scheduler};
    use crate::test_utils::assert_close;

    #[test]
    fn test_triangular_wave() {
        let policy = Cyclic::new(1.0, 4, 4, CyclicMode::Triangular);
        let rates: Vec<f32> = (0..=16).map(|step| policy.lr_at(0.2, step)).collect();

        assert_close(rates[0], 0.2, 1e-7);
        assert_close(rates[2], 0.6, 1e-6);
        assert_close(rates[4], 1.0, 1e-7);
        assert_close(rates[6], 0.6, 1e-6);
        assert_close(rates[8], 0.2, 1e-7);
        assert_close(rates[12], 1.0, 1e-7);
        assert_close(rates[16], 0.2, 1e-7);
    }

    #[test]
    fn test_triangular2_halves_amplitude() {
        let base_lr = 0.125;
        let policy = Cyclic::new(1.125, 4, 4, CyclicMode::Triangular2);

        let first_peak = policy.lr_at(base_lr, 4) - base_lr;
        let second_peak = policy.lr_at(base_lr, 12) - base_lr;
        let third_peak = policy.lr_at(base_lr, 20) - base_lr;

        assert_eq!(second_peak, first_peak / 2.0);
        assert_eq!(third_peak, second_peak / 2.0);
    }

    #[test]
    fn test_triangular2_amplitude_strictly_decreases() {
        let policy = Cyclic::new(0.1, 3, 3, CyclicMode::Triangular2);
        let peaks: Vec<f32> = (0..10)
            .map(|cycle| policy.lr_at(0.01, cycle * 6 + 3))
            .collect();
        assert!(peaks.windows(2).all(|pair| pair[1] < pair[0]));
        assert!(peaks.iter().all(|&peak| peak > 0.01));
    }

    #[test]
    fn test_asymmetric_cycle() {
        let policy = Cyclic::new(1.0, 2, 6, CyclicMode::Triangular);
        assert_close(policy.lr_at(0.0, 2), 1.0, 1e-7);
        assert_close(policy.lr_at(0.0, 5), 0.5, 1e-7);
        assert_eq!(policy.cycle_of(7), 0);
        assert_eq!(policy.cycle_of(8), 1);
    }

    #[test]
    fn test_exp_range_decays() {
        let policy = Cyclic::new(1.0, 2, 2, CyclicMode::ExpRange { gamma: 0.9 });
        assert!(policy.lr_at(0.1, 6) < policy.lr_at(0.1, 2));
    }

    #[test]
    fn test_driven_through_scheduler() {
        let config = ScheduleConfig::Cyclic {
            max_lr: 1.125,
            step_size_up: 4,
            step_size_down: None,
            mode: CyclicMode::Triangular,
        };
        let mut scheduler = Scheduler::new(config, 0.125).unwrap();
        assert_eq!(scheduler.current_lr(), 0.125);

        let rates: Vec<f32> = (0..8).map(|step| scheduler.on_step(step).unwrap()).collect();
        assert_eq!(rates[3], 1.125);
        assert_eq!(rates[7], 0.125);
    }
}
