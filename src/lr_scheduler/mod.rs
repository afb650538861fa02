use crate::error::{Result, ScheduleError};
use log::{debug, info};
use std::fmt;
use std::str::FromStr;

mod config;
mod constant;
mod cosine;
mod cosine_restart;
mod cyclic;
mod exponential;
mod multi_step;
mod one_cycle;
mod plateau;
mod step_decay;

pub use config::ScheduleConfig;
pub use constant::Constant;
pub use cosine::CosineAnnealing;
pub use cosine_restart::CosineWarmRestarts;
pub use cyclic::{Cyclic, CyclicMode};
pub use exponential::Exponential;
pub use multi_step::MultiStep;
pub use one_cycle::{AnnealStrategy, MomentumRange, OneCycle};
pub use plateau::ReduceOnPlateau;
pub use step_decay::StepDecay;

/// Smallest learning rate a scheduler will ever hand out
pub const LR_FLOOR: f32 = 1e-8;

/// Whether a policy updates after every mini-batch or after every epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Step,
    Epoch,
}

/// The closed set of learning rate policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    None,
    Step,
    MultiStep,
    Exponential,
    Cosine,
    Plateau,
    OneCycle,
    Cyclic,
    CosineRestart,
}

impl ScheduleKind {
    /// Every kind, in the order they are usually compared
    pub const ALL: [ScheduleKind; 9] = [
        ScheduleKind::None,
        ScheduleKind::Step,
        ScheduleKind::MultiStep,
        ScheduleKind::Exponential,
        ScheduleKind::Cosine,
        ScheduleKind::Plateau,
        ScheduleKind::OneCycle,
        ScheduleKind::Cyclic,
        ScheduleKind::CosineRestart,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScheduleKind::None => "none",
            ScheduleKind::Step => "step",
            ScheduleKind::MultiStep => "multistep",
            ScheduleKind::Exponential => "exponential",
            ScheduleKind::Cosine => "cosine",
            ScheduleKind::Plateau => "plateau",
            ScheduleKind::OneCycle => "one_cycle",
            ScheduleKind::Cyclic => "cyclic",
            ScheduleKind::CosineRestart => "cosine_restart",
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            ScheduleKind::OneCycle | ScheduleKind::Cyclic => Granularity::Step,
            _ => Granularity::Epoch,
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScheduleKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ScheduleKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                ScheduleError::InvalidConfiguration(format!("unknown schedule kind: {s}"))
            })
    }
}

/// Progress of one training run as seen by its scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    /// Policy this state belongs to
    pub kind: ScheduleKind,
    /// Reference learning rate the run started from
    pub base_lr: f32,
    /// Number of completed epochs
    pub epoch_index: usize,
    /// Number of completed optimization steps over the whole run
    pub step_index: usize,
    /// Rate to apply to the next optimization step
    pub current_lr: f32,
}

impl ScheduleState {
    fn new(kind: ScheduleKind, base_lr: f32, current_lr: f32) -> Self {
        ScheduleState {
            kind,
            base_lr,
            epoch_index: 0,
            step_index: 0,
            current_lr,
        }
    }

    /// Index of the epoch that follows the one just completed
    pub fn next_epoch(&self) -> usize {
        self.epoch_index + 1
    }

    /// Index of the step that follows the one just completed
    pub fn next_step(&self) -> usize {
        self.step_index + 1
    }
}

/// Notable transitions a policy may report after a hook call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleEvent {
    /// Plateau policy cut the rate
    Reduced { from: f32, to: f32 },
    /// Restart policy began a new cycle
    Restarted { epoch: usize, cycle_length: usize },
}

impl fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleEvent::Reduced { from, to } => write!(f, "reduced {from:.3e}->{to:.3e}"),
            ScheduleEvent::Restarted {
                epoch,
                cycle_length,
            } => write!(f, "restart@{epoch} len={cycle_length}"),
        }
    }
}

/// Two-hook contract every learning rate policy implements.
///
/// Hooks receive the state describing the step or epoch that just completed
/// (its index not yet incremented) and return the rate for the next one.
/// Either hook may be a no-op, in which case the current rate is kept.
pub trait SchedulePolicy: fmt::Debug + Send {
    fn kind(&self) -> ScheduleKind;

    /// Rate in force before the first optimization step
    fn initial_lr(&self, base_lr: f32) -> f32;

    /// Called after every mini-batch
    fn on_step(&mut self, state: &ScheduleState) -> f32 {
        state.current_lr
    }

    /// Called once per completed epoch with the mean loss over that epoch
    fn on_epoch(&mut self, state: &ScheduleState, _epoch_loss: f32) -> f32 {
        state.current_lr
    }

    /// Momentum to pair with the current rate, for policies that cycle it
    fn momentum(&self, _state: &ScheduleState) -> Option<f32> {
        None
    }

    /// Transition caused by the most recent hook call, if any
    fn take_event(&mut self) -> Option<ScheduleEvent> {
        None
    }
}

/// One policy instance together with the run progress it is driven by
#[derive(Debug)]
pub struct Scheduler {
    state: ScheduleState,
    policy: Box<dyn SchedulePolicy>,
    last_event: Option<ScheduleEvent>,
}

impl Scheduler {
    /// Validates `config` and builds a scheduler starting at epoch 0, step 0
    pub fn new(config: ScheduleConfig, base_lr: f32) -> Result<Self> {
        config.build(base_lr)
    }

    pub(crate) fn from_policy(base_lr: f32, policy: Box<dyn SchedulePolicy>) -> Self {
        let current_lr = sanitize(policy.initial_lr(base_lr), base_lr);
        Scheduler {
            state: ScheduleState::new(policy.kind(), base_lr, current_lr),
            policy,
            last_event: None,
        }
    }

    pub fn kind(&self) -> ScheduleKind {
        self.state.kind
    }

    pub fn granularity(&self) -> Granularity {
        self.state.kind.granularity()
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Rate to apply to the next optimization step; never mutates anything
    pub fn current_lr(&self) -> f32 {
        self.state.current_lr
    }

    /// Momentum companion to the current rate, if the policy provides one
    pub fn momentum(&self) -> Option<f32> {
        self.policy.momentum(&self.state)
    }

    /// Transition reported by the most recent hook call
    pub fn last_event(&self) -> Option<ScheduleEvent> {
        self.last_event
    }

    /// Fires the per-step hook for the step `step_index` that just completed
    ///
    /// # Errors
    /// `SequenceViolation` if the policy has no step-level semantics or
    /// `step_index` is not the next expected step
    pub fn on_step(&mut self, step_index: usize) -> Result<f32> {
        if self.granularity() != Granularity::Step {
            return Err(ScheduleError::SequenceViolation(format!(
                "{} does not update per step",
                self.kind()
            )));
        }
        check_index("step", self.state.step_index, step_index)?;

        let lr = sanitize(self.policy.on_step(&self.state), self.state.current_lr);
        self.last_event = self.policy.take_event();
        self.state.current_lr = lr;
        self.state.step_index += 1;

        Ok(lr)
    }

    /// Fires the per-epoch hook for the epoch `epoch_index` that just completed.
    /// Step-granular policies only advance the epoch counter.
    ///
    /// # Errors
    /// `SequenceViolation` if `epoch_index` is not the next expected epoch
    pub fn on_epoch(&mut self, epoch_index: usize, epoch_loss: f32) -> Result<f32> {
        check_index("epoch", self.state.epoch_index, epoch_index)?;

        self.last_event = None;
        if self.granularity() == Granularity::Epoch {
            let previous = self.state.current_lr;
            let lr = sanitize(self.policy.on_epoch(&self.state, epoch_loss), previous);
            self.last_event = self.policy.take_event();
            self.state.current_lr = lr;

            debug!(
                "{} epoch {} loss {:.6}: lr {:.6e} -> {:.6e}",
                self.kind(),
                epoch_index,
                epoch_loss,
                previous,
                lr
            );
        }
        if let Some(event) = self.last_event {
            info!("{} epoch {}: {}", self.kind(), epoch_index, event);
        }
        self.state.epoch_index += 1;

        Ok(self.state.current_lr)
    }

    /// Counts a completed step without firing any hook,
    /// used for policies that only update per epoch
    pub fn record_step(&mut self) {
        self.state.step_index += 1;
    }
}

fn check_index(what: &str, expected: usize, got: usize) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(ScheduleError::SequenceViolation(format!(
            "expected {what} index {expected}, got {got}"
        )))
    }
}

/// Keeps a rate strictly positive and finite, falling back to the last good rate
fn sanitize(lr: f32, fallback: f32) -> f32 {
    if lr.is_finite() {
        lr.max(LR_FLOOR)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_close;

    fn default_scheduler(kind: ScheduleKind) -> Scheduler {
        Scheduler::new(ScheduleConfig::default_for(kind, 0.01, 100, 10), 0.01).unwrap()
    }

    /// Runs `epochs` full epochs of `steps_per_epoch` steps with a constant loss
    fn drive(scheduler: &mut Scheduler, epochs: usize, steps_per_epoch: usize) -> Vec<f32> {
        let mut rates = vec![scheduler.current_lr()];
        for epoch in 0..epochs {
            for _ in 0..steps_per_epoch {
                if scheduler.granularity() == Granularity::Step {
                    let step = scheduler.state().step_index;
                    rates.push(scheduler.on_step(step).unwrap());
                } else {
                    scheduler.record_step();
                }
            }
            rates.push(scheduler.on_epoch(epoch, 1.0).unwrap());
        }
        rates
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ScheduleKind::ALL {
            assert_eq!(kind.name().parse::<ScheduleKind>().unwrap(), kind);
        }
        assert_eq!(
            "One-Cycle".parse::<ScheduleKind>().unwrap(),
            ScheduleKind::OneCycle
        );
        assert!("warmup".parse::<ScheduleKind>().is_err());
    }

    #[test]
    fn test_granularity() {
        assert_eq!(ScheduleKind::OneCycle.granularity(), Granularity::Step);
        assert_eq!(ScheduleKind::Cyclic.granularity(), Granularity::Step);
        assert_eq!(ScheduleKind::Plateau.granularity(), Granularity::Epoch);
        assert_eq!(ScheduleKind::None.granularity(), Granularity::Epoch);
    }

    #[test]
    fn test_all_rates_positive_and_finite() {
        for kind in ScheduleKind::ALL {
            let mut scheduler = default_scheduler(kind);
            // Runs past the configured horizon on purpose
            for lr in drive(&mut scheduler, 120, 10) {
                assert!(lr > 0.0 && lr.is_finite(), "{kind}: {lr}");
            }
        }
    }

    #[test]
    fn test_indices_only_advance() {
        let mut scheduler = default_scheduler(ScheduleKind::Cyclic);
        drive(&mut scheduler, 3, 10);
        assert_eq!(scheduler.state().epoch_index, 3);
        assert_eq!(scheduler.state().step_index, 30);

        let rewind = scheduler.on_step(29);
        assert!(matches!(rewind, Err(ScheduleError::SequenceViolation(_))));
        let skip = scheduler.on_epoch(5, 1.0);
        assert!(matches!(skip, Err(ScheduleError::SequenceViolation(_))));

        assert_eq!(scheduler.state().epoch_index, 3);
        assert_eq!(scheduler.state().step_index, 30);
    }

    #[test]
    fn test_on_step_rejected_for_epoch_policies() {
        let mut scheduler = default_scheduler(ScheduleKind::Step);
        let result = scheduler.on_step(0);
        assert!(matches!(result, Err(ScheduleError::SequenceViolation(_))));
        assert_eq!(scheduler.state().step_index, 0);
    }

    #[test]
    fn test_on_epoch_is_noop_for_step_policies() {
        let mut scheduler = default_scheduler(ScheduleKind::OneCycle);
        scheduler.on_step(0).unwrap();
        let before = scheduler.current_lr();
        let after = scheduler.on_epoch(0, 0.5).unwrap();
        assert_eq!(before, after);
        assert_eq!(scheduler.state().epoch_index, 1);
    }

    #[test]
    fn test_current_lr_is_idempotent() {
        for kind in ScheduleKind::ALL {
            let mut scheduler = default_scheduler(kind);
            drive(&mut scheduler, 7, 10);
            let first = scheduler.current_lr();
            let second = scheduler.current_lr();
            assert_eq!(first, second);
            assert_eq!(scheduler.state().epoch_index, 7);
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(0.0, 0.1), LR_FLOOR);
        assert_eq!(sanitize(-1.0, 0.1), LR_FLOOR);
        assert_eq!(sanitize(f32::NAN, 0.1), 0.1);
        assert_eq!(sanitize(f32::INFINITY, 0.1), 0.1);
        assert_close(sanitize(0.05, 0.1), 0.05, 0.0);
    }

    #[test]
    fn test_independent_instances() {
        let mut first = default_scheduler(ScheduleKind::Plateau);
        let second = default_scheduler(ScheduleKind::Plateau);
        drive(&mut first, 20, 1);
        assert!(first.current_lr() < second.current_lr());
        assert_eq!(second.state().epoch_index, 0);
    }
}
