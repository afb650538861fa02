use super::{
    AnnealStrategy, Constant, CosineAnnealing, CosineWarmRestarts, Cyclic, CyclicMode,
    Exponential, MomentumRange, MultiStep, OneCycle, ReduceOnPlateau, ScheduleKind,
    SchedulePolicy, Scheduler, StepDecay,
};
use crate::error::{invalid, Result};

/// Construction parameters for each learning rate policy
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleConfig {
    /// Constant rate equal to `base_lr`
    None,

    /// Decay by `gamma` every `step_size` epochs
    Step {
        /// Number of epochs between decays
        step_size: usize,
        /// Multiplicative decay factor, in (0, 1]
        gamma: f32,
    },

    /// Decay by `gamma` each time a milestone epoch is reached
    MultiStep {
        /// Strictly increasing epoch indices
        milestones: Vec<usize>,
        /// Multiplicative decay factor, in (0, 1]
        gamma: f32,
    },

    /// Geometric decay by `gamma` every epoch
    Exponential {
        /// Multiplicative decay factor, in (0, 1]
        gamma: f32,
    },

    /// Half-cosine decay from `base_lr` to `lr_min` over `t_max` epochs
    Cosine {
        /// Number of epochs to reach `lr_min`
        t_max: usize,
        /// Final learning rate
        lr_min: f32,
    },

    /// Reduce by `factor` when the epoch loss stops improving
    Plateau {
        /// Multiplicative reduction factor, in (0, 1)
        factor: f32,
        /// Number of non-improving epochs tolerated before a reduction
        patience: usize,
        /// Minimum decrease of the loss that counts as an improvement
        threshold: f32,
        /// Rate never reduced below this value
        min_lr: Option<f32>,
    },

    /// Warm up to `max_lr`, then anneal to near zero, once over the run
    OneCycle {
        /// Peak learning rate
        max_lr: f32,
        /// Total number of optimization steps in the run
        total_steps: usize,
        /// Fraction of steps spent rising to `max_lr`
        pct_start: f32,
        /// Factor to divide base_lr by to get initial learning rate
        div_factor: f32,
        /// Factor to divide initial_lr by to get final learning rate
        final_div_factor: f32,
        /// Shape of both phases
        anneal: AnnealStrategy,
        /// Momentum cycled inversely to the rate, if set
        momentum: Option<MomentumRange>,
    },

    /// Triangular wave between `base_lr` and `max_lr`, measured in steps
    Cyclic {
        /// Upper bound of the wave
        max_lr: f32,
        /// Steps in the rising half of a cycle
        step_size_up: usize,
        /// Steps in the falling half, defaults to `step_size_up`
        step_size_down: Option<usize>,
        /// Amplitude policy across cycles
        mode: CyclicMode,
    },

    /// Cosine decay restarted every cycle, cycles growing by `t_mult`
    CosineRestart {
        /// Length of the first cycle in epochs
        t_0: usize,
        /// Cycle length multiplier applied at each restart
        t_mult: usize,
        /// Rate at the end of each cycle
        lr_min: f32,
    },
}

impl ScheduleConfig {
    /// Defaults for `kind` sized to a run of `epochs` epochs of `steps_per_epoch` steps
    pub fn default_for(
        kind: ScheduleKind,
        base_lr: f32,
        epochs: usize,
        steps_per_epoch: usize,
    ) -> Self {
        match kind {
            ScheduleKind::None => ScheduleConfig::None,
            ScheduleKind::Step => ScheduleConfig::Step {
                step_size: 10,
                gamma: 0.5,
            },
            ScheduleKind::MultiStep => {
                let mut milestones: Vec<usize> = [0.15, 0.40, 0.75]
                    .iter()
                    .map(|fraction| (epochs as f32 * fraction).round() as usize)
                    .filter(|&milestone| milestone > 0)
                    .collect();
                milestones.dedup();
                ScheduleConfig::MultiStep {
                    milestones,
                    gamma: 0.5,
                }
            }
            ScheduleKind::Exponential => ScheduleConfig::Exponential { gamma: 0.95 },
            ScheduleKind::Cosine => ScheduleConfig::Cosine {
                t_max: epochs.max(1),
                lr_min: 0.0,
            },
            ScheduleKind::Plateau => ScheduleConfig::Plateau {
                factor: 0.5,
                patience: 5,
                threshold: 1e-4,
                min_lr: Some(1e-6),
            },
            ScheduleKind::OneCycle => ScheduleConfig::OneCycle {
                max_lr: base_lr * 10.0,
                total_steps: (epochs * steps_per_epoch).max(1),
                pct_start: 0.3,
                div_factor: 25.0,
                final_div_factor: 1e4,
                anneal: AnnealStrategy::Cos,
                momentum: None,
            },
            ScheduleKind::Cyclic => ScheduleConfig::Cyclic {
                max_lr: base_lr * 10.0,
                step_size_up: (2 * steps_per_epoch).max(1),
                step_size_down: None,
                mode: CyclicMode::Triangular2,
            },
            ScheduleKind::CosineRestart => ScheduleConfig::CosineRestart {
                t_0: 10,
                t_mult: 2,
                lr_min: 0.0,
            },
        }
    }

    pub fn kind(&self) -> ScheduleKind {
        match self {
            ScheduleConfig::None => ScheduleKind::None,
            ScheduleConfig::Step { .. } => ScheduleKind::Step,
            ScheduleConfig::MultiStep { .. } => ScheduleKind::MultiStep,
            ScheduleConfig::Exponential { .. } => ScheduleKind::Exponential,
            ScheduleConfig::Cosine { .. } => ScheduleKind::Cosine,
            ScheduleConfig::Plateau { .. } => ScheduleKind::Plateau,
            ScheduleConfig::OneCycle { .. } => ScheduleKind::OneCycle,
            ScheduleConfig::Cyclic { .. } => ScheduleKind::Cyclic,
            ScheduleConfig::CosineRestart { .. } => ScheduleKind::CosineRestart,
        }
    }

    /// Checks every parameter against `base_lr` without building anything
    ///
    /// # Errors
    /// `InvalidConfiguration` describing the first offending parameter
    pub fn validate(&self, base_lr: f32) -> Result<()> {
        if !(base_lr.is_finite() && base_lr > 0.0) {
            return Err(invalid(format!("base_lr must be positive, got {base_lr}")));
        }

        match self {
            ScheduleConfig::None => Ok(()),
            ScheduleConfig::Step { step_size, gamma } => {
                check_gamma(*gamma)?;
                if *step_size < 1 {
                    return Err(invalid("step_size must be at least 1"));
                }
                Ok(())
            }
            ScheduleConfig::MultiStep { milestones, gamma } => {
                check_gamma(*gamma)?;
                if milestones.windows(2).any(|pair| pair[0] >= pair[1]) {
                    return Err(invalid(format!(
                        "milestones must be strictly increasing, got {milestones:?}"
                    )));
                }
                Ok(())
            }
            ScheduleConfig::Exponential { gamma } => check_gamma(*gamma),
            ScheduleConfig::Cosine { t_max, lr_min } => {
                if *t_max < 1 {
                    return Err(invalid("t_max must be at least 1"));
                }
                check_lr_min(*lr_min, base_lr)
            }
            ScheduleConfig::Plateau {
                factor,
                patience,
                threshold,
                min_lr,
            } => {
                if !(*factor > 0.0 && *factor < 1.0) {
                    return Err(invalid(format!("factor must be in (0, 1), got {factor}")));
                }
                if *patience < 1 {
                    return Err(invalid("patience must be at least 1"));
                }
                if !(threshold.is_finite() && *threshold >= 0.0) {
                    return Err(invalid(format!(
                        "threshold must be non-negative, got {threshold}"
                    )));
                }
                if let Some(min_lr) = min_lr {
                    if !(min_lr.is_finite() && *min_lr >= 0.0) {
                        return Err(invalid(format!(
                            "min_lr must be non-negative, got {min_lr}"
                        )));
                    }
                }
                Ok(())
            }
            ScheduleConfig::OneCycle {
                max_lr,
                total_steps,
                pct_start,
                div_factor,
                final_div_factor,
                momentum,
                ..
            } => {
                check_max_lr(*max_lr, base_lr)?;
                if *total_steps < 1 {
                    return Err(invalid("total_steps must be at least 1"));
                }
                if !(*pct_start > 0.0 && *pct_start < 1.0) {
                    return Err(invalid(format!(
                        "pct_start must be in (0, 1), got {pct_start}"
                    )));
                }
                if !(*div_factor >= 1.0 && *final_div_factor >= 1.0) {
                    return Err(invalid("div_factor and final_div_factor must be at least 1"));
                }
                if let Some(range) = momentum {
                    let in_range = |m: f32| (0.0..1.0).contains(&m);
                    if !(in_range(range.base) && in_range(range.max) && range.base <= range.max)
                    {
                        return Err(invalid(format!(
                            "momentum range must satisfy 0 <= base <= max < 1, got {range:?}"
                        )));
                    }
                }
                Ok(())
            }
            ScheduleConfig::Cyclic {
                max_lr,
                step_size_up,
                step_size_down,
                mode,
            } => {
                check_max_lr(*max_lr, base_lr)?;
                if *step_size_up < 1 || step_size_down.is_some_and(|down| down < 1) {
                    return Err(invalid("step sizes must be at least 1"));
                }
                if step_size_up
                    .checked_add(step_size_down.unwrap_or(*step_size_up))
                    .is_none()
                {
                    return Err(invalid("cycle length overflows"));
                }
                if let CyclicMode::ExpRange { gamma } = mode {
                    check_gamma(*gamma)?;
                }
                Ok(())
            }
            ScheduleConfig::CosineRestart { t_0, t_mult, lr_min } => {
                if *t_0 < 1 {
                    return Err(invalid("t_0 must be at least 1"));
                }
                if *t_mult < 1 {
                    return Err(invalid("t_mult must be at least 1"));
                }
                check_lr_min(*lr_min, base_lr)
            }
        }
    }

    /// Validates the parameters and builds a fresh scheduler
    pub fn build(self, base_lr: f32) -> Result<Scheduler> {
        self.validate(base_lr)?;

        let policy: Box<dyn SchedulePolicy> = match self {
            ScheduleConfig::None => Box::new(Constant),
            ScheduleConfig::Step { step_size, gamma } => Box::new(StepDecay::new(step_size, gamma)),
            ScheduleConfig::MultiStep { milestones, gamma } => {
                Box::new(MultiStep::new(milestones, gamma))
            }
            ScheduleConfig::Exponential { gamma } => Box::new(Exponential::new(gamma)),
            ScheduleConfig::Cosine { t_max, lr_min } => {
                Box::new(CosineAnnealing::new(t_max, lr_min))
            }
            ScheduleConfig::Plateau {
                factor,
                patience,
                threshold,
                min_lr,
            } => Box::new(ReduceOnPlateau::new(factor, patience, threshold, min_lr)),
            ScheduleConfig::OneCycle {
                max_lr,
                total_steps,
                pct_start,
                div_factor,
                final_div_factor,
                anneal,
                momentum,
            } => Box::new(OneCycle {
                max_lr,
                total_steps,
                pct_start,
                div_factor,
                final_div_factor,
                anneal,
                momentum,
            }),
            ScheduleConfig::Cyclic {
                max_lr,
                step_size_up,
                step_size_down,
                mode,
            } => Box::new(Cyclic::new(
                max_lr,
                step_size_up,
                step_size_down.unwrap_or(step_size_up),
                mode,
            )),
            ScheduleConfig::CosineRestart { t_0, t_mult, lr_min } => {
                Box::new(CosineWarmRestarts::new(t_0, t_mult, lr_min))
            }
        };

        Ok(Scheduler::from_policy(base_lr, policy))
    }
}

fn check_gamma(gamma: f32) -> Result<()> {
    if gamma > 0.0 && gamma <= 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("gamma must be in (0, 1], got {gamma}")))
    }
}

fn check_max_lr(max_lr: f32, base_lr: f32) -> Result<()> {
    if max_lr.is_finite() && max_lr > base_lr {
        Ok(())
    } else {
        Err(invalid(format!(
            "max_lr must exceed base_lr ({base_lr}), got {max_lr}"
        )))
    }
}

fn check_lr_min(lr_min: f32, base_lr: f32) -> Result<()> {
    if lr_min >= 0.0 && lr_min < base_lr {
        Ok(())
    } else {
        Err(invalid(format!(
            "lr_min must be in [0, base_lr), got {lr_min}"
        )))
    }
}
