use crate::error::Result;
use crate::lr_scheduler::{Granularity, ScheduleEvent, ScheduleKind, Scheduler};
use crate::Optimizer;

/// Routes training progress to the scheduler hook matching its policy's
/// granularity and writes the resulting rate into the optimizer.
///
/// Step-granular policies fire after every mini-batch and only count epochs;
/// epoch-granular policies fire after every epoch and only count steps.
#[derive(Debug)]
pub struct TrainingStepDriver {
    scheduler: Scheduler,
}

impl TrainingStepDriver {
    pub fn new(scheduler: Scheduler) -> Self {
        TrainingStepDriver { scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn kind(&self) -> ScheduleKind {
        self.scheduler.kind()
    }

    pub fn current_lr(&self) -> f32 {
        self.scheduler.current_lr()
    }

    pub fn last_event(&self) -> Option<ScheduleEvent> {
        self.scheduler.last_event()
    }

    /// Writes the initial rate into the optimizer before the first step
    pub fn begin(&self, optimizer: &mut dyn Optimizer) {
        self.apply(optimizer);
    }

    /// Call immediately after the gradients of one mini-batch were applied
    pub fn after_step(&mut self, optimizer: &mut dyn Optimizer) -> Result<f32> {
        match self.scheduler.granularity() {
            Granularity::Step => {
                let step = self.scheduler.state().step_index;
                self.scheduler.on_step(step)?;
            }
            Granularity::Epoch => self.scheduler.record_step(),
        }
        Ok(self.apply(optimizer))
    }

    /// Call once all steps of an epoch completed, with the mean loss over the epoch
    pub fn after_epoch(&mut self, epoch_loss: f32, optimizer: &mut dyn Optimizer) -> Result<f32> {
        let epoch = self.scheduler.state().epoch_index;
        self.scheduler.on_epoch(epoch, epoch_loss)?;
        Ok(self.apply(optimizer))
    }

    fn apply(&self, optimizer: &mut dyn Optimizer) -> f32 {
        let lr = self.scheduler.current_lr();
        optimizer.set_learning_rate(lr);
        if let Some(momentum) = self.scheduler.momentum() {
            optimizer.set_momentum(momentum);
        }
        lr
    }
}
