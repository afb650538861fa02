use crate::error::{invalid, Result, ScheduleError};
use crate::lr_scheduler::{ScheduleConfig, ScheduleEvent, ScheduleKind};
use crate::{
    evaluate_dataset, train_epoch, Adam, Dataset, Momentum, Network, NormalizationParams,
    Optimizer, TrainingConfig, TrainingStepDriver, SGD,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Error, Write};
use std::path::Path;
use std::str::FromStr;

/// Parameter update rule the compared runs share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizerKind {
    #[default]
    Sgd,
    Momentum,
    Adam,
}

impl OptimizerKind {
    pub fn name(self) -> &'static str {
        match self {
            OptimizerKind::Sgd => "sgd",
            OptimizerKind::Momentum => "momentum",
            OptimizerKind::Adam => "adam",
        }
    }

    /// Creates the optimizer with common default hyperparameters
    pub fn build(self, learning_rate: f32) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd => Box::new(SGD::new(learning_rate)),
            OptimizerKind::Momentum => Box::new(Momentum::new(learning_rate, 0.9)),
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate, 0.9, 0.999, 1e-8)),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" => Ok(OptimizerKind::Sgd),
            "momentum" => Ok(OptimizerKind::Momentum),
            "adam" => Ok(OptimizerKind::Adam),
            other => Err(invalid(format!("unknown optimizer '{other}'"))),
        }
    }
}

/// Training procedure shared by every compared schedule
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonConfig {
    pub epochs: usize,
    pub minibatch_size: usize,
    pub hidden_size: usize,
    pub hidden_layers: usize,
    pub optimizer: OptimizerKind,
    pub base_lr: f32,
    /// Seeds weight initialization and shuffling of every run
    pub seed: u64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            epochs: 100,
            minibatch_size: 32,
            hidden_size: 32,
            hidden_layers: 2,
            optimizer: OptimizerKind::Sgd,
            base_lr: 0.01,
            seed: 42,
        }
    }
}

impl ComparisonConfig {
    fn training(&self) -> TrainingConfig {
        TrainingConfig {
            minibatch_size: self.minibatch_size,
            epochs: self.epochs,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(invalid("epochs must be at least 1"));
        }
        if self.minibatch_size == 0 {
            return Err(invalid("minibatch size must be at least 1"));
        }
        if self.hidden_size == 0 {
            return Err(invalid("hidden size must be at least 1"));
        }
        Ok(())
    }
}

/// Outcome of one training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct EpochRecord {
    pub epoch: usize,
    /// Mean training loss over the epoch
    pub loss: f32,
    /// Training accuracy in percent
    pub accuracy: f32,
    /// Rate in force when the epoch started
    pub learning_rate: f32,
    pub event: Option<ScheduleEvent>,
}

/// Per-epoch history of a single schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RunTrace {
    pub kind: ScheduleKind,
    pub records: Vec<EpochRecord>,
    pub test_loss: f32,
    pub test_accuracy: f32,
}

impl RunTrace {
    pub fn final_loss(&self) -> Option<f32> {
        self.records.last().map(|record| record.loss)
    }

    pub fn best_loss(&self) -> Option<f32> {
        self.records.iter().map(|record| record.loss).reduce(f32::min)
    }

    /// First epoch whose loss is at or below `threshold`
    pub fn epochs_to_reach(&self, threshold: f32) -> Option<usize> {
        self.records
            .iter()
            .find(|record| record.loss <= threshold)
            .map(|record| record.epoch)
    }
}

/// Receives every epoch record as soon as it is produced
pub trait EpochObserver {
    fn on_epoch(&mut self, kind: ScheduleKind, record: &EpochRecord);
}

impl<F> EpochObserver for F
where
    F: FnMut(ScheduleKind, &EpochRecord),
{
    fn on_epoch(&mut self, kind: ScheduleKind, record: &EpochRecord) {
        self(kind, record)
    }
}

/// Trains one freshly initialized network per schedule under identical
/// data order and initial weights, collecting one trace per schedule
pub struct ScheduleRunner<'a> {
    config: ComparisonConfig,
    observer: Option<Box<dyn EpochObserver + 'a>>,
}

impl<'a> ScheduleRunner<'a> {
    pub fn new(config: ComparisonConfig) -> Self {
        ScheduleRunner {
            config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl EpochObserver + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    pub fn steps_per_epoch(&self, train_samples: usize) -> usize {
        self.config.training().steps_per_epoch(train_samples)
    }

    /// Default parameters of each kind, sized for this runner's epochs and batches
    pub fn default_configs(&self, kinds: &[ScheduleKind], train_samples: usize) -> Vec<ScheduleConfig> {
        let steps_per_epoch = self.steps_per_epoch(train_samples);
        kinds
            .iter()
            .map(|&kind| {
                ScheduleConfig::default_for(
                    kind,
                    self.config.base_lr,
                    self.config.epochs,
                    steps_per_epoch,
                )
            })
            .collect()
    }

    /// Runs every schedule in order.
    ///
    /// # Errors
    /// `InvalidConfiguration` for any bad schedule or procedure parameter,
    /// reported before any training starts
    pub fn run(
        &mut self,
        train: &Dataset,
        test: &Dataset,
        schedules: &[ScheduleConfig],
    ) -> Result<Vec<RunTrace>> {
        self.config.validate()?;
        if train.is_empty() {
            return Err(invalid("training set is empty"));
        }
        for schedule in schedules {
            schedule.validate(self.config.base_lr)?;
        }

        let norm_params = NormalizationParams::from_data(train);
        let mut traces = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            traces.push(self.run_one(schedule.clone(), train, test, &norm_params)?);
        }

        Ok(traces)
    }

    fn run_one(
        &mut self,
        schedule: ScheduleConfig,
        train: &Dataset,
        test: &Dataset,
        norm_params: &NormalizationParams,
    ) -> Result<RunTrace> {
        let config = &self.config;
        let kind = schedule.kind();
        info!(
            "training with {} schedule for {} epochs, base lr {}",
            kind, config.epochs, config.base_lr
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut network = Network::binary_classifier(
            train.feature_count,
            config.hidden_size,
            config.hidden_layers,
            config.optimizer.build(config.base_lr),
            &mut rng,
        );
        let mut driver = TrainingStepDriver::new(schedule.build(config.base_lr)?);
        driver.begin(network.optimizer.as_mut());

        let mut records = Vec::with_capacity(config.epochs);
        for epoch in 0..config.epochs {
            let stats = train_epoch(
                &mut network,
                &mut driver,
                train,
                norm_params,
                config.minibatch_size,
                &mut rng,
            )?;
            debug!("{} epoch {} took {:.2?}", kind, epoch, stats.duration);
            let record = EpochRecord {
                epoch,
                loss: stats.loss,
                accuracy: stats.accuracy,
                learning_rate: stats.learning_rate,
                event: stats.event,
            };
            if let Some(observer) = self.observer.as_mut() {
                observer.on_epoch(kind, &record);
            }
            records.push(record);
        }

        let evaluation = evaluate_dataset(&network, test, norm_params, config.minibatch_size);
        info!(
            "{} finished: test loss {:.4}, test accuracy {:.2}%",
            kind, evaluation.loss, evaluation.accuracy
        );

        Ok(RunTrace {
            kind,
            records,
            test_loss: evaluation.loss,
            test_accuracy: evaluation.accuracy,
        })
    }
}

/// Writes all traces in long format, one row per (schedule, epoch)
pub fn write_traces_csv<W: Write>(traces: &[RunTrace], mut writer: W) -> Result<(), Error> {
    writeln!(writer, "schedule,epoch,loss,accuracy,learning_rate,event")?;
    for trace in traces {
        for record in &trace.records {
            let event = record.event.map(|event| event.to_string()).unwrap_or_default();
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                trace.kind, record.epoch, record.loss, record.accuracy, record.learning_rate, event
            )?;
        }
    }
    writer.flush()
}

/// Saves traces as CSV at `path`
pub fn save_traces_csv(traces: &[RunTrace], path: impl AsRef<Path>) -> Result<(), Error> {
    let file = File::create(path)?;
    write_traces_csv(traces, BufWriter::new(file))
}

/// Convergence figures of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub kind: ScheduleKind,
    pub final_loss: f32,
    pub best_loss: f32,
    /// First epoch reaching the loss threshold, if any
    pub epochs_to_threshold: Option<usize>,
    pub final_lr: f32,
    pub test_accuracy: f32,
}

/// Summarizes each trace for side-by-side comparison
pub fn summarize(traces: &[RunTrace], loss_threshold: f32) -> Vec<RunSummary> {
    traces
        .iter()
        .map(|trace| RunSummary {
            kind: trace.kind,
            final_loss: trace.final_loss().unwrap_or(f32::NAN),
            best_loss: trace.best_loss().unwrap_or(f32::NAN),
            epochs_to_threshold: trace.epochs_to_reach(loss_threshold),
            final_lr: trace
                .records
                .last()
                .map(|record| record.learning_rate)
                .unwrap_or(f32::NAN),
            test_accuracy: trace.test_accuracy,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{make_moons, split_data};

    fn datasets() -> (Dataset, Dataset) {
        let mut rng = StdRng::seed_from_u64(21);
        let moons = make_moons(120, 0.1, &mut rng);
        split_data(&moons, 0.25, &mut rng)
    }

    fn small_config() -> ComparisonConfig {
        ComparisonConfig {
            epochs: 4,
            minibatch_size: 16,
            hidden_size: 8,
            hidden_layers: 1,
            optimizer: OptimizerKind::Sgd,
            base_lr: 0.1,
            seed: 3,
        }
    }

    #[test]
    fn test_first_epoch_identical_across_schedules() {
        let (train, test) = datasets();
        let mut runner = ScheduleRunner::new(small_config());
        let schedules = [
            ScheduleConfig::None,
            ScheduleConfig::Step {
                step_size: 1,
                gamma: 0.5,
            },
        ];
        let traces = runner.run(&train, &test, &schedules).unwrap();

        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].kind, ScheduleKind::None);
        assert_eq!(traces[1].kind, ScheduleKind::Step);
        assert_eq!(traces[0].records[0].loss, traces[1].records[0].loss);
        assert_eq!(traces[0].records[0].learning_rate, 0.1);
        assert_eq!(traces[1].records[1].learning_rate, 0.05);
        assert_ne!(traces[0].records[3].loss, traces[1].records[3].loss);
    }

    #[test]
    fn test_repeated_kind_gets_independent_state() {
        let (train, test) = datasets();
        let mut runner = ScheduleRunner::new(small_config());
        let schedule = ScheduleConfig::Exponential { gamma: 0.9 };
        let traces = runner
            .run(&train, &test, &[schedule.clone(), schedule])
            .unwrap();
        assert_eq!(traces[0], traces[1]);
    }

    #[test]
    fn test_invalid_schedule_rejected_before_training() {
        let (train, test) = datasets();
        let mut calls = 0;
        let result = {
            let mut runner =
                ScheduleRunner::new(small_config()).with_observer(|_: ScheduleKind, _: &EpochRecord| {
                    calls += 1
                });
            runner.run(
                &train,
                &test,
                &[ScheduleConfig::None, ScheduleConfig::Exponential { gamma: 1.5 }],
            )
        };
        assert!(matches!(result, Err(ScheduleError::InvalidConfiguration(_))));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_observer_sees_every_epoch() {
        let (train, test) = datasets();
        let mut seen = Vec::new();
        {
            let mut runner = ScheduleRunner::new(small_config()).with_observer(
                |kind: ScheduleKind, record: &EpochRecord| seen.push((kind, record.epoch)),
            );
            let kinds = [ScheduleKind::Cosine, ScheduleKind::OneCycle];
            let schedules = runner.default_configs(&kinds, train.len());
            runner.run(&train, &test, &schedules).unwrap();
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(seen[0], (ScheduleKind::Cosine, 0));
        assert_eq!(seen[7], (ScheduleKind::OneCycle, 3));
    }

    #[test]
    fn test_default_configs_follow_runner() {
        let runner = ScheduleRunner::new(small_config());
        assert_eq!(runner.steps_per_epoch(90), 6);
        let configs = runner.default_configs(&ScheduleKind::ALL, 90);
        assert_eq!(configs.len(), ScheduleKind::ALL.len());
        for (config, kind) in configs.iter().zip(ScheduleKind::ALL) {
            assert_eq!(config.kind(), kind);
            assert!(config.validate(0.1).is_ok());
        }
    }

    #[test]
    fn test_csv_and_summary() {
        let trace = RunTrace {
            kind: ScheduleKind::Plateau,
            records: vec![
                EpochRecord {
                    epoch: 0,
                    loss: 0.5,
                    accuracy: 80.0,
                    learning_rate: 0.1,
                    event: None,
                },
                EpochRecord {
                    epoch: 1,
                    loss: 0.25,
                    accuracy: 90.0,
                    learning_rate: 0.1,
                    event: Some(ScheduleEvent::Reduced { from: 0.1, to: 0.05 }),
                },
            ],
            test_loss: 0.3,
            test_accuracy: 88.0,
        };

        let mut buffer = Vec::new();
        write_traces_csv(std::slice::from_ref(&trace), &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "schedule,epoch,loss,accuracy,learning_rate,event");
        assert_eq!(lines[1], "plateau,0,0.5,80,0.1,");
        assert!(lines[2].starts_with("plateau,1,0.25,90,0.1,reduced"));

        let summary = &summarize(&[trace], 0.3)[0];
        assert_eq!(summary.final_loss, 0.25);
        assert_eq!(summary.best_loss, 0.25);
        assert_eq!(summary.epochs_to_threshold, Some(1));
        assert_eq!(summary.test_accuracy, 88.0);
    }

    #[test]
    fn test_optimizer_kind_parsing() {
        assert_eq!("Adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
        assert_eq!(OptimizerKind::Momentum.to_string(), "momentum");
        assert!("rmsprop".parse::<OptimizerKind>().is_err());
        assert_eq!(OptimizerKind::Sgd.build(0.3).learning_rate(), 0.3);
    }
}
