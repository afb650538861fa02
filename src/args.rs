use crate::comparison::{ComparisonConfig, OptimizerKind};
use crate::lr_scheduler::ScheduleKind;
use clap::{error::ErrorKind, Parser};
use std::path::PathBuf;

/// Compares learning rate schedules on a synthetic two-moons classification task.
#[derive(Parser, Debug)]
#[command(name = "ratebench")]
struct Args {
    /// Number of training epochs per schedule
    #[arg(long, default_value_t = 100, value_parser = validate_positive)]
    epochs: usize,

    /// Number of samples in each minibatch
    #[arg(long, default_value_t = 32, value_parser = validate_positive)]
    batch_size: usize,

    /// Number of generated samples
    #[arg(long, default_value_t = 1000, value_parser = validate_samples)]
    samples: usize,

    /// Standard deviation of the Gaussian noise added to each point
    #[arg(long, default_value_t = 0.2, value_parser = validate_non_negative)]
    noise: f32,

    /// Fraction of the samples held out for testing
    #[arg(long, default_value_t = 0.2, value_parser = validate_ratio)]
    test_ratio: f32,

    /// Width of the hidden layers
    #[arg(long, default_value_t = 32, value_parser = validate_positive)]
    hidden: usize,

    /// Number of hidden layers
    #[arg(long, default_value_t = 2)]
    hidden_layers: usize,

    /// Reference learning rate shared by all schedules
    #[arg(long, default_value_t = 0.01, value_parser = validate_learning_rate)]
    base_lr: f32,

    /// Optimizer: sgd, momentum or adam
    #[arg(long, default_value = "sgd", value_parser = parse_optimizer)]
    optimizer: OptimizerKind,

    /// Seed for data generation, weight initialization and shuffling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Comma separated schedules to compare, all of them by default
    #[arg(long, value_delimiter = ',', value_parser = parse_schedule_kind)]
    schedules: Vec<ScheduleKind>,

    /// Log progress every N epochs, 0 disables it
    #[arg(long, default_value_t = 10)]
    log_every: usize,

    /// Training loss used to measure convergence speed
    #[arg(long, default_value_t = 0.3, value_parser = validate_non_negative)]
    loss_threshold: f32,

    /// Write per-epoch traces of every schedule to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Settings of one comparison session
#[derive(Debug, Clone)]
pub struct BenchSettings {
    pub comparison: ComparisonConfig,
    pub samples: usize,
    pub noise: f32,
    pub test_ratio: f32,
    pub schedules: Vec<ScheduleKind>,
    pub log_every: usize,
    pub loss_threshold: f32,
    pub output: Option<PathBuf>,
}

fn invalid_value(message: String) -> clap::Error {
    clap::Error::raw(ErrorKind::InvalidValue, message)
}

/// Validates a strictly positive integer
fn validate_positive(value: &str) -> Result<usize, clap::Error> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid_value(format!(
            "Expected a positive integer: {}",
            value
        ))),
    }
}

/// Validates that enough samples are generated for both moons
fn validate_samples(value: &str) -> Result<usize, clap::Error> {
    match value.parse::<usize>() {
        Ok(n) if n >= 4 => Ok(n),
        _ => Err(invalid_value(format!("Need at least 4 samples: {}", value))),
    }
}

fn validate_non_negative(value: &str) -> Result<f32, clap::Error> {
    match value.parse::<f32>() {
        Ok(x) if x.is_finite() && x >= 0.0 => Ok(x),
        _ => Err(invalid_value(format!(
            "Expected a non-negative number: {}",
            value
        ))),
    }
}

/// Validates a ratio in [0, 1)
fn validate_ratio(value: &str) -> Result<f32, clap::Error> {
    match value.parse::<f32>() {
        Ok(x) if (0.0..1.0).contains(&x) => Ok(x),
        _ => Err(invalid_value(format!(
            "Ratio must be in [0, 1): {}",
            value
        ))),
    }
}

fn validate_learning_rate(value: &str) -> Result<f32, clap::Error> {
    match value.parse::<f32>() {
        Ok(x) if x.is_finite() && x > 0.0 => Ok(x),
        _ => Err(invalid_value(format!(
            "Learning rate must be positive: {}",
            value
        ))),
    }
}

fn parse_optimizer(value: &str) -> Result<OptimizerKind, clap::Error> {
    value
        .parse()
        .map_err(|e| invalid_value(format!("{}", e)))
}

fn parse_schedule_kind(value: &str) -> Result<ScheduleKind, clap::Error> {
    value
        .trim()
        .parse()
        .map_err(|e| invalid_value(format!("{}", e)))
}

impl From<Args> for BenchSettings {
    fn from(args: Args) -> Self {
        let schedules = if args.schedules.is_empty() {
            ScheduleKind::ALL.to_vec()
        } else {
            args.schedules
        };

        BenchSettings {
            comparison: ComparisonConfig {
                epochs: args.epochs,
                minibatch_size: args.batch_size,
                hidden_size: args.hidden,
                hidden_layers: args.hidden_layers,
                optimizer: args.optimizer,
                base_lr: args.base_lr,
                seed: args.seed,
            },
            samples: args.samples,
            noise: args.noise,
            test_ratio: args.test_ratio,
            schedules,
            log_every: args.log_every,
            loss_threshold: args.loss_threshold,
            output: args.output,
        }
    }
}

/// Parses and validates command line arguments
pub fn parse_arguments() -> Result<BenchSettings, clap::Error> {
    Ok(Args::try_parse()?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<BenchSettings, clap::Error> {
        Args::try_parse_from(std::iter::once("ratebench").chain(args.iter().copied()))
            .map(BenchSettings::from)
    }

    #[test]
    fn test_defaults_compare_every_schedule() {
        let settings = parse(&[]).unwrap();
        assert_eq!(settings.schedules, ScheduleKind::ALL.to_vec());
        assert_eq!(settings.comparison.epochs, 100);
        assert_eq!(settings.comparison.optimizer, OptimizerKind::Sgd);
        assert!(settings.output.is_none());
    }

    #[test]
    fn test_schedule_list() {
        let settings = parse(&["--schedules", "cosine,one-cycle,plateau", "--optimizer", "adam"])
            .unwrap();
        assert_eq!(
            settings.schedules,
            vec![
                ScheduleKind::Cosine,
                ScheduleKind::OneCycle,
                ScheduleKind::Plateau
            ]
        );
        assert_eq!(settings.comparison.optimizer, OptimizerKind::Adam);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(parse(&["--schedules", "linear"]).is_err());
        assert!(parse(&["--test-ratio", "1.0"]).is_err());
        assert!(parse(&["--base-lr", "0"]).is_err());
        assert!(parse(&["--epochs", "0"]).is_err());
        assert!(parse(&["--samples", "3"]).is_err());
    }
}
