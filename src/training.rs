use crate::error::Result;
use crate::lr_scheduler::ScheduleEvent;
use crate::{
    calculate_loss, calculate_number_of_correct_outputs, load_batch, prepare_data_iteration,
    Dataset, LayerBackwardContext, Network, NormalizationParams, Tensor, TrainingStepDriver,
};
use rand::Rng;
use std::time::{Duration, Instant};

/// Configuration parameters for training
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Number of samples in each minibatch
    pub minibatch_size: usize,
    /// Number of training epochs
    pub epochs: usize,
}

impl TrainingConfig {
    /// Number of optimization steps in one epoch over `samples` samples
    pub fn steps_per_epoch(&self, samples: usize) -> usize {
        samples.div_ceil(self.minibatch_size.max(1))
    }
}

/// Results from processing a single batch
pub struct BatchResults {
    /// Predicted probabilities of the positive class
    pub output: Tensor,
    /// Number of correct predictions
    pub correct: f32,
    /// Mean loss over the batch
    pub loss: f32,
    /// Layer contexts from backward pass
    pub backward_contexts: Option<Vec<LayerBackwardContext>>,
}

/// Processes a single batch through the network
///
/// # Arguments
/// * `network` - Neural network model
/// * `inputs` - Batch input data, row-major
/// * `targets` - Target labels
/// * `feature_count` - Number of features per sample
/// * `training` - Whether to compute gradients
pub fn process_batch(
    network: &Network,
    inputs: Vec<f32>,
    targets: Vec<f32>,
    feature_count: usize,
    training: bool,
) -> BatchResults {
    let minibatch_size = targets.len();
    let input = Tensor::new_with_shape(inputs, (minibatch_size, feature_count));

    // Forward pass
    let (logits, forward_contexts) = network.forward(input);
    let output = logits.sigmoid();

    let correct = calculate_number_of_correct_outputs(&output, &targets);
    let loss = calculate_loss(&output, &targets);

    // Backward pass if training
    let backward_contexts = if training {
        // Sigmoid followed by binary cross-entropy has gradient (p - y) w.r.t. the logit
        let scale = 1.0 / minibatch_size.max(1) as f32;
        let output_grad_vec = output
            .data
            .iter()
            .zip(&targets)
            .map(|(&probability, &target)| (probability - target) * scale)
            .collect();

        let output_grad = Tensor::new_with_shape(output_grad_vec, (minibatch_size, 1));
        let (_, backward_contexts) = network.backward(output_grad, &forward_contexts);

        Some(backward_contexts)
    } else {
        None
    };

    BatchResults {
        output,
        correct,
        loss,
        backward_contexts,
    }
}

/// Statistics from a training epoch
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingStats {
    /// Classification accuracy
    pub accuracy: f32,
    /// Mean loss over all samples of the epoch
    pub loss: f32,
    /// Learning rate in force when the epoch started
    pub learning_rate: f32,
    /// Plateau reduction or restart triggered at the end of the epoch
    pub event: Option<ScheduleEvent>,
    /// Time taken for epoch
    pub duration: Duration,
}

/// Trains network for one epoch, handing control to the driver after every
/// mini-batch and once the epoch is complete
///
/// # Arguments
/// * `network` - Neural network model
/// * `driver` - Learning rate driver owning the run's scheduler
/// * `dataset` - Training data
/// * `norm_params` - Normalization parameters
/// * `minibatch_size` - Number of samples per optimization step
/// * `rng` - Source of the shuffling order
pub fn train_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    driver: &mut TrainingStepDriver,
    dataset: &Dataset,
    norm_params: &NormalizationParams,
    minibatch_size: usize,
    rng: &mut R,
) -> Result<TrainingStats> {
    let epoch_start = Instant::now();
    let learning_rate = driver.current_lr();
    let indices = prepare_data_iteration(dataset.len(), true, rng);

    let mut total_correct = 0.0;
    let mut total_loss = 0.0;

    for chunk in indices.chunks(minibatch_size.max(1)) {
        let (inputs, targets) = load_batch(dataset, chunk, norm_params);
        let results = process_batch(network, inputs, targets, dataset.feature_count, true);

        total_correct += results.correct;
        total_loss += results.loss * chunk.len() as f32;

        if let Some(backward_contexts) = results.backward_contexts {
            network.update_parameters(&backward_contexts);
        }
        driver.after_step(network.optimizer.as_mut())?;
    }

    let count = dataset.len().max(1) as f32;
    let loss = total_loss / count;
    driver.after_epoch(loss, network.optimizer.as_mut())?;

    Ok(TrainingStats {
        accuracy: (total_correct / count) * 100.0,
        loss,
        learning_rate,
        event: driver.last_event(),
        duration: epoch_start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr_scheduler::ScheduleConfig;
    use crate::test_utils::assert_close;
    use crate::{make_moons, SGD};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_process_batch_gradients_only_when_training() {
        let mut rng = StdRng::seed_from_u64(2);
        let network = Network::binary_classifier(2, 4, 1, Box::new(SGD::new(0.1)), &mut rng);

        let inputs = vec![0.1, 0.2, -0.3, 0.4];
        let targets = vec![1.0, 0.0];
        let eval = process_batch(&network, inputs.clone(), targets.clone(), 2, false);
        assert!(eval.backward_contexts.is_none());
        assert_eq!(eval.output.shape, (2, 1));

        let train = process_batch(&network, inputs, targets, 2, true);
        assert_eq!(train.backward_contexts.map(|contexts| contexts.len()), Some(3));
        assert_close(train.loss, eval.loss, 1e-7);
    }

    #[test]
    fn test_steps_per_epoch_rounds_up() {
        let config = TrainingConfig {
            minibatch_size: 32,
            epochs: 1,
        };
        assert_eq!(config.steps_per_epoch(64), 2);
        assert_eq!(config.steps_per_epoch(65), 3);
        assert_eq!(config.steps_per_epoch(0), 0);
    }

    #[test]
    fn test_train_epoch_advances_scheduler() {
        let mut rng = StdRng::seed_from_u64(4);
        let dataset = make_moons(100, 0.1, &mut rng);
        let norm = NormalizationParams::from_data(&dataset);
        let mut network = Network::binary_classifier(2, 8, 1, Box::new(SGD::new(1.0)), &mut rng);

        let config = ScheduleConfig::Step {
            step_size: 1,
            gamma: 0.5,
        };
        let mut driver = TrainingStepDriver::new(config.build(0.2).unwrap());
        driver.begin(network.optimizer.as_mut());

        let started = Instant::now();
        let stats = train_epoch(&mut network, &mut driver, &dataset, &norm, 32, &mut rng).unwrap();
        assert!(stats.duration <= started.elapsed());
        assert_eq!(stats.learning_rate, 0.2);
        assert!(stats.loss.is_finite());
        assert!((0.0..=100.0).contains(&stats.accuracy));
        assert!(stats.event.is_none());

        let state = driver.scheduler().state();
        assert_eq!(state.step_index, 4);
        assert_eq!(state.epoch_index, 1);
        assert_close(network.optimizer.learning_rate(), 0.1, 1e-7);
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(11);
        let dataset = make_moons(200, 0.1, &mut rng);
        let norm = NormalizationParams::from_data(&dataset);
        let mut network = Network::binary_classifier(2, 16, 1, Box::new(SGD::new(0.5)), &mut rng);
        let mut driver = TrainingStepDriver::new(ScheduleConfig::None.build(0.5).unwrap());
        driver.begin(network.optimizer.as_mut());

        let first = train_epoch(&mut network, &mut driver, &dataset, &norm, 16, &mut rng).unwrap();
        let mut last = first.clone();
        for _ in 0..20 {
            last = train_epoch(&mut network, &mut driver, &dataset, &norm, 16, &mut rng).unwrap();
        }
        assert!(last.loss < first.loss);
    }
}
