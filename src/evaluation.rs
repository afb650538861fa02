use crate::{load_batch, process_batch, Dataset, Network, NormalizationParams, Tensor};

/// Counts predictions on the right side of the 0.5 decision threshold
///
/// # Arguments
/// * `output` - Predicted probabilities of the positive class, shape (n, 1)
/// * `targets` - Ground truth labels, 0.0 or 1.0
pub fn calculate_number_of_correct_outputs(output: &Tensor, targets: &[f32]) -> f32 {
    output
        .data
        .iter()
        .zip(targets)
        .filter(|&(&probability, &target)| (probability >= 0.5) == (target >= 0.5))
        .count() as f32
}

/// Calculates mean binary cross-entropy with numerical stability
///
/// # Arguments
/// * `output` - Predicted probabilities of the positive class
/// * `targets` - Ground truth labels
pub fn calculate_loss(output: &Tensor, targets: &[f32]) -> f32 {
    let epsilon = 1e-7; // Keeps ln away from zero
    let total: f32 = output
        .data
        .iter()
        .zip(targets)
        .map(|(&probability, &target)| {
            let p = probability.clamp(epsilon, 1.0 - epsilon);
            -(target * p.ln() + (1.0 - target) * (1.0 - p).ln())
        })
        .sum();

    total / targets.len().max(1) as f32
}

/// Loss and accuracy over a whole dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationStats {
    pub loss: f32,
    /// Percentage of correct predictions
    pub accuracy: f32,
}

/// Evaluates the network on a dataset in mini-batches without updating it
pub fn evaluate_dataset(
    network: &Network,
    dataset: &Dataset,
    norm_params: &NormalizationParams,
    minibatch_size: usize,
) -> EvaluationStats {
    let indices: Vec<usize> = (0..dataset.len()).collect();

    let mut total_correct = 0.0;
    let mut total_loss = 0.0;

    for chunk in indices.chunks(minibatch_size.max(1)) {
        let (inputs, targets) = load_batch(dataset, chunk, norm_params);
        let results = process_batch(network, inputs, targets, dataset.feature_count, false);
        total_correct += results.correct;
        total_loss += results.loss * chunk.len() as f32;
    }

    let count = dataset.len().max(1) as f32;
    EvaluationStats {
        loss: total_loss / count,
        accuracy: total_correct / count * 100.0,
    }
}
