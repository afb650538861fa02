use crate::NormalizationParams;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f32::consts::PI;

/// In-memory binary classification dataset, features stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub features: Vec<f32>,
    /// 0.0 or 1.0 per sample
    pub labels: Vec<f32>,
    pub feature_count: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Feature vector and label of sample `index`
    pub fn sample(&self, index: usize) -> (&[f32], f32) {
        let start = index * self.feature_count;
        (
            &self.features[start..start + self.feature_count],
            self.labels[index],
        )
    }

    /// Copies the given samples, in order, into a new dataset
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        let mut features = Vec::with_capacity(indices.len() * self.feature_count);
        let mut labels = Vec::with_capacity(indices.len());
        for &index in indices {
            let (values, label) = self.sample(index);
            features.extend_from_slice(values);
            labels.push(label);
        }
        Dataset {
            features,
            labels,
            feature_count: self.feature_count,
        }
    }
}

/// Generates two interleaving half circles with Gaussian noise,
/// half of the samples in each class
pub fn make_moons<R: Rng + ?Sized>(samples: usize, noise: f32, rng: &mut R) -> Dataset {
    let outer = samples / 2;
    let inner = samples - outer;

    let mut features = Vec::with_capacity(samples * 2);
    let mut labels = Vec::with_capacity(samples);

    let mut push = |x: f32, y: f32, label: f32, rng: &mut R| {
        let jitter_x: f32 = rng.sample(StandardNormal);
        let jitter_y: f32 = rng.sample(StandardNormal);
        features.push(x + noise * jitter_x);
        features.push(y + noise * jitter_y);
        labels.push(label);
    };

    for i in 0..outer {
        let angle = PI * i as f32 / (outer.max(2) - 1) as f32;
        push(angle.cos(), angle.sin(), 0.0, rng);
    }
    for i in 0..inner {
        let angle = PI * i as f32 / (inner.max(2) - 1) as f32;
        push(1.0 - angle.cos(), 0.5 - angle.sin(), 1.0, rng);
    }

    Dataset {
        features,
        labels,
        feature_count: 2,
    }
}

/// Returns sample indices for one pass over the data, optionally shuffled
pub fn prepare_data_iteration<R: Rng + ?Sized>(
    len: usize,
    shuffle: bool,
    rng: &mut R,
) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    if shuffle {
        indices.shuffle(rng);
    }
    indices
}

/// Shuffles once and splits data into training and test sets
///
/// # Returns
/// Tuple of (train, test)
pub fn split_data<R: Rng + ?Sized>(
    dataset: &Dataset,
    test_ratio: f32,
    rng: &mut R,
) -> (Dataset, Dataset) {
    let indices = prepare_data_iteration(dataset.len(), true, rng);
    let test_size = (dataset.len() as f32 * test_ratio) as usize;

    let (test_indices, train_indices) = indices.split_at(test_size);
    (dataset.subset(train_indices), dataset.subset(test_indices))
}

/// Gathers and normalizes the samples at `indices`
///
/// # Returns
/// (normalized inputs, targets)
pub fn load_batch(
    dataset: &Dataset,
    indices: &[usize],
    norm_params: &NormalizationParams,
) -> (Vec<f32>, Vec<f32>) {
    let mut inputs = Vec::with_capacity(indices.len() * dataset.feature_count);
    let mut targets = Vec::with_capacity(indices.len());

    for &index in indices {
        let (values, label) = dataset.sample(index);
        inputs.extend(norm_params.normalize(values));
        targets.push(label);
    }

    (inputs, targets)
}
