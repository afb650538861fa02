use crate::Dataset;

/// Per-feature standardization parameters,
/// statistics accumulated in f64 for accuracy
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationParams {
    pub means: Vec<f32>,
    pub std_devs: Vec<f32>,
}

impl NormalizationParams {
    /// Computes mean and standard deviation of every feature column
    pub fn from_data(dataset: &Dataset) -> Self {
        let columns = dataset.feature_count;
        let count = dataset.len().max(1) as f64;

        let mut sums = vec![0.0f64; columns];
        for row in dataset.features.chunks(columns.max(1)) {
            for (sum, &value) in sums.iter_mut().zip(row) {
                *sum += value as f64;
            }
        }
        let means: Vec<f64> = sums.iter().map(|sum| sum / count).collect();

        let mut squares = vec![0.0f64; columns];
        for row in dataset.features.chunks(columns.max(1)) {
            for ((square, &value), mean) in squares.iter_mut().zip(row).zip(&means) {
                let diff = value as f64 - mean;
                *square += diff * diff;
            }
        }

        // Constant columns are left unscaled
        let std_devs = squares
            .iter()
            .map(|square| {
                let std_dev = (square / count).sqrt();
                if std_dev > f64::EPSILON {
                    std_dev as f32
                } else {
                    1.0
                }
            })
            .collect();

        Self {
            means: means.into_iter().map(|mean| mean as f32).collect(),
            std_devs,
        }
    }

    pub fn normalize<'a>(&'a self, values: &'a [f32]) -> impl Iterator<Item = f32> + 'a {
        values
            .iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(value, (mean, std_dev))| (value - mean) / std_dev)
    }
}
