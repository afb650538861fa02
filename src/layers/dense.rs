use crate::{LayerBackwardContext, LayerForwardContext, Tensor};
use rand::Rng;
use rand_distr::StandardNormal;

/// Implements a fully-connected (dense) neural network layer.
#[derive(Debug, Clone)]
pub struct Dense {
    /// Weight matrix for linear transformation
    pub weights: Tensor,
    /// Bias vector added to weighted inputs
    pub bias: Tensor,
    /// Accumulated gradients for weights
    pub grad_weights: Tensor,
    /// Accumulated gradients for bias
    pub grad_bias: Tensor,
}

#[derive(Debug)]
pub struct DenseForwardContext {
    pub input: Tensor,
}

#[derive(Debug)]
pub struct DenseBackwardContext {
    pub grad_weights: Tensor,
    pub grad_bias: Tensor,
}

impl Dense {
    /// Creates a new dense layer with He initialization scaled for LeakyReLU,
    /// drawing weights from `rng` so runs can be reproduced from a seed
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        leaky_relu_alpha: f32,
        rng: &mut R,
    ) -> Self {
        let weight_scale =
            (2.0 / ((1.0 + leaky_relu_alpha.powi(2)) * input_size.max(1) as f32)).sqrt();

        let weights = (0..input_size * output_size)
            .map(|_| rng.sample::<f32, _>(StandardNormal) * weight_scale)
            .collect();
        let weights = Tensor::new_with_shape(weights, (input_size, output_size));
        let bias = Tensor::zeros((1, output_size));

        Dense {
            grad_weights: weights.zeros_like(),
            grad_bias: bias.zeros_like(),
            weights,
            bias,
        }
    }

    pub fn forward(&self, input: Tensor) -> (Tensor, LayerForwardContext) {
        let mut output = input.matmul(&self.weights);
        let columns = output.shape.1;

        // Broadcast bias over the batch
        for row in output.data.chunks_mut(columns) {
            for (value, bias) in row.iter_mut().zip(&self.bias.data) {
                *value += bias;
            }
        }

        (
            output,
            LayerForwardContext::Dense(DenseForwardContext { input }),
        )
    }

    pub fn backward(
        &self,
        grad_output: Tensor,
        context: &DenseForwardContext,
    ) -> (Tensor, LayerBackwardContext) {
        let grad_input = grad_output.matmul(&self.weights.transpose());
        let grad_weights = context.input.transpose().matmul(&grad_output);
        let grad_bias = grad_output.sum_rows();

        (
            grad_input,
            LayerBackwardContext::Dense(DenseBackwardContext {
                grad_weights,
                grad_bias,
            }),
        )
    }

    /// Accumulates gradients from backward pass
    pub fn update_grads(&mut self, context: &DenseBackwardContext) {
        self.grad_weights = &self.grad_weights + &context.grad_weights;
        self.grad_bias = &self.grad_bias + &context.grad_bias;
    }

    /// Returns references to learnable parameters
    pub fn get_parameters(&self) -> Vec<&Tensor> {
        vec![&self.weights, &self.bias]
    }

    /// Returns mutable parameter references paired with their gradients
    pub fn get_parameter_pairs(&mut self) -> Vec<(&mut Tensor, &Tensor)> {
        vec![
            (&mut self.weights, &self.grad_weights),
            (&mut self.bias, &self.grad_bias),
        ]
    }

    /// Resets accumulated gradients to zero
    pub fn clear_grads(&mut self) {
        self.grad_weights.data.fill(0.0);
        self.grad_bias.data.fill(0.0);
    }
}
