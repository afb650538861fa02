use crate::{LayerForwardContext, Tensor};

/// Implements Leaky ReLU activation function.
#[derive(Debug, Clone)]
pub struct LeakyReLU {
    /// Slope for negative input values, can be 0.0 for normal ReLU
    alpha: f32,
}

#[derive(Debug)]
pub struct LeakyReLUForwardContext {
    pub mask: Vec<bool>,
}

impl LeakyReLU {
    pub fn new(alpha: f32) -> Self {
        LeakyReLU { alpha }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn forward(&self, input: Tensor) -> (Tensor, LayerForwardContext) {
        let mut output = input;
        let mask = output.data.iter().map(|&val| val > 0.0).collect();

        for val in output.data.iter_mut().filter(|val| **val <= 0.0) {
            *val *= self.alpha;
        }

        (
            output,
            LayerForwardContext::LeakyReLU(LeakyReLUForwardContext { mask }),
        )
    }

    /// Gradient is 1 for positive inputs, alpha otherwise
    pub fn backward(&self, grad_output: Tensor, context: &LeakyReLUForwardContext) -> Tensor {
        let mut output = grad_output;
        for (grad, _) in output
            .data
            .iter_mut()
            .zip(&context.mask)
            .filter(|(_, was_positive)| !**was_positive)
        {
            *grad *= self.alpha;
        }
        output
    }
}
