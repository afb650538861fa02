use crate::Tensor;

mod dense;
mod leaky_relu;

pub use dense::{Dense, DenseBackwardContext, DenseForwardContext};
pub use leaky_relu::{LeakyReLU, LeakyReLUForwardContext};

/// Available neural network layers
#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    LeakyReLU(LeakyReLU),
}

/// Layer-specific context from forward pass for backpropagation
#[derive(Debug)]
pub enum LayerForwardContext {
    Dense(DenseForwardContext),
    LeakyReLU(LeakyReLUForwardContext),
}

/// Layer-specific gradients, only produced by layers with parameters
#[derive(Debug)]
pub enum LayerBackwardContext {
    Dense(DenseBackwardContext),
    None,
}

impl Layer {
    /// Performs forward pass through the layer
    /// Returns output tensor and context needed for backward pass
    pub fn forward(&self, input: Tensor) -> (Tensor, LayerForwardContext) {
        match self {
            Layer::Dense(dense) => dense.forward(input),
            Layer::LeakyReLU(relu) => relu.forward(input),
        }
    }

    /// Performs backward pass through the layer
    /// Takes gradient from next layer and forward context, returns input gradient and backward context
    pub fn backward(
        &self,
        grad: Tensor,
        context: &LayerForwardContext,
    ) -> (Tensor, LayerBackwardContext) {
        match (self, context) {
            (Layer::Dense(dense), LayerForwardContext::Dense(context)) => {
                dense.backward(grad, context)
            }
            (Layer::LeakyReLU(relu), LayerForwardContext::LeakyReLU(context)) => {
                (relu.backward(grad, context), LayerBackwardContext::None)
            }
            _ => unreachable!("forward context does not belong to this layer"),
        }
    }

    /// Accumulates gradients produced by the backward pass
    pub fn update_grads(&mut self, backward_context: &LayerBackwardContext) {
        if let (Layer::Dense(dense), LayerBackwardContext::Dense(context)) =
            (self, backward_context)
        {
            dense.update_grads(context);
        }
    }

    /// Returns references to layer's trainable parameters,
    /// used during optimizer initialization
    pub fn get_parameters(&self) -> Vec<&Tensor> {
        match self {
            Layer::Dense(dense) => dense.get_parameters(),
            Layer::LeakyReLU(_) => vec![],
        }
    }

    /// Returns mutable references to parameters paired with their gradients
    pub fn get_parameter_pairs(&mut self) -> Vec<(&mut Tensor, &Tensor)> {
        match self {
            Layer::Dense(dense) => dense.get_parameter_pairs(),
            Layer::LeakyReLU(_) => vec![],
        }
    }

    /// Resets accumulated gradients to zero after parameter update
    pub fn clear_grads(&mut self) {
        if let Layer::Dense(dense) = self {
            dense.clear_grads();
        }
    }
}
