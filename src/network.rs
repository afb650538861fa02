use crate::layers::{Dense, LeakyReLU};
use crate::{Layer, LayerBackwardContext, LayerForwardContext, Optimizer, Tensor};
use rand::Rng;

/// Sequential feed-forward network owning its layers and optimizer
pub struct Network {
    pub layers: Vec<Layer>,
    /// Optimizer for parameter updates
    pub optimizer: Box<dyn Optimizer>,
}

impl Network {
    /// Creates an empty network with specified optimizer
    pub fn with_boxed_optimizer(optimizer: Box<dyn Optimizer>) -> Self {
        Network {
            layers: Vec::new(),
            optimizer,
        }
    }

    /// Builds a binary classifier: `hidden_layers` LeakyReLU blocks of width
    /// `hidden_size` followed by a single output logit
    pub fn binary_classifier<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        hidden_layers: usize,
        optimizer: Box<dyn Optimizer>,
        rng: &mut R,
    ) -> Self {
        const ALPHA: f32 = 0.01;

        let mut network = Network::with_boxed_optimizer(optimizer);
        let mut width = input_size;
        for _ in 0..hidden_layers {
            network.add_layer(Layer::Dense(Dense::new(width, hidden_size, ALPHA, rng)));
            network.add_layer(Layer::LeakyReLU(LeakyReLU::new(ALPHA)));
            width = hidden_size;
        }
        network.add_layer(Layer::Dense(Dense::new(width, 1, 0.0, rng)));
        network.initialize_optimizer();

        network
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Initializes optimizer with all trainable parameters from the network
    pub fn initialize_optimizer(&mut self) {
        let all_params: Vec<&Tensor> = self
            .layers
            .iter()
            .flat_map(|layer| layer.get_parameters())
            .collect();

        self.optimizer.init(&all_params);
    }

    /// Performs forward pass through the network
    ///
    /// # Returns
    /// Tuple of (output tensor, forward contexts needed for backward pass)
    pub fn forward(&self, input: Tensor) -> (Tensor, Vec<LayerForwardContext>) {
        let mut current = input;
        let mut contexts = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let (output, context) = layer.forward(current);
            current = output;
            contexts.push(context);
        }

        (current, contexts)
    }

    /// Performs backward pass through the network
    ///
    /// # Returns
    /// Tuple of (input gradients, backward contexts in layer order)
    pub fn backward(
        &self,
        grad_output: Tensor,
        forward_contexts: &[LayerForwardContext],
    ) -> (Tensor, Vec<LayerBackwardContext>) {
        let mut current = grad_output;
        let mut contexts = Vec::with_capacity(self.layers.len());

        // Process through layers in reverse order
        for (layer, forward_context) in self.layers.iter().zip(forward_contexts).rev() {
            let (output, context) = layer.backward(current, forward_context);
            current = output;
            contexts.push(context);
        }
        contexts.reverse();

        (current, contexts)
    }

    /// Applies one optimization step with the optimizer's current learning rate
    pub fn update_parameters(&mut self, backward_contexts: &[LayerBackwardContext]) {
        for (layer, context) in self.layers.iter_mut().zip(backward_contexts) {
            layer.update_grads(context);
        }

        let mut param_pairs: Vec<(&mut Tensor, &Tensor)> = self
            .layers
            .iter_mut()
            .flat_map(|layer| layer.get_parameter_pairs())
            .collect();
        self.optimizer.update_parameters(&mut param_pairs);

        for layer in &mut self.layers {
            layer.clear_grads();
        }
    }
}
