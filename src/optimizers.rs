use crate::Tensor;

/// Trait defining the interface for parameter optimization algorithms.
/// The active learning rate is written in from outside before each step.
pub trait Optimizer: Send {
    /// Initializes optimizer state (if any)
    fn init(&mut self, _params: &[&Tensor]) {}

    /// Sets the rate used by the next parameter update
    fn set_learning_rate(&mut self, learning_rate: f32);

    fn learning_rate(&self) -> f32;

    /// Updates momentum parameter if applicable
    fn set_momentum(&mut self, _momentum: f32) {}

    /// Updates parameters using computed gradients
    fn update_parameters(&mut self, params: &mut [(&mut Tensor, &Tensor)]);
}

/// Basic Stochastic Gradient Descent optimizer
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    pub fn new(learning_rate: f32) -> Self {
        SGD { learning_rate }
    }
}

impl Optimizer for SGD {
    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn update_parameters(&mut self, params: &mut [(&mut Tensor, &Tensor)]) {
        for (param, grad) in params.iter_mut() {
            for (value, &gradient) in param.data.iter_mut().zip(&grad.data) {
                *value -= self.learning_rate * gradient;
            }
        }
    }
}

/// Gradient Descent with Momentum
#[derive(Debug, Clone)]
pub struct Momentum {
    learning_rate: f32,
    /// Momentum coefficient
    momentum: f32,
    /// Velocity vectors for each parameter
    velocities: Vec<Tensor>,
}

impl Momentum {
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Momentum {
            learning_rate,
            momentum,
            velocities: Vec::new(),
        }
    }
}

impl Optimizer for Momentum {
    fn init(&mut self, params: &[&Tensor]) {
        self.velocities = params.iter().map(|p| p.zeros_like()).collect();
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_momentum(&mut self, momentum: f32) {
        self.momentum = momentum;
    }

    fn update_parameters(&mut self, params: &mut [(&mut Tensor, &Tensor)]) {
        for ((param, grad), velocity) in params.iter_mut().zip(self.velocities.iter_mut()) {
            for ((value, &gradient), v) in param
                .data
                .iter_mut()
                .zip(&grad.data)
                .zip(velocity.data.iter_mut())
            {
                *v = self.momentum * *v - self.learning_rate * gradient;
                *value += *v;
            }
        }
    }
}

/// Adam optimizer (Adaptive Moment Estimation)
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    /// Exponential decay rate for first moment estimates
    beta1: f32,
    /// Exponential decay rate for second moment estimates
    beta2: f32,
    /// Small constant for numerical stability
    epsilon: f32,
    /// First moment estimates
    velocities: Vec<Tensor>,
    /// Second moment estimates
    second_moments: Vec<Tensor>,
    /// Number of update steps taken
    timestep: i32,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            velocities: Vec::new(),
            second_moments: Vec::new(),
            timestep: 0,
        }
    }
}

impl Optimizer for Adam {
    fn init(&mut self, params: &[&Tensor]) {
        self.velocities = params.iter().map(|p| p.zeros_like()).collect();
        self.second_moments = params.iter().map(|p| p.zeros_like()).collect();
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// One-cycle style momentum maps onto beta1
    fn set_momentum(&mut self, momentum: f32) {
        self.beta1 = momentum;
    }

    fn update_parameters(&mut self, params: &mut [(&mut Tensor, &Tensor)]) {
        self.timestep = self.timestep.saturating_add(1);

        // Calculate bias correction terms
        let beta1_correction = 1.0 - self.beta1.powi(self.timestep);
        let beta2_correction = 1.0 - self.beta2.powi(self.timestep);

        for ((param, grad), (velocity, second_moment)) in params.iter_mut().zip(
            self.velocities
                .iter_mut()
                .zip(self.second_moments.iter_mut()),
        ) {
            for (((value, &gradient), m), v) in param
                .data
                .iter_mut()
                .zip(&grad.data)
                .zip(velocity.data.iter_mut())
                .zip(second_moment.data.iter_mut())
            {
                *m = self.beta1 * *m + (1.0 - self.beta1) * gradient;
                *v = self.beta2 * *v + (1.0 - self.beta2) * gradient * gradient;

                let m_hat = *m / beta1_correction;
                let v_hat = *v / beta2_correction;

                *value -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}
