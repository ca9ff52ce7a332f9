//! Fully connected layer with forward/backward passes.
//!
//! Batches are row-major: an input of shape `(batch, inputs)` produces an
//! output of shape `(batch, outputs)`:
//!
//! ```text
//! z = x · W + b
//! a = act(z)
//! ```
//!
//! Gradients follow the usual chain rule; the caller supplies `∂L/∂a` and gets
//! back `∂L/∂x` plus the parameter gradients.

use nalgebra::DMatrix;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply(self, z: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Activation::Relu => z.map(|v| v.max(0.0)),
            Activation::Linear => z.clone(),
        }
    }

    fn derivative(self, z: &DMatrix<f64>) -> DMatrix<f64> {
        match self {
            Activation::Relu => z.map(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => DMatrix::from_element(z.nrows(), z.ncols(), 1.0),
        }
    }
}

/// A dense layer. `weights` is `(inputs, outputs)`, `bias` is `(1, outputs)`.
#[derive(Debug, Clone)]
pub struct Dense {
    pub weights: DMatrix<f64>,
    pub bias: DMatrix<f64>,
    pub activation: Activation,
}

/// Values saved by `forward` that `backward` needs.
#[derive(Debug, Clone)]
pub struct DenseCache {
    input: DMatrix<f64>,
    pre_activation: DMatrix<f64>,
}

#[derive(Debug, Clone)]
pub struct DenseGrads {
    pub weights: DMatrix<f64>,
    pub bias: DMatrix<f64>,
}

impl Dense {
    /// Glorot-uniform weights, zero biases.
    pub fn glorot_uniform<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = DMatrix::from_fn(inputs, outputs, |_, _| rng.gen_range(-limit..limit));
        Self {
            weights,
            bias: DMatrix::zeros(1, outputs),
            activation,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn outputs(&self) -> usize {
        self.weights.ncols()
    }

    fn pre_activation(&self, input: &DMatrix<f64>) -> DMatrix<f64> {
        (input * &self.weights).map_with_location(|_, j, v| v + self.bias[(0, j)])
    }

    /// Inference-only forward pass.
    pub fn predict(&self, input: &DMatrix<f64>) -> DMatrix<f64> {
        self.activation.apply(&self.pre_activation(input))
    }

    /// Forward pass that keeps what the backward pass needs.
    pub fn forward(&self, input: &DMatrix<f64>) -> (DMatrix<f64>, DenseCache) {
        let z = self.pre_activation(input);
        let out = self.activation.apply(&z);
        (
            out,
            DenseCache {
                input: input.clone(),
                pre_activation: z,
            },
        )
    }

    /// Given `∂L/∂out`, return `(∂L/∂input, parameter gradients)`.
    pub fn backward(&self, cache: &DenseCache, grad_output: &DMatrix<f64>) -> (DMatrix<f64>, DenseGrads) {
        let delta = grad_output.component_mul(&self.activation.derivative(&cache.pre_activation));
        let grads = DenseGrads {
            weights: cache.input.transpose() * &delta,
            bias: DMatrix::from_fn(1, delta.ncols(), |_, j| delta.column(j).sum()),
        };
        let grad_input = &delta * self.weights.transpose();
        (grad_input, grads)
    }
}
