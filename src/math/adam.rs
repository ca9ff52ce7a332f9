//! Adam optimizer over a fixed, ordered list of parameter matrices.
//!
//! ```text
//! m ← β1·m + (1-β1)·g
//! v ← β2·v + (1-β2)·g²
//! θ ← θ - lr · (m / (1-β1ᵗ)) / (sqrt(v / (1-β2ᵗ)) + ε)
//! ```
//!
//! Moment buffers are created lazily on the first step, one per parameter, in
//! the order the parameters are passed. Callers must keep that order stable.

use nalgebra::DMatrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl AdamConfig {
    pub fn with_learning_rate(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Adam {
    config: AdamConfig,
    step: i32,
    moments: Vec<(DMatrix<f64>, DMatrix<f64>)>,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Self {
        Self {
            config,
            step: 0,
            moments: Vec::new(),
        }
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.step
    }

    /// Apply one update to every `(parameter, gradient)` pair.
    pub fn step<'a, I>(&mut self, params: I)
    where
        I: IntoIterator<Item = (&'a mut DMatrix<f64>, &'a DMatrix<f64>)>,
    {
        self.step += 1;
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        let correction1 = 1.0 - beta1.powi(self.step);
        let correction2 = 1.0 - beta2.powi(self.step);

        for (slot, (param, grad)) in params.into_iter().enumerate() {
            if slot == self.moments.len() {
                self.moments.push((
                    DMatrix::zeros(param.nrows(), param.ncols()),
                    DMatrix::zeros(param.nrows(), param.ncols()),
                ));
            }
            let (m, v) = &mut self.moments[slot];

            m.zip_apply(grad, |m, g| *m = beta1 * *m + (1.0 - beta1) * g);
            v.zip_apply(grad, |v, g| *v = beta2 * *v + (1.0 - beta2) * g * g);

            for ((p, m), v) in param.iter_mut().zip(m.iter()).zip(v.iter()) {
                let m_hat = m / correction1;
                let v_hat = v / correction2;
                *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_each_parameter_by_learning_rate() {
        // With bias correction, the first Adam step is lr * sign(g) (up to ε).
        let mut adam = Adam::new(AdamConfig::with_learning_rate(0.1));
        let mut w = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let g = DMatrix::from_row_slice(1, 2, &[5.0, -0.01]);
        adam.step([(&mut w, &g)]);

        assert!((w[(0, 0)] - 0.9).abs() < 1e-6);
        assert!((w[(0, 1)] - 1.1).abs() < 1e-4);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn minimizes_a_quadratic() {
        // f(w) = (w - 3)², f'(w) = 2(w - 3)
        let mut adam = Adam::new(AdamConfig::with_learning_rate(0.05));
        let mut w = DMatrix::from_element(1, 1, -2.0);
        for _ in 0..2000 {
            let g = DMatrix::from_element(1, 1, 2.0 * (w[(0, 0)] - 3.0));
            adam.step([(&mut w, &g)]);
        }
        assert!((w[(0, 0)] - 3.0).abs() < 0.25, "w = {}", w[(0, 0)]);
    }
}
