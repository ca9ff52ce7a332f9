//! Small feed-forward regressor mapping a time index to a profit value.
//!
//! Architecture is fixed: `1 → 10 (ReLU) → 5 (ReLU) → 1 (linear)`, trained with
//! Adam on mean squared error. The model is intentionally tiny; each company
//! gets its own freshly initialized instance.
//!
//! Training follows the usual hold-out scheme: the trailing
//! `n - floor(n · (1 - validation_split))` samples are held out for validation
//! and never used for weight updates. Training samples are shuffled every
//! epoch and fed in mini-batches.

use nalgebra::DMatrix;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::ForecastConfig;
use crate::error::ForecastError;
use crate::math::{Activation, Adam, AdamConfig, Dense, DenseCache};

/// Hidden layer widths.
pub const HIDDEN_UNITS: [usize; 2] = [10, 5];

/// Training hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub validation_split: f64,
    pub batch_size: usize,
}

impl From<&ForecastConfig> for TrainOptions {
    fn from(cfg: &ForecastConfig) -> Self {
        Self {
            epochs: cfg.epochs,
            learning_rate: cfg.learning_rate,
            validation_split: cfg.validation_split,
            batch_size: cfg.batch_size,
        }
    }
}

/// Per-epoch loss history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    /// Empty when no samples were held out.
    pub val_loss: Vec<f64>,
    pub train_samples: usize,
    pub validation_samples: usize,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.val_loss.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct ProfitRegressor {
    layers: Vec<Dense>,
}

impl ProfitRegressor {
    /// Build a freshly initialized network.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let [h1, h2] = HIDDEN_UNITS;
        Self {
            layers: vec![
                Dense::glorot_uniform(1, h1, Activation::Relu, rng),
                Dense::glorot_uniform(h1, h2, Activation::Relu, rng),
                Dense::glorot_uniform(h2, 1, Activation::Linear, rng),
            ],
        }
    }

    /// Number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.bias.len())
            .sum()
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.predict_batch(&[x]).first().copied().unwrap_or(f64::NAN)
    }

    pub fn predict_batch(&self, xs: &[f64]) -> Vec<f64> {
        let mut out = column(xs);
        for layer in &self.layers {
            out = layer.predict(&out);
        }
        out.iter().copied().collect()
    }

    /// Mean squared error over `(xs, ys)`.
    pub fn evaluate(&self, xs: &[f64], ys: &[f64]) -> f64 {
        mse(&self.predict_batch(xs), ys)
    }

    /// Train in place.
    ///
    /// Returns `ForecastError::Diverged` as soon as an epoch's training loss is
    /// not finite.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        xs: &[f64],
        ys: &[f64],
        opts: &TrainOptions,
        rng: &mut R,
    ) -> Result<TrainingHistory, ForecastError> {
        let n = xs.len().min(ys.len());
        if n == 0 {
            return Err(ForecastError::TooFewObservations {
                required: 1,
                got: 0,
            });
        }

        let split = training_len(n, opts.validation_split);
        let (train_x, val_x) = xs[..n].split_at(split);
        let (train_y, val_y) = ys[..n].split_at(split);

        let mut adam = Adam::new(AdamConfig::with_learning_rate(opts.learning_rate));
        let mut order: Vec<usize> = (0..split).collect();
        let batch_size = opts.batch_size.max(1);

        let mut history = TrainingHistory {
            train_samples: split,
            validation_samples: n - split,
            ..TrainingHistory::default()
        };

        for epoch in 1..=opts.epochs {
            order.shuffle(rng);
            for batch in order.chunks(batch_size) {
                let bx: Vec<f64> = batch.iter().map(|&i| train_x[i]).collect();
                let by: Vec<f64> = batch.iter().map(|&i| train_y[i]).collect();
                self.train_batch(&column(&bx), &column(&by), &mut adam);
            }

            let loss = self.evaluate(train_x, train_y);
            if !loss.is_finite() {
                return Err(ForecastError::Diverged { epoch });
            }
            history.loss.push(loss);
            if !val_x.is_empty() {
                history.val_loss.push(self.evaluate(val_x, val_y));
            }
        }

        Ok(history)
    }

    fn train_batch(&mut self, x: &DMatrix<f64>, y: &DMatrix<f64>, adam: &mut Adam) {
        let mut caches: Vec<DenseCache> = Vec::with_capacity(self.layers.len());
        let mut activation = x.clone();
        for layer in &self.layers {
            let (out, cache) = layer.forward(&activation);
            caches.push(cache);
            activation = out;
        }

        // d(MSE)/d(out) = 2 (out - y) / batch
        let scale = 2.0 / x.nrows() as f64;
        let mut grad = (&activation - y) * scale;

        let mut grads = Vec::with_capacity(self.layers.len());
        for (layer, cache) in self.layers.iter().zip(&caches).rev() {
            let (grad_input, layer_grads) = layer.backward(cache, &grad);
            grads.push(layer_grads);
            grad = grad_input;
        }
        grads.reverse();

        adam.step(
            self.layers
                .iter_mut()
                .zip(&grads)
                .flat_map(|(layer, g)| [(&mut layer.weights, &g.weights), (&mut layer.bias, &g.bias)]),
        );
    }
}

/// Number of leading samples used for training; at least one.
pub fn training_len(n: usize, validation_split: f64) -> usize {
    let keep = (n as f64 * (1.0 - validation_split.clamp(0.0, 1.0))).floor() as usize;
    keep.clamp(1, n.max(1))
}

fn column(values: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(values.len(), 1, values)
}

fn mse(pred: &[f64], actual: &[f64]) -> f64 {
    if pred.is_empty() {
        return 0.0;
    }
    let sse: f64 = pred.iter().zip(actual).map(|(p, a)| (p - a).powi(2)).sum();
    sse / pred.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn opts(epochs: usize) -> TrainOptions {
        TrainOptions {
            epochs,
            learning_rate: 0.1,
            validation_split: 0.2,
            batch_size: 32,
        }
    }

    #[test]
    fn architecture_has_expected_parameter_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let model = ProfitRegressor::new(&mut rng);
        // (1*10 + 10) + (10*5 + 5) + (5*1 + 1)
        assert_eq!(model.parameter_count(), 81);
    }

    #[test]
    fn training_len_holds_out_the_tail() {
        assert_eq!(training_len(2, 0.2), 1);
        assert_eq!(training_len(5, 0.2), 4);
        assert_eq!(training_len(10, 0.2), 8);
        assert_eq!(training_len(1, 0.2), 1);
        assert_eq!(training_len(4, 0.0), 4);
    }

    #[test]
    fn fit_records_history_per_epoch() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut model = ProfitRegressor::new(&mut rng);
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [100.0, 110.0, 105.0, 120.0, 115.0];
        let history = model.fit(&xs, &ys, &opts(25), &mut rng).unwrap();

        assert_eq!(history.loss.len(), 25);
        assert_eq!(history.val_loss.len(), 25);
        assert_eq!((history.train_samples, history.validation_samples), (4, 1));
        assert!(history.loss.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn training_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = ProfitRegressor::new(&mut rng);
        let xs: Vec<f64> = (0..8).map(f64::from).collect();
        let ys = [100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 103.0, 97.0];
        let history = model.fit(&xs, &ys, &opts(100), &mut rng).unwrap();

        let first = history.loss[0];
        let last = history.final_loss().unwrap();
        assert!(last < first, "loss did not improve: {first} -> {last}");
    }

    #[test]
    fn same_seed_same_model() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [10.0, 20.0, 30.0, 40.0];
        let run = || {
            let mut rng = StdRng::seed_from_u64(42);
            let mut model = ProfitRegressor::new(&mut rng);
            model.fit(&xs, &ys, &opts(20), &mut rng).unwrap();
            model.predict(4.0)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn fit_rejects_empty_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut model = ProfitRegressor::new(&mut rng);
        let err = model.fit(&[], &[], &opts(1), &mut rng).unwrap_err();
        assert!(matches!(err, ForecastError::TooFewObservations { got: 0, .. }));
    }

    #[test]
    fn huge_targets_report_divergence() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut model = ProfitRegressor::new(&mut rng);
        let xs = [0.0, 1.0, 2.0];
        let ys = [f64::MAX, -f64::MAX, f64::MAX];
        let err = model.fit(&xs, &ys, &opts(3), &mut rng).unwrap_err();
        assert!(matches!(err, ForecastError::Diverged { epoch: 1 }));
    }
}
