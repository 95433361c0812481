//! Feed-forward network with one tanh hidden layer and a linear output.
//!
//! Inputs and target are min-max scaled to `[-1, 1]` with the ranges seen in
//! training; predictions are mapped back to load units.
//!
//! Shapes (`d` features, `h` hidden units, `n` observations):
//!
//! ```text
//! X  d×n    W1 h×d   b1 h×1
//! A = tanh(W1·X + b1)          h×n
//! Y = W2·A + b2                1×n    W2 1×h   b2 1×1
//! ```

use nalgebra::{DMatrix, RowDVector};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::domain::NetworkParams;
use crate::error::AppError;
use crate::math::MinMaxScaler;
use crate::models::LoadPredictor;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardNet {
    pub input_scaler: MinMaxScaler,
    pub target_scaler: MinMaxScaler,
    pub w1: DMatrix<f64>,
    pub b1: DMatrix<f64>,
    pub w2: DMatrix<f64>,
    pub b2: DMatrix<f64>,
}

/// Gradients of the mean squared error, same shapes as the weights.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub w1: DMatrix<f64>,
    pub b1: DMatrix<f64>,
    pub w2: DMatrix<f64>,
    pub b2: DMatrix<f64>,
}

impl FeedForwardNet {
    /// Xavier-style Gaussian weights, zero biases.
    pub fn new_random<R: Rng + ?Sized>(
        input_scaler: MinMaxScaler,
        target_scaler: MinMaxScaler,
        hidden: usize,
        rng: &mut R,
    ) -> Result<Self, AppError> {
        let d = input_scaler.len();
        if d == 0 || hidden == 0 {
            return Err(AppError::input("Network needs at least one input and one hidden unit."));
        }

        let hidden_dist = Normal::new(0.0, (1.0 / d as f64).sqrt())
            .map_err(|e| AppError::runtime(format!("Weight distribution error: {e}")))?;
        let output_dist = Normal::new(0.0, (1.0 / hidden as f64).sqrt())
            .map_err(|e| AppError::runtime(format!("Weight distribution error: {e}")))?;

        Ok(Self {
            input_scaler,
            target_scaler,
            w1: DMatrix::from_fn(hidden, d, |_, _| hidden_dist.sample(rng)),
            b1: DMatrix::zeros(hidden, 1),
            w2: DMatrix::from_fn(1, hidden, |_, _| output_dist.sample(rng)),
            b2: DMatrix::zeros(1, 1),
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.w1.ncols()
    }

    pub fn n_hidden(&self) -> usize {
        self.w1.nrows()
    }

    /// Forward pass on scaled inputs; returns `(hidden activations, scaled output)`.
    pub fn forward_scaled(&self, x: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let mut z1 = &self.w1 * x;
        add_column_bias(&mut z1, &self.b1);
        let a1 = z1.map(f64::tanh);

        let mut y = &self.w2 * &a1;
        add_column_bias(&mut y, &self.b2);
        (a1, y)
    }

    /// Mean squared error on scaled data and its gradients.
    pub fn loss_and_gradients(&self, x: &DMatrix<f64>, t: &DMatrix<f64>) -> (f64, Gradients) {
        let n = x.ncols().max(1) as f64;
        let (a1, y) = self.forward_scaled(x);

        let err = &y - t;
        let loss = err.norm_squared() / n;

        let dy = err * (2.0 / n);
        let w2 = &dy * a1.transpose();
        let b2 = DMatrix::from_element(1, 1, dy.sum());

        let da1 = self.w2.transpose() * &dy;
        let dz1 = da1.component_mul(&a1.map(|a| 1.0 - a * a));
        let w1 = &dz1 * x.transpose();
        let b1 = DMatrix::from_column_slice(dz1.nrows(), 1, dz1.column_sum().as_slice());

        (loss, Gradients { w1, b1, w2, b2 })
    }

    /// Mean squared error on scaled data.
    pub fn loss(&self, x: &DMatrix<f64>, t: &DMatrix<f64>) -> f64 {
        let n = x.ncols().max(1) as f64;
        let (_, y) = self.forward_scaled(x);
        (&y - t).norm_squared() / n
    }

    pub fn to_params(&self) -> NetworkParams {
        NetworkParams {
            input_min: self.input_scaler.min.clone(),
            input_max: self.input_scaler.max.clone(),
            target_min: self.target_scaler.min[0],
            target_max: self.target_scaler.max[0],
            hidden_weights: self.w1.row_iter().map(|r| r.iter().copied().collect()).collect(),
            hidden_bias: self.b1.iter().copied().collect(),
            output_weights: self.w2.iter().copied().collect(),
            output_bias: self.b2[(0, 0)],
        }
    }

    pub fn from_params(p: &NetworkParams) -> Result<Self, AppError> {
        let d = p.input_min.len();
        let h = p.hidden_bias.len();
        let shapes_ok = d > 0
            && h > 0
            && p.input_max.len() == d
            && p.hidden_weights.len() == h
            && p.hidden_weights.iter().all(|r| r.len() == d)
            && p.output_weights.len() == h;
        if !shapes_ok {
            return Err(AppError::input("Network parameters have inconsistent shapes."));
        }

        let flat: Vec<f64> = p.hidden_weights.iter().flatten().copied().collect();
        Ok(Self {
            input_scaler: MinMaxScaler {
                min: p.input_min.clone(),
                max: p.input_max.clone(),
            },
            target_scaler: MinMaxScaler {
                min: vec![p.target_min],
                max: vec![p.target_max],
            },
            w1: DMatrix::from_row_slice(h, d, &flat),
            b1: DMatrix::from_column_slice(h, 1, &p.hidden_bias),
            w2: DMatrix::from_row_slice(1, h, &p.output_weights),
            b2: DMatrix::from_element(1, 1, p.output_bias),
        })
    }
}

impl LoadPredictor for FeedForwardNet {
    fn predict(&self, features: &DMatrix<f64>) -> Result<RowDVector<f64>, AppError> {
        if features.nrows() != self.n_inputs() {
            return Err(AppError::input(format!(
                "Network expects {} feature rows, got {}.",
                self.n_inputs(),
                features.nrows()
            )));
        }
        let x = self.input_scaler.transform(features);
        let (_, y) = self.forward_scaled(&x);
        let y = self.target_scaler.inverse(&y);
        Ok(RowDVector::from_iterator(y.ncols(), y.iter().copied()))
    }
}

fn add_column_bias(m: &mut DMatrix<f64>, bias: &DMatrix<f64>) {
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            m[(i, j)] += bias[(i, 0)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tiny_net() -> FeedForwardNet {
        let scaler = MinMaxScaler {
            min: vec![0.0, 0.0],
            max: vec![1.0, 1.0],
        };
        let target = MinMaxScaler {
            min: vec![0.0],
            max: vec![10.0],
        };
        let mut rng = StdRng::seed_from_u64(7);
        FeedForwardNet::new_random(scaler, target, 3, &mut rng).unwrap()
    }

    #[test]
    fn gradients_match_finite_differences() {
        let net = tiny_net();
        let x = DMatrix::from_row_slice(2, 3, &[0.1, -0.4, 0.7, 0.5, 0.2, -0.9]);
        let t = DMatrix::from_row_slice(1, 3, &[0.3, -0.2, 0.8]);
        let (_, g) = net.loss_and_gradients(&x, &t);

        let eps = 1e-6;
        let mut bumped = net.clone();
        bumped.w1[(1, 0)] += eps;
        let numeric = (bumped.loss(&x, &t) - net.loss(&x, &t)) / eps;
        assert!((numeric - g.w1[(1, 0)]).abs() < 1e-4);

        let mut bumped = net.clone();
        bumped.b2[(0, 0)] += eps;
        let numeric = (bumped.loss(&x, &t) - net.loss(&x, &t)) / eps;
        assert!((numeric - g.b2[(0, 0)]).abs() < 1e-4);

        let mut bumped = net.clone();
        bumped.b1[(2, 0)] += eps;
        let numeric = (bumped.loss(&x, &t) - net.loss(&x, &t)) / eps;
        assert!((numeric - g.b1[(2, 0)]).abs() < 1e-4);
    }

    #[test]
    fn params_round_trip_preserves_predictions() {
        let net = tiny_net();
        let back = FeedForwardNet::from_params(&net.to_params()).unwrap();
        let x = DMatrix::from_row_slice(2, 2, &[0.2, 0.9, 0.4, 0.1]);
        assert_eq!(net.predict(&x).unwrap(), back.predict(&x).unwrap());
    }

    #[test]
    fn rejects_wrong_feature_count() {
        let net = tiny_net();
        assert!(net.predict(&DMatrix::zeros(3, 1)).is_err());
    }
}
