//! Network training.
//!
//! Full-batch Adam on the mean squared error of scaled targets. A seeded random
//! share of the training observations is held out for validation; training
//! stops once the validation error has failed to improve for `max_fail`
//! consecutive epochs and the best weights seen are restored.

use nalgebra::{DMatrix, RowDVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::domain::NetworkOptions;
use crate::error::AppError;
use crate::math::MinMaxScaler;
use crate::models::FeedForwardNet;

/// Below this many observations everything is used for training.
const MIN_OBS_FOR_VALIDATION: usize = 10;

/// Smallest validation improvement that resets the failure counter.
const MIN_IMPROVEMENT: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxEpochs,
    ValidationFailures,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs_run: usize,
    pub best_epoch: usize,
    /// Scaled-target MSE of the returned weights on the training share.
    pub train_mse: f64,
    pub validation_mse: Option<f64>,
    pub stop: StopReason,
    pub n_train: usize,
    pub n_validation: usize,
}

/// Train a network on `features` (d×n) and `target` (1×n).
pub fn train_network(
    features: &DMatrix<f64>,
    target: &RowDVector<f64>,
    options: &NetworkOptions,
) -> Result<(FeedForwardNet, TrainReport), AppError> {
    validate_options(options)?;
    let n = features.ncols();
    if n == 0 || target.len() != n {
        return Err(AppError::no_data(format!(
            "Cannot train on {n} observations with {} targets.",
            target.len()
        )));
    }

    let target = DMatrix::from_row_slice(1, n, target.as_slice());
    let input_scaler = MinMaxScaler::fit(features)
        .ok_or_else(|| AppError::runtime("Non-finite values in training features."))?;
    let target_scaler =
        MinMaxScaler::fit(&target).ok_or_else(|| AppError::runtime("Non-finite values in training target."))?;

    let x = input_scaler.transform(features);
    let t = target_scaler.transform(&target);

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut net = FeedForwardNet::new_random(input_scaler, target_scaler, options.hidden, &mut rng)?;

    let (train_idx, val_idx) = holdout_split(n, options.validation_fraction, &mut rng);
    let x_train = x.select_columns(&train_idx);
    let t_train = t.select_columns(&train_idx);
    let validation = (!val_idx.is_empty()).then(|| (x.select_columns(&val_idx), t.select_columns(&val_idx)));

    let mut adam = Adam::new(&net, options.learning_rate);
    let mut best: Option<(f64, usize, FeedForwardNet)> = None;
    let mut fails = 0usize;
    let mut epochs_run = 0usize;
    let mut stop = StopReason::MaxEpochs;

    for epoch in 1..=options.epochs {
        let (loss, grads) = net.loss_and_gradients(&x_train, &t_train);
        if !loss.is_finite() {
            return Err(AppError::runtime(format!("Training diverged at epoch {epoch}.")));
        }
        adam.step(&mut net, &grads);
        epochs_run = epoch;

        let Some((x_val, t_val)) = &validation else { continue };
        let val_loss = net.loss(x_val, t_val);
        let improved = best.as_ref().is_none_or(|(b, _, _)| val_loss < b - MIN_IMPROVEMENT);
        if improved {
            best = Some((val_loss, epoch, net.clone()));
            fails = 0;
        } else {
            fails += 1;
            if fails >= options.max_fail {
                stop = StopReason::ValidationFailures;
                break;
            }
        }

        if epoch % 100 == 0 {
            debug!(epoch, train_mse = loss, validation_mse = val_loss, "training");
        }
    }

    let (validation_mse, best_epoch) = match best {
        Some((val_loss, epoch, best_net)) => {
            net = best_net;
            (Some(val_loss), epoch)
        }
        None => (None, epochs_run),
    };
    let train_mse = net.loss(&x_train, &t_train);

    let report = TrainReport {
        epochs_run,
        best_epoch,
        train_mse,
        validation_mse,
        stop,
        n_train: train_idx.len(),
        n_validation: val_idx.len(),
    };
    info!(
        epochs = report.epochs_run,
        best_epoch = report.best_epoch,
        train_mse = report.train_mse,
        validation_mse = ?report.validation_mse,
        stop = ?report.stop,
        "network trained"
    );

    Ok((net, report))
}

fn validate_options(options: &NetworkOptions) -> Result<(), AppError> {
    if options.hidden == 0 {
        return Err(AppError::input("Hidden layer size must be > 0."));
    }
    if options.epochs == 0 {
        return Err(AppError::input("Epoch count must be > 0."));
    }
    if !(options.learning_rate.is_finite() && options.learning_rate > 0.0) {
        return Err(AppError::input("Learning rate must be finite and > 0."));
    }
    if !(0.0..0.5).contains(&options.validation_fraction) {
        return Err(AppError::input("Validation fraction must be in [0, 0.5)."));
    }
    if options.max_fail == 0 {
        return Err(AppError::input("max-fail must be > 0."));
    }
    Ok(())
}

/// Shuffle `0..n` and carve off the validation share.
fn holdout_split(n: usize, fraction: f64, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    if n < MIN_OBS_FOR_VALIDATION || fraction <= 0.0 {
        return (idx, Vec::new());
    }
    idx.shuffle(rng);
    let n_val = ((n as f64) * fraction).round() as usize;
    let n_val = n_val.min(n - 1);
    let mut val = idx.split_off(n - n_val);
    idx.sort_unstable();
    val.sort_unstable();
    (idx, val)
}

struct AdamSlot {
    m: DMatrix<f64>,
    v: DMatrix<f64>,
}

impl AdamSlot {
    fn zeros_like(p: &DMatrix<f64>) -> Self {
        Self {
            m: DMatrix::zeros(p.nrows(), p.ncols()),
            v: DMatrix::zeros(p.nrows(), p.ncols()),
        }
    }

    fn update(&mut self, param: &mut DMatrix<f64>, grad: &DMatrix<f64>, step_size: f64) {
        for ((p, g), (m, v)) in param
            .iter_mut()
            .zip(grad.iter())
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            *p -= step_size * *m / (v.sqrt() + EPSILON);
        }
    }
}

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

struct Adam {
    learning_rate: f64,
    t: i32,
    w1: AdamSlot,
    b1: AdamSlot,
    w2: AdamSlot,
    b2: AdamSlot,
}

impl Adam {
    fn new(net: &FeedForwardNet, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            t: 0,
            w1: AdamSlot::zeros_like(&net.w1),
            b1: AdamSlot::zeros_like(&net.b1),
            w2: AdamSlot::zeros_like(&net.w2),
            b2: AdamSlot::zeros_like(&net.b2),
        }
    }

    fn step(&mut self, net: &mut FeedForwardNet, grads: &crate::models::Gradients) {
        self.t += 1;
        // Bias correction folded into the step size.
        let step_size =
            self.learning_rate * (1.0 - BETA2.powi(self.t)).sqrt() / (1.0 - BETA1.powi(self.t));
        self.w1.update(&mut net.w1, &grads.w1, step_size);
        self.b1.update(&mut net.b1, &grads.b1, step_size);
        self.w2.update(&mut net.w2, &grads.w2, step_size);
        self.b2.update(&mut net.b2, &grads.b2, step_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoadPredictor;

    fn smooth_problem(n: usize) -> (DMatrix<f64>, RowDVector<f64>) {
        let xs: Vec<f64> = (0..n).map(|i| i as f64 / n as f64 * 6.0).collect();
        let features = DMatrix::from_row_slice(1, n, &xs);
        let target = RowDVector::from_iterator(n, xs.iter().map(|x| 100.0 + 20.0 * x.sin()));
        (features, target)
    }

    fn options() -> NetworkOptions {
        NetworkOptions {
            hidden: 8,
            epochs: 400,
            learning_rate: 0.02,
            validation_fraction: 0.0,
            max_fail: 6,
            seed: 3,
        }
    }

    #[test]
    fn training_reduces_error() {
        let (x, y) = smooth_problem(80);
        let mut short = options();
        short.epochs = 1;
        let (_, first) = train_network(&x, &y, &short).unwrap();
        let (net, report) = train_network(&x, &y, &options()).unwrap();

        assert_eq!(report.epochs_run, 400);
        assert_eq!(report.stop, StopReason::MaxEpochs);
        assert!(report.train_mse < first.train_mse * 0.5);

        let pred = net.predict(&x).unwrap();
        assert_eq!(pred.len(), 80);
        assert!(pred.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let (x, y) = smooth_problem(40);
        let mut opts = options();
        opts.epochs = 50;
        opts.validation_fraction = 0.2;
        let (a, ra) = train_network(&x, &y, &opts).unwrap();
        let (b, rb) = train_network(&x, &y, &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(ra, rb);
        assert_eq!(ra.n_validation, 8);
        assert_eq!(ra.n_train, 32);
    }

    #[test]
    fn holdout_partitions_all_indices() {
        let mut rng = StdRng::seed_from_u64(1);
        let (train, val) = holdout_split(100, 0.15, &mut rng);
        assert_eq!(val.len(), 15);
        let mut all: Vec<usize> = train.iter().chain(&val).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn small_sets_skip_validation() {
        let mut rng = StdRng::seed_from_u64(1);
        let (train, val) = holdout_split(5, 0.15, &mut rng);
        assert_eq!(train.len(), 5);
        assert!(val.is_empty());
    }

    #[test]
    fn rejects_bad_options() {
        let (x, y) = smooth_problem(10);
        let mut opts = options();
        opts.learning_rate = 0.0;
        assert!(train_network(&x, &y, &opts).is_err());
    }
}
