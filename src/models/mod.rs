//! Load predictors.
//!
//! Every model consumes the transposed feature matrix (one row per feature,
//! one column per observation) and returns one prediction per column.

pub mod linear;
pub mod network;

pub use linear::*;
pub use network::*;

use nalgebra::{DMatrix, RowDVector};

use crate::domain::{ModelKind, ModelParams};
use crate::error::AppError;

/// Maps a feature matrix to a same-width row of predicted load.
pub trait LoadPredictor {
    fn predict(&self, features: &DMatrix<f64>) -> Result<RowDVector<f64>, AppError>;
}

/// A fitted model of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    Network(FeedForwardNet),
    Linear(LinearModel),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Network(_) => ModelKind::Network,
            Model::Linear(_) => ModelKind::Linear,
        }
    }

    pub fn to_params(&self) -> ModelParams {
        match self {
            Model::Network(net) => ModelParams::Network(net.to_params()),
            Model::Linear(lin) => ModelParams::Linear(lin.to_params()),
        }
    }

    pub fn from_params(params: &ModelParams) -> Result<Self, AppError> {
        match params {
            ModelParams::Network(p) => Ok(Model::Network(FeedForwardNet::from_params(p)?)),
            ModelParams::Linear(p) => Ok(Model::Linear(LinearModel::from_params(p)?)),
        }
    }
}

impl LoadPredictor for Model {
    fn predict(&self, features: &DMatrix<f64>) -> Result<RowDVector<f64>, AppError> {
        let y = match self {
            Model::Network(net) => net.predict(features)?,
            Model::Linear(lin) => lin.predict(features)?,
        };
        if y.iter().any(|v| !v.is_finite()) {
            return Err(AppError::runtime("Non-finite model prediction."));
        }
        Ok(y)
    }
}
