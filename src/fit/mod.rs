//! Model fitting.
//!
//! Responsibilities:
//!
//! - train the feed-forward network (Adam + early stopping)
//! - solve the linear baseline by least squares
//! - dispatch on the requested `ModelKind`

pub mod linear;
pub mod network;

pub use linear::*;
pub use network::*;

use tracing::info;

use crate::domain::{ModelKind, NetworkOptions};
use crate::error::AppError;
use crate::features::FeatureMatrix;
use crate::models::Model;

/// A fitted model plus its training diagnostics (network only).
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub model: Model,
    pub training: Option<TrainReport>,
}

/// Fit `kind` on a training matrix that carries a target row.
pub fn fit_model(kind: ModelKind, train: &FeatureMatrix, options: &NetworkOptions) -> Result<FittedModel, AppError> {
    train.require_observations("training")?;
    let target = train.require_target()?;

    info!(
        model = kind.display_name(),
        observations = train.n_obs(),
        features = train.n_features(),
        "fitting model"
    );

    match kind {
        ModelKind::Network => {
            let (net, report) = train_network(&train.features, target, options)?;
            Ok(FittedModel {
                model: Model::Network(net),
                training: Some(report),
            })
        }
        ModelKind::Linear => Ok(FittedModel {
            model: Model::Linear(fit_linear(&train.features, target)?),
            training: None,
        }),
    }
}
