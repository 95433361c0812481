//! Read/write model JSON files.
//!
//! A model file is the portable form of a trained predictor:
//! - zone and training horizon
//! - feature order and lag specifications used to build its inputs
//! - the fitted parameters (network weights or linear coefficients)
//!
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::ModelFile;
use crate::error::AppError;

pub const MODEL_TOOL: &str = "lf";

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &ModelFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, model)
        .map_err(|e| AppError::input(format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let model: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid model JSON: {e}")))?;
    if model.tool != MODEL_TOOL {
        return Err(AppError::input(format!(
            "Model JSON was written by `{}`, expected `{MODEL_TOOL}`.",
            model.tool
        )));
    }
    Ok(model)
}
