//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the time-keyed `Table` / `Record` pair
//! - lag specifications and feature column names
//! - run configuration and the portable model file

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
