//! Table-level operations: inner join and cutoff split.

pub mod join;
pub mod split;

pub use join::*;
pub use split::*;
