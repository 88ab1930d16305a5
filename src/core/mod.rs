//! Core configuration model
//!
//! This module turns user parameters into validated inputs for the
//! modeling engine: the resolved configuration, the abundance table,
//! and the diet specification.

pub mod abundance;
pub mod config;
pub mod diet;
pub mod error;

pub use abundance::{AbundanceTable, AbundanceValidator, NORMALIZATION_TOLERANCE};
pub use config::{ConfigResolver, Configuration, DietInput, OptionalParams, RequiredParams};
pub use diet::{DietResolver, DietSpec};
pub use error::{ColumnExcess, FileRole, PipelineError};
