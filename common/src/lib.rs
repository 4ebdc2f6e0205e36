//! Shared functionality for the seasonal-transition forecasting pipeline

#![deny(unused_imports, unused_crate_dependencies)]
#![warn(missing_docs)]

mod activation;
mod error;
mod seed;

pub mod features;
pub mod metrics;
pub mod split;

pub use activation::Activation;
pub use error::{Error, Result};
pub use seed::derive_seed;
