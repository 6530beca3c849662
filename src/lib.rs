// src/lib.rs
pub mod aggregation;
pub mod alerts;
pub mod batch;
pub mod error;
pub mod features;
pub mod models;
pub mod scoring;
pub mod sink;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{ErrorKind, RiskError, RiskResult};
