//! Prediction, explainability and metrics service for a bank term-deposit
//! marketing campaign, plus the call-center queue simulator that consumes it.

pub mod api;
pub mod callcenter;
pub mod config;
pub mod error;
pub mod ml;
pub mod models;
pub mod records;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{AppError, Result};
