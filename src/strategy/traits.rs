// src/strategy/traits.rs

use std::fmt::Debug;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One point of a per-item demand series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Why a model could not be fitted to one item's series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("cannot fit an empty series")]
    EmptySeries,
    #[error("observation on {0} is not a finite number")]
    NonFinite(NaiveDate),
    #[error("design matrix is singular ({features} features, {observations} observations)")]
    Singular { features: usize, observations: usize },
}

/// Defines the demand forecasting capability used by the pipeline.
///
/// We require `Send` + `Sync` so that items can be fitted in parallel.
pub trait DemandModel: Debug + Send + Sync {
    /// Fits the model to a date-ordered series.
    ///
    /// # Arguments
    /// * `history` - Observations in ascending date order. Dates may have gaps.
    fn fit(&self, history: &[Observation]) -> Result<Box<dyn FittedModel>, ForecastError>;
}

/// A model fitted to one series.
pub trait FittedModel: Debug + Send {
    /// Predicts demand for each date, in the order given. Values may be negative;
    /// callers that need non-negative demand clamp them.
    fn predict(&self, dates: &[NaiveDate]) -> Vec<f64>;
}
