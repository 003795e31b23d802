//! Synthetic retail inventory history and forecast-driven reorder points.
//!
//! The catalog generator and the inventory simulator produce sales and stock
//! tables from one seeded random source. The forecasting pipeline fits a demand
//! model per item and the reorder calculator turns the forecast into reorder points.

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod simulation;
pub mod strategy;
pub mod telemetry;
