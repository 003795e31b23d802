// src/io/history.rs

use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::model::records::SalesRecord;
use crate::strategy::forecasting::SalesHistory;

/// Reads a sales log written by `reporting::write_records`.
pub fn read_sales(file_path: &Path) -> Result<Vec<SalesRecord>, AppError> {
    let mut rdr = csv::Reader::from_path(file_path)?;
    let records = rdr.deserialize().collect::<Result<Vec<SalesRecord>, _>>()?;

    info!(rows = records.len(), path = %file_path.display(), "loaded sales history");
    Ok(records)
}

/// Reads a sales log and aggregates it into per-item daily series.
pub fn load_history(file_path: &Path) -> Result<SalesHistory, AppError> {
    Ok(SalesHistory::from_sales(&read_sales(file_path)?))
}
