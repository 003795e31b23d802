// src/io/reporting.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::model::item::{DemandClass, Item};
use crate::model::records::ReorderRecommendation;
use crate::strategy::optimization::RecommendationStore;

pub const ITEMS_FILE: &str = "items.csv";
pub const SALES_FILE: &str = "sales.csv";
pub const INVENTORY_FILE: &str = "inventory.csv";
pub const RECOMMENDATIONS_FILE: &str = "reorder_recommendations.csv";

/// Writes rows to a CSV file, replacing any previous content.
///
/// # Arguments
/// * `file_path` - The path to save the file (e.g., "out/sales.csv").
/// * `data` - The rows to serialize, one per line, with a header.
pub fn write_records<T: Serialize>(file_path: &Path, data: &[T]) -> Result<usize, AppError> {
    let mut wtr = csv::Writer::from_path(file_path)?;
    for record in data {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(|e| AppError::io(file_path, e))?;

    info!(rows = data.len(), path = %file_path.display(), "exported csv");
    Ok(data.len())
}

/// One line of the items table: the catalog entry plus its ABC letter.
#[derive(Serialize)]
struct CatalogRow<'a> {
    id: u32,
    title: &'a str,
    category: &'a str,
    demand_class: DemandClass,
    abc_code: char,
    base_demand_rate: f64,
    unit_cost: f64,
    unit_price: f64,
}

impl<'a> From<&'a Item> for CatalogRow<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: item.id,
            title: &item.title,
            category: &item.category,
            demand_class: item.demand_class,
            abc_code: item.demand_class.abc_code(),
            base_demand_rate: item.base_demand_rate,
            unit_cost: item.unit_cost,
            unit_price: item.unit_price,
        }
    }
}

pub fn write_catalog(file_path: &Path, items: &[Item]) -> Result<usize, AppError> {
    let rows: Vec<CatalogRow<'_>> = items.iter().map(CatalogRow::from).collect();
    write_records(file_path, &rows)
}

pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))
}

/// Recommendation sink backed by one CSV file.
///
/// Each `replace_all` writes a sibling temp file and renames it over the target,
/// so readers see either the previous set or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct CsvRecommendationSink {
    path: PathBuf,
}

impl CsvRecommendationSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecommendationStore for CsvRecommendationSink {
    fn replace_all(&mut self, recommendations: Vec<ReorderRecommendation>) -> Result<(), AppError> {
        let staging = self.path.with_extension("csv.tmp");
        write_records(&staging, &recommendations)?;
        fs::rename(&staging, &self.path).map_err(|e| AppError::io(&self.path, e))
    }
}
