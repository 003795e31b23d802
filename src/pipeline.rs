// src/pipeline.rs

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::AppError;
use crate::io::reporting::{self, INVENTORY_FILE, ITEMS_FILE, SALES_FILE};
use crate::model::item::Item;
use crate::simulation::catalog::generate_catalog;
use crate::simulation::config::SimulationConfig;
use crate::simulation::engine::{simulate, SimulationOutput};
use crate::strategy::forecasting::{ForecastConfig, ForecastPipeline, SalesHistory};
use crate::strategy::optimization::{ReorderCalculator, ReorderConfig, RecommendationStore};

pub struct SimulationArtifacts {
    pub items: Vec<Item>,
    pub output: SimulationOutput,
}

impl SimulationArtifacts {
    /// Sales aggregated into per-item series, with every catalog item registered.
    pub fn history(&self) -> SalesHistory {
        let mut history = SalesHistory::from_sales(&self.output.sales);
        history.register_items(self.items.iter().map(|i| i.id));
        history
    }
}

/// Catalog generation and simulation from one seeded random source.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationArtifacts, AppError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let items = generate_catalog(config, &mut rng);
    info!(items = items.len(), seed = config.seed, "generated catalog");

    let output = simulate(config, &items, &mut rng)?;
    Ok(SimulationArtifacts { items, output })
}

/// Writes the items, sales and daily inventory tables.
pub fn export_simulation(dir: &Path, artifacts: &SimulationArtifacts) -> Result<(), AppError> {
    reporting::ensure_dir(dir)?;
    reporting::write_catalog(&dir.join(ITEMS_FILE), &artifacts.items)?;
    reporting::write_records(&dir.join(SALES_FILE), &artifacts.output.sales)?;
    reporting::write_records(&dir.join(INVENTORY_FILE), &artifacts.output.snapshots)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderReport {
    pub items: usize,
    pub forecast_items: usize,
    pub skipped_items: usize,
    pub recommendations: usize,
}

/// Forecasts every item, derives reorder points and replaces the store's contents.
pub fn run_reorder<S: RecommendationStore + ?Sized>(
    history: &SalesHistory,
    forecast: &ForecastConfig,
    reorder: &ReorderConfig,
    store: &mut S,
) -> Result<ReorderReport, AppError> {
    forecast.validate()?;
    reorder.validate()?;

    let model = forecast.build_model();
    let run = ForecastPipeline::new(model.as_ref(), forecast).run(history);
    let recommendations =
        ReorderCalculator::new(reorder.clone()).recommend_run(&run, forecast.horizon_days);

    let report = ReorderReport {
        items: history.item_count(),
        forecast_items: run.forecast_items(),
        skipped_items: run.skipped.len(),
        recommendations: recommendations.len(),
    };
    store.replace_all(recommendations)?;

    info!(?report, "reorder recommendations replaced");
    Ok(report)
}
