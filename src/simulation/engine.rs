// src/simulation/engine.rs

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{AppError, ConfigError};
use crate::model::item::Item;
use crate::model::records::{DailyState, SalesRecord, StockSnapshot};
use crate::simulation::config::{InitialStock, SimulationConfig};

/// Saturday and Sunday (`weekday >= 5` counting Monday as 0).
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() >= 5
}

/// Poisson demand of one item, pre-built for weekdays and weekends.
/// A zero mean never touches the random source.
#[derive(Debug, Clone)]
pub struct DemandProcess {
    weekday: Option<Poisson<f64>>,
    weekend: Option<Poisson<f64>>,
}

impl DemandProcess {
    pub fn new(item: &Item, weekend_multiplier: f64) -> Result<Self, AppError> {
        Ok(Self {
            weekday: poisson(item.id, item.base_demand_rate)?,
            weekend: poisson(item.id, item.base_demand_rate * weekend_multiplier)?,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, weekend: bool, rng: &mut R) -> u32 {
        let dist = if weekend { &self.weekend } else { &self.weekday };
        match dist {
            Some(poisson) => {
                let units: f64 = poisson.sample(rng);
                units as u32
            }
            None => 0,
        }
    }
}

fn poisson(item_id: u32, mean: f64) -> Result<Option<Poisson<f64>>, AppError> {
    if mean == 0.0 {
        return Ok(None);
    }
    Poisson::new(mean)
        .map(Some)
        .map_err(|e| AppError::Distribution { item_id, reason: format!("mean {mean}: {e}") })
}

/// Same-day replenishment rule applied after the day's sales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplenishmentPolicy {
    pub threshold: u32,
    pub min_units: u32,
    pub max_units: u32,
    pub failure_probability: f64,
}

impl From<&SimulationConfig> for ReplenishmentPolicy {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            threshold: config.restock_threshold,
            min_units: config.restock_min,
            max_units: config.restock_max,
            failure_probability: config.restock_failure_probability,
        }
    }
}

/// One (item, day) transition. The only state carried between days is `opening_stock`.
pub fn simulate_day<R: Rng + ?Sized>(
    item_id: u32,
    date: NaiveDate,
    opening_stock: u32,
    demand: &DemandProcess,
    policy: &ReplenishmentPolicy,
    rng: &mut R,
) -> DailyState {
    let potential_demand = demand.sample(is_weekend(date), rng);

    // Unmet demand is lost, not backlogged.
    let actual_sale = potential_demand.min(opening_stock);
    let mut closing_stock = opening_stock - actual_sale;

    let mut restocked = 0;
    let mut supplier_failed = false;
    if closing_stock < policy.threshold {
        if rng.gen_bool(policy.failure_probability) {
            supplier_failed = true;
        } else {
            restocked = rng.gen_range(policy.min_units..=policy.max_units);
            closing_stock += restocked;
        }
    }

    DailyState {
        date,
        item_id,
        opening_stock,
        potential_demand,
        actual_sale,
        restocked,
        supplier_failed,
        closing_stock,
    }
}

/// Draws the opening stock of every item, in catalog order.
pub fn initial_stock<R: Rng + ?Sized>(
    config: &SimulationConfig,
    items: &[Item],
    rng: &mut R,
) -> Vec<u32> {
    match config.initial_stock {
        InitialStock::Uniform { min, max } => {
            items.iter().map(|_| rng.gen_range(min..=max)).collect()
        }
        InitialStock::Fixed { units } => vec![units; items.len()],
    }
}

/// Per-item totals over the whole horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemSummary {
    pub item_id: u32,
    pub potential_demand: u64,
    pub units_sold: u64,
    pub stock_out_days: u32,
    pub restocks: u32,
    pub supplier_failures: u32,
    pub revenue: f64,
}

impl ItemSummary {
    pub fn unmet_demand(&self) -> u64 {
        self.potential_demand - self.units_sold
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationSummary {
    pub items: Vec<ItemSummary>,
}

impl SimulationSummary {
    pub fn total_units_sold(&self) -> u64 {
        self.items.iter().map(|s| s.units_sold).sum()
    }

    pub fn total_unmet_demand(&self) -> u64 {
        self.items.iter().map(|s| s.unmet_demand()).sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.items.iter().map(|s| s.revenue).sum()
    }

    pub fn total_stock_out_days(&self) -> u32 {
        self.items.iter().map(|s| s.stock_out_days).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationOutput {
    pub sales: Vec<SalesRecord>,
    pub snapshots: Vec<StockSnapshot>,
    pub trace: Vec<DailyState>,
    pub summary: SimulationSummary,
}

/// Day-major inventory simulation.
///
/// Days are visited in ascending order and, within a day, items in slice order,
/// so a given seed always produces the same draw sequence.
pub struct InventorySimulation<'a> {
    config: &'a SimulationConfig,
    items: &'a [Item],
    demand: Vec<DemandProcess>,
    policy: ReplenishmentPolicy,

    // Closing stock of the previous day, indexed like `items`.
    stock: Vec<u32>,
    current_day: u32,
    output: SimulationOutput,
}

impl<'a> InventorySimulation<'a> {
    pub fn new(
        config: &'a SimulationConfig,
        items: &'a [Item],
        opening_stock: Vec<u32>,
    ) -> Result<Self, AppError> {
        if opening_stock.len() != items.len() {
            return Err(ConfigError::Invalid(format!(
                "{} opening stock levels given for {} items",
                opening_stock.len(),
                items.len()
            ))
            .into());
        }

        let demand = items
            .iter()
            .map(|item| DemandProcess::new(item, config.weekend_multiplier))
            .collect::<Result<Vec<_>, _>>()?;

        let capacity = config.days as usize * items.len();
        let summary = SimulationSummary {
            items: items
                .iter()
                .map(|item| ItemSummary { item_id: item.id, ..Default::default() })
                .collect(),
        };

        Ok(Self {
            config,
            items,
            demand,
            policy: ReplenishmentPolicy::from(config),
            stock: opening_stock,
            current_day: 0,
            output: SimulationOutput {
                sales: Vec::new(),
                snapshots: Vec::with_capacity(capacity),
                trace: Vec::with_capacity(capacity),
                summary,
            },
        })
    }

    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> Result<SimulationOutput, AppError> {
        while self.current_day < self.config.days {
            self.step(rng)?;
        }

        let summary = &self.output.summary;
        info!(
            days = self.config.days,
            items = self.items.len(),
            sales_records = self.output.sales.len(),
            units_sold = summary.total_units_sold(),
            unmet_demand = summary.total_unmet_demand(),
            stock_out_days = summary.total_stock_out_days(),
            revenue = summary.total_revenue(),
            "simulation finished"
        );
        Ok(self.output)
    }

    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), AppError> {
        let day = self.current_day;
        let date = self.config.date_for_day(day).ok_or_else(|| {
            ConfigError::Invalid(format!("day {day} is past the end of the calendar"))
        })?;

        for idx in 0..self.items.len() {
            let state = simulate_day(
                self.items[idx].id,
                date,
                self.stock[idx],
                &self.demand[idx],
                &self.policy,
                rng,
            );
            self.stock[idx] = state.closing_stock;
            self.record(idx, state);
        }

        if day % 30 == 0 {
            debug!(day, %date, "simulated day");
        }
        self.current_day += 1;
        Ok(())
    }

    fn record(&mut self, idx: usize, state: DailyState) {
        let items = self.items;
        let item = &items[idx];

        if state.actual_sale > 0 {
            self.output.sales.push(SalesRecord {
                date: state.date,
                item_id: item.id,
                quantity_sold: state.actual_sale,
                unit_price: item.unit_price,
            });
        }
        self.output.snapshots.push(StockSnapshot {
            date: state.date,
            item_id: item.id,
            closing_stock: state.closing_stock,
        });

        let summary = &mut self.output.summary.items[idx];
        summary.potential_demand += u64::from(state.potential_demand);
        summary.units_sold += u64::from(state.actual_sale);
        summary.revenue += f64::from(state.actual_sale) * item.unit_price;
        if state.is_stock_out() {
            summary.stock_out_days += 1;
        }
        if state.restocked > 0 {
            summary.restocks += 1;
        }
        if state.supplier_failed {
            summary.supplier_failures += 1;
        }

        self.output.trace.push(state);
    }
}

/// Validates the config, draws the initial stock and runs the full horizon.
pub fn simulate<R: Rng + ?Sized>(
    config: &SimulationConfig,
    items: &[Item],
    rng: &mut R,
) -> Result<SimulationOutput, AppError> {
    config.validate()?;
    let opening = initial_stock(config, items, rng);
    InventorySimulation::new(config, items, opening)?.run(rng)
}
