// src/model/records.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line of the sales log. Only written for days where something was actually sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub item_id: u32,
    pub quantity_sold: u32,
    pub unit_price: f64,
}

/// End-of-day stock level, written for every item on every simulated day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub date: NaiveDate,
    pub item_id: u32,
    pub closing_stock: u32,
}

/// Full state of one (item, day) transition of the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyState {
    pub date: NaiveDate,
    pub item_id: u32,
    pub opening_stock: u32,
    pub potential_demand: u32,
    pub actual_sale: u32,
    /// Units received from the supplier at the end of the day (0 if none).
    pub restocked: u32,
    pub supplier_failed: bool,
    pub closing_stock: u32,
}

impl DailyState {
    pub fn is_stock_out(&self) -> bool {
        self.potential_demand > self.opening_stock
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub item_id: u32,
    /// Never negative.
    pub predicted_demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub date: NaiveDate,
    pub item_id: u32,
    pub predicted_demand: f64,
    pub reorder_point: u32,
}
