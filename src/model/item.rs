// src/model/item.rs

use serde::Serialize;

/// Sales-velocity segment of an item (ABC classification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DemandClass {
    Fast,
    Medium,
    Slow,
}

impl DemandClass {
    /// The classic ABC letter for this segment.
    pub fn abc_code(self) -> char {
        match self {
            DemandClass::Fast => 'A',
            DemandClass::Medium => 'B',
            DemandClass::Slow => 'C',
        }
    }
}

/// A catalog entry. Created once by the catalog generator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub demand_class: DemandClass,
    /// Mean daily units before seasonality. Slow movers may sit below 1.
    pub base_demand_rate: f64,
    pub unit_cost: f64,
    pub unit_price: f64,
}
