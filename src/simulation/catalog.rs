// src/simulation/catalog.rs

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::item::{DemandClass, Item};
use crate::simulation::config::SimulationConfig;

/// Largest id that still belongs to a cumulative fraction of an `n`-item catalog.
fn cut(n: u32, fraction: f64) -> u32 {
    // The epsilon keeps 100 * 0.2 from landing on 19.999...
    (n as f64 * fraction + 1e-9).floor() as u32
}

/// Maps an item id in `[1, n]` to its class. The cut is made on the id order,
/// never by sampling, so class proportions are exact.
pub fn classify(id: u32, n: u32, fast_fraction: f64, medium_fraction: f64) -> DemandClass {
    if id <= cut(n, fast_fraction) {
        DemandClass::Fast
    } else if id <= cut(n, fast_fraction + medium_fraction) {
        DemandClass::Medium
    } else {
        DemandClass::Slow
    }
}

/// Rounds to cents.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generates the item catalog.
///
/// For each id, in ascending order, the generator draws a category, a base demand
/// rate and a price from `rng`. The result is fully determined by the seed of `rng`.
pub fn generate_catalog<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> Vec<Item> {
    let n = config.items;
    let mut catalog = Vec::with_capacity(n as usize);

    for id in 1..=n {
        let category = config
            .categories
            .choose(rng)
            .cloned()
            .unwrap_or_default();
        let demand_class = classify(id, n, config.fast_fraction, config.medium_fraction);
        let profile = config.profile(demand_class);

        let base_demand_rate = profile.demand_rate.sample(rng);
        let unit_price = round2(rng.gen_range(profile.price_min..=profile.price_max));

        catalog.push(Item {
            id,
            title: format!("{category} #{id}"),
            category,
            demand_class,
            base_demand_rate,
            unit_cost: round2(unit_price * config.cost_ratio),
            unit_price,
        });
    }

    catalog
}
