// src/simulation/config.rs

use chrono::{Days, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::item::DemandClass;
use crate::simulation::catalog::round2;

/// How the mean daily demand of an item is drawn for its class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateRange {
    /// Uniform integer in `[min, max]`.
    Integer { min: u32, max: u32 },
    /// Uniform real in `[min, max)`.
    Continuous { min: f64, max: f64 },
}

impl RateRange {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            RateRange::Integer { min, max } => rng.gen_range(min..=max) as f64,
            RateRange::Continuous { min, max } if min < max => rng.gen_range(min..max),
            RateRange::Continuous { min, .. } => min,
        }
    }

    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        match *self {
            RateRange::Integer { min, max } if min > max => Err(ConfigError::Invalid(format!(
                "{label}: demand rate range [{min}, {max}] is empty"
            ))),
            RateRange::Continuous { min, max } => {
                if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
                    Err(ConfigError::Invalid(format!(
                        "{label}: demand rate range [{min}, {max}) must be finite, non-negative and ordered"
                    )))
                } else {
                    Ok(())
                }
            }
            RateRange::Integer { .. } => Ok(()),
        }
    }
}

/// Demand and price parameters of one demand class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProfile {
    pub demand_rate: RateRange,
    pub price_min: f64,
    pub price_max: f64,
}

impl ClassProfile {
    /// Prices and costs are stored in cents, so both must survive rounding.
    fn validate(&self, label: &str, cost_ratio: f64) -> Result<(), ConfigError> {
        self.demand_rate.validate(label)?;
        if !(self.price_min.is_finite() && self.price_max.is_finite())
            || self.price_min < 0.01
            || self.price_min > self.price_max
        {
            return Err(ConfigError::Invalid(format!(
                "{label}: price range [{}, {}] must start at 0.01 or more and be ordered",
                self.price_min, self.price_max
            )));
        }
        if round2(round2(self.price_min) * cost_ratio) <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{label}: a price of {} at cost ratio {cost_ratio} rounds to a zero cost",
                self.price_min
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InitialStock {
    /// Every item gets its own uniform draw in `[min, max]`.
    Uniform { min: u32, max: u32 },
    /// Every item starts with the same amount. Consumes no random draws.
    Fixed { units: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Catalog size.
    pub items: u32,
    /// Simulated horizon in days.
    pub days: u32,
    pub start_date: NaiveDate,

    // Class cuts on the ascending item id: Fast up to fast_fraction,
    // Medium up to fast_fraction + medium_fraction, Slow for the rest.
    pub fast_fraction: f64,
    pub medium_fraction: f64,
    pub fast: ClassProfile,
    pub medium: ClassProfile,
    pub slow: ClassProfile,
    pub cost_ratio: f64,
    pub categories: Vec<String>,

    pub initial_stock: InitialStock,
    pub weekend_multiplier: f64,
    pub restock_threshold: u32,
    pub restock_min: u32,
    pub restock_max: u32,
    pub restock_failure_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            items: 100,
            days: 365,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            fast_fraction: 0.2,
            medium_fraction: 0.6,
            fast: ClassProfile {
                demand_rate: RateRange::Integer { min: 5, max: 15 },
                price_min: 15.0,
                price_max: 25.0,
            },
            medium: ClassProfile {
                demand_rate: RateRange::Integer { min: 1, max: 4 },
                price_min: 10.0,
                price_max: 20.0,
            },
            slow: ClassProfile {
                demand_rate: RateRange::Continuous { min: 0.0, max: 0.5 },
                price_min: 5.0,
                price_max: 15.0,
            },
            cost_ratio: 0.6,
            categories: ["Fiction", "Data Science", "Business", "Biography", "Children"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            initial_stock: InitialStock::Uniform { min: 20, max: 50 },
            weekend_multiplier: 1.3,
            restock_threshold: 5,
            restock_min: 20,
            restock_max: 50,
            restock_failure_probability: 0.10,
        }
    }
}

impl SimulationConfig {
    pub fn profile(&self, class: DemandClass) -> &ClassProfile {
        match class {
            DemandClass::Fast => &self.fast,
            DemandClass::Medium => &self.medium,
            DemandClass::Slow => &self.slow,
        }
    }

    /// Calendar date of the zero-based simulated day.
    pub fn date_for_day(&self, day: u32) -> Option<NaiveDate> {
        self.start_date.checked_add_days(Days::new(u64::from(day)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items == 0 {
            return Err(ConfigError::Invalid("catalog size must be at least 1".into()));
        }
        if self.days == 0 {
            return Err(ConfigError::Invalid("simulation horizon must be at least 1 day".into()));
        }
        if self.date_for_day(self.days - 1).is_none() {
            return Err(ConfigError::Invalid(format!(
                "a {}-day horizon from {} runs past the calendar",
                self.days, self.start_date
            )));
        }
        let fractions_ok = [self.fast_fraction, self.medium_fraction]
            .iter()
            .all(|f| (0.0..=1.0).contains(f));
        if !fractions_ok || self.fast_fraction + self.medium_fraction > 1.0 + f64::EPSILON {
            return Err(ConfigError::Invalid(format!(
                "class fractions {} / {} must lie in [0, 1] and sum to at most 1",
                self.fast_fraction, self.medium_fraction
            )));
        }
        if !(self.cost_ratio > 0.0 && self.cost_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "cost ratio {} must lie in (0, 1]",
                self.cost_ratio
            )));
        }
        self.fast.validate("fast", self.cost_ratio)?;
        self.medium.validate("medium", self.cost_ratio)?;
        self.slow.validate("slow", self.cost_ratio)?;
        if self.categories.is_empty() {
            return Err(ConfigError::Invalid("at least one category is required".into()));
        }
        if let InitialStock::Uniform { min, max } = self.initial_stock {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "initial stock range [{min}, {max}] is empty"
                )));
            }
        }
        if !(self.weekend_multiplier.is_finite() && self.weekend_multiplier >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "weekend multiplier {} must be finite and non-negative",
                self.weekend_multiplier
            )));
        }
        if self.restock_min == 0 || self.restock_min > self.restock_max {
            return Err(ConfigError::Invalid(format!(
                "restock range [{}, {}] must be non-empty and start at 1 or more",
                self.restock_min, self.restock_max
            )));
        }
        if !(0.0..=1.0).contains(&self.restock_failure_probability) {
            return Err(ConfigError::Invalid(format!(
                "restock failure probability {} must lie in [0, 1]",
                self.restock_failure_probability
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let config = SimulationConfig { items: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_day_horizon_is_rejected() {
        let config = SimulationConfig { days: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        let config = SimulationConfig { weekend_multiplier: -1.3, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn failure_probability_outside_unit_interval_is_rejected() {
        let config = SimulationConfig { restock_failure_probability: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlapping_fractions_are_rejected() {
        let config = SimulationConfig {
            fast_fraction: 0.5,
            medium_fraction: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_slow_rate_is_rejected() {
        let mut config = SimulationConfig::default();
        config.slow.demand_rate = RateRange::Continuous { min: -0.1, max: 0.5 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn prices_that_round_to_zero_are_rejected() {
        let mut config = SimulationConfig::default();
        for profile in [&mut config.fast, &mut config.medium, &mut config.slow] {
            profile.price_min = 0.001;
            profile.price_max = 0.004;
        }
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn costs_that_round_to_zero_are_rejected() {
        let mut config = SimulationConfig { cost_ratio: 0.4, ..Default::default() };
        config.slow.price_min = 0.01;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.cost_ratio = 0.6;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn smallest_valid_prices_stay_positive() {
        use crate::simulation::catalog::generate_catalog;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut config = SimulationConfig { items: 30, ..Default::default() };
        for profile in [&mut config.fast, &mut config.medium, &mut config.slow] {
            profile.price_min = 0.01;
            profile.price_max = 0.02;
        }
        config.validate().unwrap();
        for item in generate_catalog(&config, &mut StdRng::seed_from_u64(3)) {
            assert!(item.unit_price > 0.0);
            assert!(item.unit_cost > 0.0);
        }
    }

    #[test]
    fn zero_unit_restock_is_rejected() {
        let config = SimulationConfig { restock_min: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn date_for_day_counts_from_start() {
        let config = SimulationConfig::default();
        assert_eq!(config.date_for_day(0), NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(config.date_for_day(31), NaiveDate::from_ymd_opt(2023, 2, 1));
    }
}
