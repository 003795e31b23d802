// src/strategy/optimization.rs

//! Reorder point calculation.
//!
//! The reorder point is the stock level at which a replenishment order should
//! be placed: the demand expected while the order is in transit plus a fixed
//! safety buffer.
//!
//! Formula: ROP = round(PredictedDemand * LeadTimeDays + SafetyStock)

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ConfigError};
use crate::model::records::{ForecastPoint, ReorderRecommendation};
use crate::strategy::forecasting::{future_dates, ForecastRun, SkipReason};

/// What to recommend for items that were skipped for lack of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortHistoryPolicy {
    /// No recommendation at all.
    Omit,
    /// Zero predicted demand, reorder point equal to the safety stock.
    SafetyStock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReorderConfig {
    pub lead_time_days: f64,
    pub safety_stock_units: f64,
    pub short_history_policy: ShortHistoryPolicy,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            lead_time_days: 2.0,
            safety_stock_units: 5.0,
            short_history_policy: ShortHistoryPolicy::Omit,
        }
    }
}

impl ReorderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lead_time_days.is_finite() && self.lead_time_days >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "lead time {} must be finite and non-negative",
                self.lead_time_days
            )));
        }
        if !(self.safety_stock_units.is_finite() && self.safety_stock_units >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "safety stock {} must be finite and non-negative",
                self.safety_stock_units
            )));
        }
        Ok(())
    }
}

/// Calculates the reorder point for one day of predicted demand.
///
/// Halves round to the nearest even integer. The result is never negative.
pub fn reorder_point(predicted_demand: f64, lead_time_days: f64, safety_stock_units: f64) -> u32 {
    let raw = (predicted_demand * lead_time_days + safety_stock_units).round_ties_even();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        raw as u32
    }
}

#[derive(Debug, Clone)]
pub struct ReorderCalculator {
    config: ReorderConfig,
}

impl ReorderCalculator {
    pub fn new(config: ReorderConfig) -> Self {
        Self { config }
    }

    /// One recommendation per forecast point, in the same order.
    pub fn recommend(&self, points: &[ForecastPoint]) -> Vec<ReorderRecommendation> {
        points
            .iter()
            .map(|p| ReorderRecommendation {
                date: p.date,
                item_id: p.item_id,
                predicted_demand: p.predicted_demand,
                reorder_point: reorder_point(
                    p.predicted_demand,
                    self.config.lead_time_days,
                    self.config.safety_stock_units,
                ),
            })
            .collect()
    }

    /// Recommendations for a whole pipeline pass, including the short-history
    /// fallback when configured. Ordered by item, then date.
    pub fn recommend_run(&self, run: &ForecastRun, horizon_days: u32) -> Vec<ReorderRecommendation> {
        let mut recommendations = self.recommend(&run.points);

        if self.config.short_history_policy == ShortHistoryPolicy::SafetyStock {
            let floor = reorder_point(0.0, self.config.lead_time_days, self.config.safety_stock_units);
            for skipped in &run.skipped {
                if !matches!(skipped.reason, SkipReason::InsufficientHistory { .. }) {
                    continue;
                }
                let Some(anchor) = skipped.last_date.or(run.history_end) else {
                    continue;
                };
                recommendations.extend(future_dates(anchor, horizon_days).map(|date| {
                    ReorderRecommendation {
                        date,
                        item_id: skipped.item_id,
                        predicted_demand: 0.0,
                        reorder_point: floor,
                    }
                }));
            }
            recommendations.sort_by_key(|r| (r.item_id, r.date));
        }

        recommendations
    }
}

/// Destination of the recommendation set. Every write supersedes the previous
/// set entirely; nothing is merged.
pub trait RecommendationStore {
    fn replace_all(&mut self, recommendations: Vec<ReorderRecommendation>) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecommendations {
    current: Vec<ReorderRecommendation>,
}

impl InMemoryRecommendations {
    pub fn current(&self) -> &[ReorderRecommendation] {
        &self.current
    }
}

impl RecommendationStore for InMemoryRecommendations {
    fn replace_all(&mut self, recommendations: Vec<ReorderRecommendation>) -> Result<(), AppError> {
        self.current = recommendations;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::forecasting::SkippedItem;
    use crate::strategy::traits::ForecastError;
    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;

    fn day(d: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap() + Days::new(d)
    }

    fn point(item_id: u32, d: u64, predicted_demand: f64) -> ForecastPoint {
        ForecastPoint { date: day(d), item_id, predicted_demand }
    }

    #[test]
    fn textbook_reorder_point() {
        assert_eq!(reorder_point(10.0, 2.0, 5.0), 25);
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(reorder_point(0.25, 2.0, 5.0), 6); // 5.5
        assert_eq!(reorder_point(0.75, 2.0, 5.0), 6); // 6.5
        assert_eq!(reorder_point(0.8, 2.0, 5.0), 7); // 6.6
    }

    #[test]
    fn zero_demand_yields_safety_stock() {
        assert_eq!(reorder_point(0.0, 2.0, 5.0), 5);
    }

    #[test]
    fn one_recommendation_per_point() {
        let calculator = ReorderCalculator::new(ReorderConfig::default());
        let points = vec![point(1, 1, 10.0), point(1, 2, 3.2), point(2, 1, 0.0)];
        let recs = calculator.recommend(&points);
        assert_eq!(recs.len(), 3);
        assert_eq!(
            recs.iter().map(|r| r.reorder_point).collect::<Vec<_>>(),
            vec![25, 11, 5]
        );
    }

    #[test]
    fn second_write_replaces_first() {
        let calculator = ReorderCalculator::new(ReorderConfig::default());
        let mut store = InMemoryRecommendations::default();

        store.replace_all(calculator.recommend(&[point(1, 1, 4.0), point(1, 2, 4.0)])).unwrap();
        store.replace_all(calculator.recommend(&[point(9, 1, 1.0)])).unwrap();

        assert_eq!(store.current().len(), 1);
        assert_eq!(store.current()[0].item_id, 9);
        assert_eq!(store.current()[0].reorder_point, 7);
    }

    fn run_with_skips() -> ForecastRun {
        ForecastRun {
            points: vec![point(2, 10, 1.0)],
            skipped: vec![
                SkippedItem {
                    item_id: 1,
                    last_date: Some(day(3)),
                    reason: SkipReason::InsufficientHistory { observations: 4 },
                },
                SkippedItem {
                    item_id: 3,
                    last_date: None,
                    reason: SkipReason::InsufficientHistory { observations: 0 },
                },
                SkippedItem {
                    item_id: 4,
                    last_date: Some(day(9)),
                    reason: SkipReason::FitFailed(ForecastError::EmptySeries),
                },
            ],
            history_end: Some(day(9)),
        }
    }

    #[test]
    fn short_history_is_omitted_by_default() {
        let calculator = ReorderCalculator::new(ReorderConfig::default());
        let recs = calculator.recommend_run(&run_with_skips(), 7);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].item_id, 2);
    }

    #[test]
    fn safety_stock_policy_covers_short_histories_only() {
        let calculator = ReorderCalculator::new(ReorderConfig {
            short_history_policy: ShortHistoryPolicy::SafetyStock,
            ..Default::default()
        });
        let recs = calculator.recommend_run(&run_with_skips(), 7);

        // One real point, 7 + 7 fallback points, nothing for the failed fit.
        assert_eq!(recs.len(), 15);
        assert!(recs.iter().all(|r| r.item_id != 4));
        assert!(recs.windows(2).all(|w| (w[0].item_id, w[0].date) <= (w[1].item_id, w[1].date)));

        let item1: Vec<_> = recs.iter().filter(|r| r.item_id == 1).collect();
        assert_eq!(item1[0].date, day(4));
        assert!(item1.iter().all(|r| r.reorder_point == 5 && r.predicted_demand == 0.0));

        let item3: Vec<_> = recs.iter().filter(|r| r.item_id == 3).collect();
        assert_eq!(item3[0].date, day(10));
    }

    #[test]
    fn negative_lead_time_is_invalid() {
        let config = ReorderConfig { lead_time_days: -1.0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    proptest! {
        #[test]
        fn reorder_point_never_below_safety_stock(
            demand in 0.0f64..1_000.0,
            lead in 0.0f64..30.0,
            safety in 0u32..100,
        ) {
            let rop = reorder_point(demand, lead, f64::from(safety));
            prop_assert!(rop >= safety);
            prop_assert!((f64::from(rop) - (demand * lead + f64::from(safety))).abs() <= 0.5);
        }
    }
}
