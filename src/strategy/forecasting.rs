// src/strategy/forecasting.rs

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::model::records::{ForecastPoint, SalesRecord};
use crate::strategy::implementations::{Seasonality, SeasonalTrendModel, WeekdayAverageModel};
use crate::strategy::traits::{DemandModel, ForecastError, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    SeasonalTrend,
    WeekdayAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Number of future days forecast per item.
    pub horizon_days: u32,
    /// Items with fewer observations are skipped.
    pub min_history: usize,
    pub model: ModelKind,
    pub seasonality: Seasonality,
    /// Trailing window of the weekday-average model.
    pub window_days: u32,
    pub parallel: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            min_history: 7,
            model: ModelKind::SeasonalTrend,
            seasonality: Seasonality::default(),
            window_days: 28,
            parallel: true,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_days == 0 {
            return Err(ConfigError::Invalid("forecast horizon must be at least 1 day".into()));
        }
        if self.min_history == 0 {
            return Err(ConfigError::Invalid("minimum history must be at least 1 observation".into()));
        }
        if self.window_days == 0 {
            return Err(ConfigError::Invalid("model window must be at least 1 day".into()));
        }
        Ok(())
    }

    pub fn build_model(&self) -> Box<dyn DemandModel> {
        match self.model {
            ModelKind::SeasonalTrend => Box::new(SeasonalTrendModel::new(self.seasonality)),
            ModelKind::WeekdayAverage => {
                Box::new(WeekdayAverageModel::new(self.window_days, self.seasonality.weekly))
            }
        }
    }
}

/// Per-item daily demand, keyed and ordered by item id, each series ordered by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesHistory {
    series: BTreeMap<u32, BTreeMap<NaiveDate, f64>>,
}

impl SalesHistory {
    /// Sums quantities per (item, date).
    pub fn from_sales(records: &[SalesRecord]) -> Self {
        let mut history = Self::default();
        for record in records {
            *history
                .series
                .entry(record.item_id)
                .or_default()
                .entry(record.date)
                .or_default() += f64::from(record.quantity_sold);
        }
        history
    }

    /// Makes items known even if they never sold, so they show up as skipped.
    pub fn register_items(&mut self, item_ids: impl IntoIterator<Item = u32>) {
        for id in item_ids {
            self.series.entry(id).or_default();
        }
    }

    pub fn item_count(&self) -> usize {
        self.series.len()
    }

    pub fn observation_count(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    /// Latest date across every item.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.series.values().filter_map(|s| s.keys().next_back().copied()).max()
    }

    pub fn series(&self, item_id: u32) -> Option<Vec<Observation>> {
        self.series.get(&item_id).map(|s| to_observations(s))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Vec<Observation>)> + '_ {
        self.series.iter().map(|(id, s)| (*id, to_observations(s)))
    }
}

fn to_observations(series: &BTreeMap<NaiveDate, f64>) -> Vec<Observation> {
    series
        .iter()
        .map(|(date, quantity)| Observation { date: *date, quantity: *quantity })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    InsufficientHistory { observations: usize },
    FitFailed(ForecastError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub item_id: u32,
    pub last_date: Option<NaiveDate>,
    pub reason: SkipReason,
}

/// Result of one pipeline pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastRun {
    /// Grouped by item, then by date, both ascending.
    pub points: Vec<ForecastPoint>,
    pub skipped: Vec<SkippedItem>,
    /// Latest date of the whole history.
    pub history_end: Option<NaiveDate>,
}

impl ForecastRun {
    pub fn forecast_items(&self) -> usize {
        let mut ids: Vec<u32> = self.points.iter().map(|p| p.item_id).collect();
        ids.dedup();
        ids.len()
    }
}

pub struct ForecastPipeline<'a> {
    model: &'a dyn DemandModel,
    config: &'a ForecastConfig,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(model: &'a dyn DemandModel, config: &'a ForecastConfig) -> Self {
        Self { model, config }
    }

    /// Forecasts every item in `history`. A failing item never aborts the batch.
    pub fn run(&self, history: &SalesHistory) -> ForecastRun {
        let series: Vec<(u32, Vec<Observation>)> = history.iter().collect();

        let results: Vec<(u32, Option<NaiveDate>, Result<Vec<ForecastPoint>, SkipReason>)> =
            if self.config.parallel {
                series
                    .par_iter()
                    .map(|(id, obs)| (*id, obs.last().map(|o| o.date), self.forecast_item(*id, obs)))
                    .collect()
            } else {
                series
                    .iter()
                    .map(|(id, obs)| (*id, obs.last().map(|o| o.date), self.forecast_item(*id, obs)))
                    .collect()
            };

        let mut run = ForecastRun { history_end: history.latest_date(), ..Default::default() };
        for (item_id, last_date, result) in results {
            match result {
                Ok(points) => run.points.extend(points),
                Err(reason) => {
                    match &reason {
                        SkipReason::InsufficientHistory { observations } => {
                            debug!(item_id, observations, "skipping item with short history")
                        }
                        SkipReason::FitFailed(e) => {
                            warn!(item_id, error = %e, "forecast fit failed, skipping item")
                        }
                    }
                    run.skipped.push(SkippedItem { item_id, last_date, reason });
                }
            }
        }

        info!(
            items = series.len(),
            forecast_items = run.forecast_items(),
            skipped = run.skipped.len(),
            points = run.points.len(),
            "forecast finished"
        );
        run
    }

    /// Fits one series and keeps the `horizon_days` predictions strictly after
    /// its last date, clamped to zero.
    pub fn forecast_item(
        &self,
        item_id: u32,
        history: &[Observation],
    ) -> Result<Vec<ForecastPoint>, SkipReason> {
        let Some(last) = history.last().map(|o| o.date) else {
            return Err(SkipReason::InsufficientHistory { observations: 0 });
        };
        if history.len() < self.config.min_history {
            return Err(SkipReason::InsufficientHistory { observations: history.len() });
        }

        let fitted = self.model.fit(history).map_err(SkipReason::FitFailed)?;

        let horizon = self.config.horizon_days as usize;
        let mut dates: Vec<NaiveDate> = history.iter().map(|o| o.date).collect();
        dates.extend(future_dates(last, self.config.horizon_days));
        let predictions = fitted.predict(&dates);

        Ok(dates
            .into_iter()
            .zip(predictions)
            .filter(|(date, _)| *date > last)
            .take(horizon)
            .map(|(date, value)| ForecastPoint {
                date,
                item_id,
                // f64::max drops NaN in favour of 0.
                predicted_demand: value.max(0.0),
            })
            .collect())
    }
}

/// The `count` calendar days following `after`.
pub fn future_dates(after: NaiveDate, count: u32) -> impl Iterator<Item = NaiveDate> {
    (1..=u64::from(count)).map_while(move |d| after.checked_add_days(Days::new(d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::traits::FittedModel;

    /// Predicts `value` everywhere.
    #[derive(Debug)]
    struct ConstantModel(f64);

    #[derive(Debug)]
    struct Constant(f64);

    impl FittedModel for Constant {
        fn predict(&self, dates: &[NaiveDate]) -> Vec<f64> {
            vec![self.0; dates.len()]
        }
    }

    impl DemandModel for ConstantModel {
        fn fit(&self, _: &[Observation]) -> Result<Box<dyn FittedModel>, ForecastError> {
            Ok(Box::new(Constant(self.0)))
        }
    }

    /// Fails on one item (recognised by its series length).
    #[derive(Debug)]
    struct FailsOnLength(usize);

    impl DemandModel for FailsOnLength {
        fn fit(&self, history: &[Observation]) -> Result<Box<dyn FittedModel>, ForecastError> {
            if history.len() == self.0 {
                Err(ForecastError::Singular { features: 8, observations: history.len() })
            } else {
                Ok(Box::new(Constant(1.0)))
            }
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
    }

    fn sales(item_id: u32, days: u64) -> Vec<SalesRecord> {
        (0..days)
            .map(|d| SalesRecord {
                date: start() + Days::new(d),
                item_id,
                quantity_sold: 3,
                unit_price: 10.0,
            })
            .collect()
    }

    fn sequential() -> ForecastConfig {
        ForecastConfig { parallel: false, ..Default::default() }
    }

    #[test]
    fn history_sums_same_day_sales() {
        let mut records = sales(1, 2);
        records.push(SalesRecord { date: start(), item_id: 1, quantity_sold: 4, unit_price: 10.0 });
        let history = SalesHistory::from_sales(&records);
        let series = history.series(1).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].quantity, 7.0);
        assert_eq!(history.observation_count(), 2);
    }

    #[test]
    fn six_days_skipped_seven_processed() {
        let mut records = sales(1, 6);
        records.extend(sales(2, 7));
        let history = SalesHistory::from_sales(&records);
        let config = sequential();
        let model = ConstantModel(2.0);
        let run = ForecastPipeline::new(&model, &config).run(&history);

        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].item_id, 1);
        assert_eq!(run.skipped[0].reason, SkipReason::InsufficientHistory { observations: 6 });

        assert_eq!(run.points.len(), 7);
        assert!(run.points.iter().all(|p| p.item_id == 2));
        assert_eq!(run.points[0].date, start() + Days::new(7));
        assert!(run.points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn negative_predictions_are_clamped() {
        let history = SalesHistory::from_sales(&sales(1, 10));
        let config = sequential();
        let model = ConstantModel(-3.5);
        let run = ForecastPipeline::new(&model, &config).run(&history);
        assert_eq!(run.points.len(), 7);
        assert!(run.points.iter().all(|p| p.predicted_demand == 0.0));
    }

    #[test]
    fn fit_failure_skips_only_that_item() {
        let mut records = sales(1, 9);
        records.extend(sales(2, 12));
        let history = SalesHistory::from_sales(&records);
        let config = ForecastConfig::default();
        let model = FailsOnLength(9);
        let run = ForecastPipeline::new(&model, &config).run(&history);

        assert_eq!(run.points.len(), 7);
        assert!(run.points.iter().all(|p| p.item_id == 2));
        assert!(matches!(run.skipped[0].reason, SkipReason::FitFailed(_)));
        assert_eq!(run.skipped[0].last_date, Some(start() + Days::new(8)));
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let mut records = Vec::new();
        for id in 1..=12 {
            records.extend(sales(id, 7 + u64::from(id)));
        }
        let history = SalesHistory::from_sales(&records);
        let model = SeasonalTrendModel::new(Seasonality::default());

        let parallel = ForecastConfig::default();
        let sequential = sequential();
        let a = ForecastPipeline::new(&model, &parallel).run(&history);
        let b = ForecastPipeline::new(&model, &sequential).run(&history);
        assert_eq!(a, b);
        assert!(a.points.windows(2).all(|w| (w[0].item_id, w[0].date) < (w[1].item_id, w[1].date)));
    }

    #[test]
    fn registered_items_without_sales_are_skipped() {
        let mut history = SalesHistory::from_sales(&sales(1, 8));
        history.register_items([1, 2]);
        let config = sequential();
        let model = ConstantModel(1.0);
        let run = ForecastPipeline::new(&model, &config).run(&history);

        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].item_id, 2);
        assert_eq!(run.skipped[0].last_date, None);
        assert_eq!(run.history_end, Some(start() + Days::new(7)));
    }

    #[test]
    fn horizon_follows_config() {
        let history = SalesHistory::from_sales(&sales(1, 7));
        let config = ForecastConfig { horizon_days: 3, ..sequential() };
        let model = ConstantModel(1.0);
        let run = ForecastPipeline::new(&model, &config).run(&history);
        assert_eq!(run.points.len(), 3);
    }

    #[test]
    fn zero_horizon_is_invalid() {
        let config = ForecastConfig { horizon_days: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
