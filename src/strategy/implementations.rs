// src/strategy/implementations.rs

use std::collections::HashMap;
use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::strategy::traits::{DemandModel, FittedModel, ForecastError, Observation};

const YEAR_DAYS: f64 = 365.25;

/// Which seasonal components a model should try to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Seasonality {
    pub yearly: bool,
    pub weekly: bool,
    /// Sub-daily cycles. A series with one value per day carries no such signal,
    /// so this flag is accepted and has no effect on daily data.
    pub daily: bool,
}

impl Default for Seasonality {
    fn default() -> Self {
        Self { yearly: false, weekly: true, daily: false }
    }
}

fn validate_series(history: &[Observation]) -> Result<(), ForecastError> {
    if history.is_empty() {
        return Err(ForecastError::EmptySeries);
    }
    match history.iter().find(|o| !o.quantity.is_finite()) {
        Some(bad) => Err(ForecastError::NonFinite(bad.date)),
        None => Ok(()),
    }
}

// =========================================================================
// 1. Seasonal Trend Model (additive regression)
// =========================================================================

/// Additive demand model: `level + trend * t + weekday offset + yearly wave`.
///
/// Coefficients are estimated by ridge-regularised least squares over the
/// observed dates, so gaps in the series (days without sales) are fine.
/// The intercept is never penalised.
#[derive(Debug, Clone)]
pub struct SeasonalTrendModel {
    seasonality: Seasonality,
    ridge: f64,
    yearly_order: usize,
}

impl SeasonalTrendModel {
    pub fn new(seasonality: Seasonality) -> Self {
        Self { seasonality, ridge: 0.01, yearly_order: 10 }
    }

    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }
}

/// Maps a date to its regression features.
#[derive(Debug, Clone)]
struct Design {
    origin: NaiveDate,
    span: f64,
    weekly: bool,
    yearly_order: usize,
}

impl Design {
    fn width(&self) -> usize {
        2 + if self.weekly { 6 } else { 0 } + 2 * self.yearly_order
    }

    fn row(&self, date: NaiveDate) -> Vec<f64> {
        let t = (date - self.origin).num_days() as f64;
        let mut row = Vec::with_capacity(self.width());
        row.push(1.0);
        row.push(t / self.span);

        if self.weekly {
            // Monday is the baseline.
            let dow = date.weekday().num_days_from_monday();
            row.extend((1..7).map(|d| if d == dow { 1.0 } else { 0.0 }));
        }
        for k in 1..=self.yearly_order {
            let x = 2.0 * PI * k as f64 * t / YEAR_DAYS;
            row.push(x.sin());
            row.push(x.cos());
        }
        row
    }
}

#[derive(Debug, Clone)]
struct FittedSeasonalTrend {
    design: Design,
    coefficients: Vec<f64>,
}

impl FittedModel for FittedSeasonalTrend {
    fn predict(&self, dates: &[NaiveDate]) -> Vec<f64> {
        dates
            .iter()
            .map(|date| {
                self.design
                    .row(*date)
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(x, beta)| x * beta)
                    .sum::<f64>()
            })
            .collect()
    }
}

impl DemandModel for SeasonalTrendModel {
    fn fit(&self, history: &[Observation]) -> Result<Box<dyn FittedModel>, ForecastError> {
        validate_series(history)?;

        let first = history.iter().map(|o| o.date).min().ok_or(ForecastError::EmptySeries)?;
        let last = history.iter().map(|o| o.date).max().ok_or(ForecastError::EmptySeries)?;
        let design = Design {
            origin: first,
            span: (last - first).num_days().max(1) as f64,
            weekly: self.seasonality.weekly,
            yearly_order: if self.seasonality.yearly { self.yearly_order } else { 0 },
        };

        let k = design.width();
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for obs in history {
            let row = design.row(obs.date);
            for i in 0..k {
                xty[i] += row[i] * obs.quantity;
                for j in 0..k {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for (i, diag) in xtx.iter_mut().enumerate().skip(1) {
            diag[i] += self.ridge;
        }

        let coefficients = solve(xtx, xty).ok_or(ForecastError::Singular {
            features: k,
            observations: history.len(),
        })?;

        Ok(Box::new(FittedSeasonalTrend { design, coefficients }))
    }
}

/// Gaussian elimination with partial pivoting. `None` if the system is singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for (cell, p) in a[row][col..].iter_mut().zip(&pivot_row[col..]) {
                *cell -= factor * p;
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

// =========================================================================
// 2. Weekday Average Model
// =========================================================================

/// Predicts the recent average demand of the same weekday.
///
/// Only observations from the trailing `window_days` are used. A weekday that
/// never occurred in the window falls back to the overall window mean.
#[derive(Debug, Clone)]
pub struct WeekdayAverageModel {
    window_days: i64,
    weekly: bool,
}

impl WeekdayAverageModel {
    pub fn new(window_days: u32, weekly: bool) -> Self {
        Self { window_days: i64::from(window_days.max(1)), weekly }
    }
}

#[derive(Debug, Clone)]
struct FittedWeekdayAverage {
    overall: f64,
    by_weekday: HashMap<u32, f64>,
}

impl FittedModel for FittedWeekdayAverage {
    fn predict(&self, dates: &[NaiveDate]) -> Vec<f64> {
        dates
            .iter()
            .map(|date| {
                let dow = date.weekday().num_days_from_monday();
                *self.by_weekday.get(&dow).unwrap_or(&self.overall)
            })
            .collect()
    }
}

impl DemandModel for WeekdayAverageModel {
    fn fit(&self, history: &[Observation]) -> Result<Box<dyn FittedModel>, ForecastError> {
        validate_series(history)?;

        let last = history.iter().map(|o| o.date).max().ok_or(ForecastError::EmptySeries)?;
        let window: Vec<&Observation> = history
            .iter()
            .filter(|o| (last - o.date).num_days() < self.window_days)
            .collect();

        let overall = window.iter().map(|o| o.quantity).sum::<f64>() / window.len() as f64;

        let mut by_weekday = HashMap::new();
        if self.weekly {
            let mut sums: HashMap<u32, (f64, usize)> = HashMap::new();
            for obs in &window {
                let entry = sums.entry(obs.date.weekday().num_days_from_monday()).or_default();
                entry.0 += obs.quantity;
                entry.1 += 1;
            }
            by_weekday = sums
                .into_iter()
                .map(|(dow, (sum, count))| (dow, sum / count as f64))
                .collect();
        }

        Ok(Box::new(FittedWeekdayAverage { overall, by_weekday }))
    }
}
