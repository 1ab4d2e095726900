//! Linear trend extrapolation of revenue and expenses.
//!
//! The slope of each series is taken from the last three months of history
//! (`(last - third_to_last) / 2`) and projected forward month by month.
//! Confidence starts at 75% for the first projected month and decays by 15
//! points per month down to a floor of 30%.

use chrono::{Datelike, NaiveDate};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::schema::CompanyKpi;
use crate::utils::{add_months, mean, month_label, percent_of, round2, round2_opt};

pub const DEFAULT_FORECAST_MONTHS: u32 = 3;
pub const MAX_FORECAST_MONTHS: u32 = 24;
pub const MIN_HISTORY_MONTHS: usize = 3;
/// Rows of history fetched for a forecast.
pub const HISTORY_WINDOW: usize = 12;

const BASE_CONFIDENCE: f64 = 90.0;
const CONFIDENCE_DECAY: f64 = 15.0;
const MIN_CONFIDENCE: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendParams {
    #[schemars(description = "Identifier of the company")]
    pub company_id: String,
    #[schemars(description = "Months to project (default: 3, max: 24)")]
    #[serde(default = "default_forecast_months")]
    pub forecast_months: u32,
    #[schemars(description = "Adjust revenue by calendar-month seasonality (default: true)")]
    #[serde(default = "default_true")]
    pub include_seasonality: bool,
}

fn default_forecast_months() -> u32 {
    DEFAULT_FORECAST_MONTHS
}

fn default_true() -> bool {
    true
}

impl TrendParams {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            forecast_months: DEFAULT_FORECAST_MONTHS,
            include_seasonality: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthProjection {
    /// "YYYY-MM"
    pub month: String,
    pub projected_revenue: f64,
    pub projected_expenses: f64,
    pub projected_profit: f64,
    pub projected_margin_pct: Option<f64>,
    pub confidence_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendForecast {
    pub company_id: String,
    pub period: String,
    pub history_months_used: usize,
    pub seasonality_applied: bool,
    pub projections: Vec<MonthProjection>,
    pub notes: Vec<String>,
}

/// Slope of the last three points of a series.
fn recent_slope(values: &[f64]) -> f64 {
    match values {
        [.., first, _, last] => (last - first) / 2.0,
        _ => 0.0,
    }
}

pub fn confidence_for_step(step: u32) -> f64 {
    (BASE_CONFIDENCE - CONFIDENCE_DECAY * step as f64).max(MIN_CONFIDENCE)
}

struct SeasonalIndex<'a> {
    history: &'a [CompanyKpi],
    mean_revenue: f64,
}

impl<'a> SeasonalIndex<'a> {
    /// Only built when the history covers a full year with positive revenue.
    fn build(history: &'a [CompanyKpi]) -> Option<Self> {
        if history.len() < HISTORY_WINDOW {
            return None;
        }
        let mean_revenue = mean(history.iter().map(|k| k.revenue))?;
        (mean_revenue > 0.0).then_some(Self {
            history,
            mean_revenue,
        })
    }

    /// Index of the newest history row in the same calendar month.
    fn factor(&self, month: NaiveDate) -> f64 {
        self.history
            .iter()
            .rev()
            .find(|k| k.month.month() == month.month())
            .map(|k| k.revenue / self.mean_revenue)
            .unwrap_or(1.0)
    }
}

/// Projects revenue and expenses from history ordered oldest first.
pub fn predict_trends(
    company_id: &str,
    history: &[CompanyKpi],
    forecast_months: u32,
    include_seasonality: bool,
) -> Result<TrendForecast> {
    if !(1..=MAX_FORECAST_MONTHS).contains(&forecast_months) {
        return Err(AdvisorError::InvalidParameter(format!(
            "forecast_months must be between 1 and {}, got {}",
            MAX_FORECAST_MONTHS, forecast_months
        )));
    }

    if history.len() < MIN_HISTORY_MONTHS {
        return Err(AdvisorError::InsufficientHistory {
            required: MIN_HISTORY_MONTHS,
            available: history.len(),
        });
    }

    let revenues: Vec<f64> = history.iter().map(|k| k.revenue).collect();
    let expenses: Vec<f64> = history.iter().map(|k| k.expenses).collect();
    let revenue_slope = recent_slope(&revenues);
    let expense_slope = recent_slope(&expenses);

    // Non-empty: checked against MIN_HISTORY_MONTHS above
    let last = &history[history.len() - 1];

    let seasonal = if include_seasonality {
        SeasonalIndex::build(history)
    } else {
        None
    };

    debug!(
        "Forecasting {} months for {} (revenue slope {:.2}, expense slope {:.2}, seasonal: {})",
        forecast_months,
        company_id,
        revenue_slope,
        expense_slope,
        seasonal.is_some()
    );

    let projections: Vec<MonthProjection> = (1..=forecast_months)
        .map(|step| {
            let month = add_months(last.month, step);
            let factor = seasonal.as_ref().map_or(1.0, |s| s.factor(month));

            let revenue = ((last.revenue + revenue_slope * step as f64) * factor).max(0.0);
            let expenses = (last.expenses + expense_slope * step as f64).max(0.0);
            let profit = revenue - expenses;

            MonthProjection {
                month: month_label(month),
                projected_revenue: round2(revenue),
                projected_expenses: round2(expenses),
                projected_profit: round2(profit),
                projected_margin_pct: round2_opt(percent_of(profit, revenue)),
                confidence_pct: confidence_for_step(step),
            }
        })
        .collect();

    let period = match (projections.first(), projections.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.month, last.month),
        _ => String::new(),
    };

    let mut notes = vec![
        "Projections extrapolate the linear trend of the last three months".to_string(),
        "Confidence decreases the further out the projection goes".to_string(),
    ];
    notes.push(match (include_seasonality, seasonal.is_some()) {
        (true, true) => "Revenue adjusted by calendar-month seasonality".to_string(),
        (true, false) => {
            "Seasonality requested but less than a year of usable history is available"
                .to_string()
        }
        (false, _) => "No seasonality adjustment".to_string(),
    });

    Ok(TrendForecast {
        company_id: company_id.to_string(),
        period,
        history_months_used: history.len(),
        seasonality_applied: seasonal.is_some(),
        projections,
        notes,
    })
}
