//! KPI health analysis over the most recent company months.

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AdvisorError, Result};
use crate::schema::CompanyKpi;
use crate::utils::{mean, percent_change, round2, round2_opt};

pub const DEFAULT_ANALYSIS_MONTHS: usize = 6;

const LOW_MARGIN_ALERT_PCT: f64 = 10.0;
const REVENUE_DECLINE_ALERT_PCT: f64 = -5.0;
const HIGH_PAYROLL_ALERT_PCT: f64 = 40.0;
const MARGIN_OPTIMIZATION_PCT: f64 = 15.0;
const LOW_MARKETING_PCT: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    #[schemars(description = "Identifier of the company to analyse")]
    pub company_id: String,
    #[schemars(description = "Number of recent months to include (default: 6)")]
    #[serde(default = "default_months")]
    pub months: usize,
    #[schemars(description = "Include the raw monthly rows in the result (default: true)")]
    #[serde(default = "default_true")]
    pub include_comparisons: bool,
}

fn default_months() -> usize {
    DEFAULT_ANALYSIS_MONTHS
}

fn default_true() -> bool {
    true
}

impl AnalysisParams {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            months: DEFAULT_ANALYSIS_MONTHS,
            include_comparisons: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KpiAlert {
    LowMargin,
    RevenueDecline,
    HighPayroll,
}

impl fmt::Display for KpiAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiAlert::LowMargin => write!(f, "Net margin is very low (below 10%)"),
            KpiAlert::RevenueDecline => {
                write!(f, "Revenue dropped significantly month over month")
            }
            KpiAlert::HighPayroll => write!(f, "Payroll exceeds 40% of total expenses"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KpiRecommendationKind {
    OptimizeExpenses,
    IncreaseMarketing,
}

impl fmt::Display for KpiRecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiRecommendationKind::OptimizeExpenses => {
                write!(f, "Consider optimizing expenses to improve the margin")
            }
            KpiRecommendationKind::IncreaseMarketing => {
                write!(f, "Evaluate increasing the marketing investment")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueTrend {
    pub current: f64,
    /// Growth from the oldest to the latest analysed month
    pub period_growth_pct: Option<f64>,
    pub month_over_month_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginTrend {
    pub current: f64,
    pub period_average: f64,
    pub best_month: f64,
    pub worst_month: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseDistribution {
    pub infrastructure_pct: f64,
    pub payroll_pct: f64,
    pub marketing_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiAnalysis {
    pub company_id: String,
    pub period: String,
    pub latest: CompanyKpi,
    pub revenue: RevenueTrend,
    pub net_margin: MarginTrend,
    pub expense_distribution: ExpenseDistribution,
    pub alerts: Vec<KpiAlert>,
    pub recommendations: Vec<KpiRecommendationKind>,
    pub history: Option<Vec<CompanyKpi>>,
}

impl KpiAnalysis {
    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts.iter().map(ToString::to_string).collect()
    }

    pub fn recommendation_messages(&self) -> Vec<String> {
        self.recommendations.iter().map(ToString::to_string).collect()
    }
}

/// Analyses KPI rows ordered newest first.
pub fn analyze_company_kpis(
    company_id: &str,
    rows: &[CompanyKpi],
    include_comparisons: bool,
) -> Result<KpiAnalysis> {
    let (latest, oldest) = match (rows.first(), rows.last()) {
        (Some(latest), Some(oldest)) => (latest, oldest),
        _ => {
            return Err(AdvisorError::NoData(format!(
                "no KPIs found for company {}",
                company_id
            )))
        }
    };

    debug!(
        "Analysing {} KPI rows for company {}",
        rows.len(),
        company_id
    );

    let margins: Vec<f64> = rows.iter().map(|k| k.net_margin_pct).collect();
    let period_average = mean(margins.iter().copied()).unwrap_or(latest.net_margin_pct);
    let best_month = margins.iter().copied().fold(f64::MIN, f64::max);
    let worst_month = margins.iter().copied().fold(f64::MAX, f64::min);

    let mut alerts = Vec::new();
    if latest.net_margin_pct < LOW_MARGIN_ALERT_PCT {
        alerts.push(KpiAlert::LowMargin);
    }
    if latest.revenue_mom_pct < REVENUE_DECLINE_ALERT_PCT {
        alerts.push(KpiAlert::RevenueDecline);
    }
    if latest.pct_payroll > HIGH_PAYROLL_ALERT_PCT {
        alerts.push(KpiAlert::HighPayroll);
    }

    let mut recommendations = Vec::new();
    if latest.net_margin_pct < MARGIN_OPTIMIZATION_PCT {
        recommendations.push(KpiRecommendationKind::OptimizeExpenses);
    }
    if latest.pct_marketing < LOW_MARKETING_PCT {
        recommendations.push(KpiRecommendationKind::IncreaseMarketing);
    }

    Ok(KpiAnalysis {
        company_id: company_id.to_string(),
        period: format!("{} to {}", oldest.month_label(), latest.month_label()),
        latest: latest.clone(),
        revenue: RevenueTrend {
            current: latest.revenue,
            period_growth_pct: round2_opt(percent_change(oldest.revenue, latest.revenue)),
            month_over_month_pct: latest.revenue_mom_pct,
        },
        net_margin: MarginTrend {
            current: latest.net_margin_pct,
            period_average: round2(period_average),
            best_month: round2(best_month),
            worst_month: round2(worst_month),
        },
        expense_distribution: ExpenseDistribution {
            infrastructure_pct: latest.pct_infrastructure,
            payroll_pct: latest.pct_payroll,
            marketing_pct: latest.pct_marketing,
        },
        alerts,
        recommendations,
        history: include_comparisons.then(|| rows.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn kpi(month: u32, revenue: f64, margin: f64) -> CompanyKpi {
        CompanyKpi {
            company_id: "acme".to_string(),
            month: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            revenue,
            expenses: revenue * (1.0 - margin / 100.0),
            net_income: revenue * margin / 100.0,
            net_margin_pct: margin,
            infrastructure: 0.0,
            payroll: 0.0,
            marketing: 0.0,
            services: 0.0,
            costs: 0.0,
            pct_infrastructure: 20.0,
            pct_payroll: 30.0,
            pct_marketing: 10.0,
            revenue_mom_pct: 1.0,
        }
    }

    #[test]
    fn test_empty_rows_is_no_data() {
        let result = analyze_company_kpis("acme", &[], true);
        assert!(matches!(result, Err(AdvisorError::NoData(_))));
    }

    #[test]
    fn test_trends_over_period() {
        let rows = vec![kpi(3, 1200.0, 20.0), kpi(2, 1100.0, 16.0), kpi(1, 1000.0, 12.0)];
        let analysis = analyze_company_kpis("acme", &rows, false).unwrap();

        assert_eq!(analysis.period, "2024-01 to 2024-03");
        assert_eq!(analysis.revenue.current, 1200.0);
        assert_eq!(analysis.revenue.period_growth_pct, Some(20.0));
        assert_eq!(analysis.net_margin.period_average, 16.0);
        assert_eq!(analysis.net_margin.best_month, 20.0);
        assert_eq!(analysis.net_margin.worst_month, 12.0);
        assert!(analysis.alerts.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.history.is_none());
    }

    #[test]
    fn test_alerts_and_recommendations() {
        let mut latest = kpi(2, 900.0, 8.0);
        latest.revenue_mom_pct = -10.0;
        latest.pct_payroll = 45.0;
        latest.pct_marketing = 3.0;
        let rows = vec![latest, kpi(1, 1000.0, 12.0)];

        let analysis = analyze_company_kpis("acme", &rows, true).unwrap();
        assert_eq!(
            analysis.alerts,
            vec![
                KpiAlert::LowMargin,
                KpiAlert::RevenueDecline,
                KpiAlert::HighPayroll
            ]
        );
        assert_eq!(
            analysis.recommendations,
            vec![
                KpiRecommendationKind::OptimizeExpenses,
                KpiRecommendationKind::IncreaseMarketing
            ]
        );
        assert_eq!(analysis.history.as_ref().map(Vec::len), Some(2));
        assert_eq!(analysis.alert_messages().len(), 3);
    }

    #[test]
    fn test_zero_starting_revenue_has_no_growth_figure() {
        let rows = vec![kpi(2, 500.0, 20.0), kpi(1, 0.0, 0.0)];
        let analysis = analyze_company_kpis("acme", &rows, false).unwrap();
        assert_eq!(analysis.revenue.period_growth_pct, None);
    }

    #[test]
    fn test_params_defaults() {
        let params: AnalysisParams = serde_json::from_str(r#"{"companyId":"acme"}"#).unwrap();
        assert_eq!(params.months, 6);
        assert!(params.include_comparisons);
    }
}
