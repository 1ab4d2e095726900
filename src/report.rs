use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::analyze_company_kpis;
use crate::error::{AdvisorError, Result};
use crate::forecast::{predict_trends, TrendForecast, DEFAULT_FORECAST_MONTHS};
use crate::personal::PersonalSummary;
use crate::schema::CompanyKpi;

const HEALTHY_MARGIN_PCT: f64 = 15.0;
const STRONG_SAVINGS_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Summary,
    Detailed,
    Trends,
    Recommendations,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl ReportPeriod {
    /// Number of KPI months a company report looks at.
    pub fn kpi_window(&self) -> usize {
        match self {
            ReportPeriod::Yearly => 12,
            ReportPeriod::Quarterly => 3,
            ReportPeriod::Monthly => 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    #[schemars(description = "Company identifier (for business reports)")]
    #[serde(default)]
    pub company_id: Option<String>,
    #[schemars(description = "User identifier (for personal reports)")]
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub report_type: ReportType,
    #[serde(default)]
    pub period: ReportPeriod,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    NeedsAttention,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub current_revenue: f64,
    pub net_margin_pct: f64,
    pub revenue_mom_pct: f64,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyReport {
    pub company_id: String,
    pub period: ReportPeriod,
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: ExecutiveSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<CompanyKpi>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<TrendForecast>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalReport {
    pub period: ReportPeriod,
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: PersonalSummary,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FinancialReport {
    Company(CompanyReport),
    Personal(PersonalReport),
}

/// Builds a company report from KPI rows ordered newest first.
pub fn company_report(
    company_id: &str,
    rows: &[CompanyKpi],
    report_type: ReportType,
    period: ReportPeriod,
    generated_at: DateTime<Utc>,
) -> Result<CompanyReport> {
    let latest = rows.first().ok_or_else(|| {
        AdvisorError::NoData(format!("no KPIs found for company {}", company_id))
    })?;

    let status = if latest.net_margin_pct > HEALTHY_MARGIN_PCT {
        HealthStatus::Healthy
    } else {
        HealthStatus::NeedsAttention
    };

    let mut report = CompanyReport {
        company_id: company_id.to_string(),
        period,
        report_type,
        generated_at,
        executive_summary: ExecutiveSummary {
            current_revenue: latest.revenue,
            net_margin_pct: latest.net_margin_pct,
            revenue_mom_pct: latest.revenue_mom_pct,
            status,
        },
        details: None,
        forecast: None,
        alerts: Vec::new(),
        recommendations: Vec::new(),
    };

    match report_type {
        ReportType::Summary => {}
        ReportType::Detailed => report.details = Some(rows.to_vec()),
        ReportType::Trends => {
            let mut history = rows.to_vec();
            history.reverse();
            // Too little history is not an error for a report; the forecast is simply omitted
            report.forecast =
                predict_trends(company_id, &history, DEFAULT_FORECAST_MONTHS, true).ok();
        }
        ReportType::Recommendations => {
            let analysis = analyze_company_kpis(company_id, rows, false)?;
            report.alerts = analysis.alert_messages();
            report.recommendations = analysis.recommendation_messages();
        }
    }

    Ok(report)
}

pub fn personal_recommendations(summary: &PersonalSummary) -> Vec<String> {
    let mut recommendations = Vec::new();
    let month = &summary.current_month;

    if month.balance < 0.0 {
        recommendations.push(
            "Your monthly balance is negative. Consider reducing expenses or increasing income."
                .to_string(),
        );
    } else if month.balance > month.income * STRONG_SAVINGS_RATIO {
        recommendations.push("Excellent! You are saving more than 20% of your income.".to_string());
    }

    if let Some((category, amount)) = summary.top_categories(1).into_iter().next() {
        recommendations.push(format!(
            "Your largest expense is {}: ${:.2}",
            category, amount
        ));
    }

    if summary.overall.balance > 0.0 {
        recommendations.push(
            "Consider investing part of your positive balance to earn returns.".to_string(),
        );
    }

    recommendations
}

pub fn personal_report(
    summary: PersonalSummary,
    report_type: ReportType,
    period: ReportPeriod,
    generated_at: DateTime<Utc>,
) -> PersonalReport {
    let recommendations = if report_type == ReportType::Recommendations {
        personal_recommendations(&summary)
    } else {
        Vec::new()
    };

    PersonalReport {
        period,
        report_type,
        generated_at,
        summary,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personal::Totals;
    use chrono::{NaiveDate, TimeZone};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

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
            pct_marketing: 3.0,
            revenue_mom_pct: 2.0,
        }
    }

    fn summary(month: Totals, overall_balance: f64) -> PersonalSummary {
        let mut categories = BTreeMap::new();
        categories.insert("Rent".to_string(), 800.0);
        categories.insert("Food".to_string(), 300.0);
        PersonalSummary {
            user_id: "7".to_string(),
            overall: Totals {
                income: 0.0,
                expenses: 0.0,
                balance: overall_balance,
            },
            transactions_analyzed: 0,
            current_month: month,
            expenses_by_category: categories,
            recent_transactions: Vec::new(),
        }
    }

    #[test]
    fn test_period_windows() {
        assert_eq!(ReportPeriod::Yearly.kpi_window(), 12);
        assert_eq!(ReportPeriod::Quarterly.kpi_window(), 3);
        assert_eq!(ReportPeriod::Monthly.kpi_window(), 6);
    }

    #[test]
    fn test_company_summary_report() {
        let rows = vec![kpi(3, 1000.0, 18.0), kpi(2, 900.0, 12.0)];
        let report =
            company_report("acme", &rows, ReportType::Summary, ReportPeriod::Monthly, now())
                .unwrap();
        assert_eq!(report.executive_summary.status, HealthStatus::Healthy);
        assert!(report.details.is_none());

        let report =
            company_report("acme", &rows, ReportType::Detailed, ReportPeriod::Monthly, now())
                .unwrap();
        assert_eq!(report.details.map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_company_report_without_rows() {
        let result = company_report("acme", &[], ReportType::Summary, ReportPeriod::Monthly, now());
        assert!(matches!(result, Err(AdvisorError::NoData(_))));
    }

    #[test]
    fn test_company_trends_and_recommendations() {
        let rows = vec![kpi(3, 1200.0, 12.0), kpi(2, 1100.0, 12.0), kpi(1, 1000.0, 12.0)];
        let report =
            company_report("acme", &rows, ReportType::Trends, ReportPeriod::Monthly, now())
                .unwrap();
        let forecast = report.forecast.unwrap();
        assert_eq!(forecast.projections[0].month, "2024-04");
        assert_eq!(report.executive_summary.status, HealthStatus::NeedsAttention);

        let report = company_report(
            "acme",
            &rows[..2],
            ReportType::Trends,
            ReportPeriod::Monthly,
            now(),
        )
        .unwrap();
        assert!(report.forecast.is_none());

        let report = company_report(
            "acme",
            &rows,
            ReportType::Recommendations,
            ReportPeriod::Monthly,
            now(),
        )
        .unwrap();
        assert_eq!(report.recommendations.len(), 2);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_personal_recommendations() {
        let negative = summary(
            Totals {
                income: 1000.0,
                expenses: 1200.0,
                balance: -200.0,
            },
            -50.0,
        );
        let recs = personal_recommendations(&negative);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("negative"));
        assert_eq!(recs[1], "Your largest expense is Rent: $800.00");

        let saver = summary(
            Totals {
                income: 1000.0,
                expenses: 500.0,
                balance: 500.0,
            },
            2000.0,
        );
        let recs = personal_recommendations(&saver);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("20%"));
        assert!(recs[2].contains("investing"));
    }

    #[test]
    fn test_personal_report_only_recommends_when_asked() {
        let s = summary(Totals::default(), 10.0);
        let report = personal_report(s, ReportType::Summary, ReportPeriod::Monthly, now());
        assert!(report.recommendations.is_empty());
    }
}
