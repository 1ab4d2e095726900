//! Named analysis tools over the financial store.
//!
//! Every tool returns a [`ToolResponse`] envelope. Domain failures (missing
//! data, too little history, bad parameters) and store failures are reported
//! inside the envelope with `success: false` rather than as errors, so callers
//! such as the chat advisor can fall back gracefully.

use chrono::{Local, NaiveDate, Utc};
use log::{error, info, warn};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::analysis::{analyze_company_kpis, AnalysisParams, KpiAnalysis, DEFAULT_ANALYSIS_MONTHS};
use crate::error::{AdvisorError, Result};
use crate::forecast::{predict_trends, TrendForecast, TrendParams, HISTORY_WINDOW};
use crate::optimization::{suggest_budget_optimization, BudgetOptimization, OptimizationParams};
use crate::personal::{summarize_personal_finances, PersonalSummary};
use crate::report::{
    company_report, personal_report, FinancialReport, ReportParams,
};
use crate::scenarios::{calculate_scenarios, ScenarioComparison, ScenarioParams};
use crate::store::FinancialStore;

pub const COMPANY_KPIS_SCHEME: &str = "company-kpis://";
pub const PERSONAL_FINANCES_SCHEME: &str = "personal-finances://";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", content = "parameters", rename_all = "snake_case")]
pub enum ToolCall {
    AnalyzeCompanyKpis(AnalysisParams),
    PredictFinancialTrends(TrendParams),
    SuggestBudgetOptimization(OptimizationParams),
    CalculateScenarios(ScenarioParams),
    GenerateFinancialReport(ReportParams),
}

impl ToolCall {
    /// Builds a call from a tool name and its raw JSON parameters.
    pub fn parse(tool: &str, parameters: Value) -> Result<Self> {
        let call = match tool {
            "analyze_company_kpis" => ToolCall::AnalyzeCompanyKpis(from_params(parameters)?),
            "predict_financial_trends" => {
                ToolCall::PredictFinancialTrends(from_params(parameters)?)
            }
            "suggest_budget_optimization" => {
                ToolCall::SuggestBudgetOptimization(from_params(parameters)?)
            }
            "calculate_scenarios" => ToolCall::CalculateScenarios(from_params(parameters)?),
            "generate_financial_report" => {
                ToolCall::GenerateFinancialReport(from_params(parameters)?)
            }
            other => return Err(AdvisorError::UnknownTool(other.to_string())),
        };
        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::AnalyzeCompanyKpis(_) => "analyze_company_kpis",
            ToolCall::PredictFinancialTrends(_) => "predict_financial_trends",
            ToolCall::SuggestBudgetOptimization(_) => "suggest_budget_optimization",
            ToolCall::CalculateScenarios(_) => "calculate_scenarios",
            ToolCall::GenerateFinancialReport(_) => "generate_financial_report",
        }
    }
}

fn from_params<T: serde::de::DeserializeOwned>(parameters: Value) -> Result<T> {
    serde_json::from_value(parameters)
        .map_err(|e| AdvisorError::InvalidParameter(e.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok<T: Serialize>(message: impl Into<String>, data: &T) -> Result<Self> {
        Ok(Self {
            success: true,
            message: message.into(),
            data: Some(serde_json::to_value(data)?),
            error: None,
        })
    }

    pub fn failed(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }

    /// Typed view of `data`.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn descriptor<T: JsonSchema>(name: &'static str, description: &'static str) -> ToolDescriptor {
    ToolDescriptor {
        name,
        description,
        input_schema: serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

#[derive(Clone)]
pub struct Toolbox {
    store: Arc<dyn FinancialStore>,
}

impl Toolbox {
    pub fn new(store: Arc<dyn FinancialStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn FinancialStore> {
        &self.store
    }

    pub fn catalog() -> Vec<ToolDescriptor> {
        vec![
            descriptor::<AnalysisParams>(
                "analyze_company_kpis",
                "Analyses a company's financial KPIs: revenue and margin trends, expense mix, alerts and recommendations",
            ),
            descriptor::<TrendParams>(
                "predict_financial_trends",
                "Projects future revenue, expenses and margin from historical monthly KPIs",
            ),
            descriptor::<OptimizationParams>(
                "suggest_budget_optimization",
                "Suggests per-area expense reductions to improve the net margin",
            ),
            descriptor::<ScenarioParams>(
                "calculate_scenarios",
                "Evaluates what-if scenarios of revenue and expense changes",
            ),
            descriptor::<ReportParams>(
                "generate_financial_report",
                "Generates a financial report for a company or a personal customer",
            ),
        ]
    }

    /// Readable resources; `{id}` stands for a company or user identifier.
    pub fn resources() -> Vec<ResourceDescriptor> {
        vec![
            ResourceDescriptor {
                uri: "company-kpis://{id}",
                name: "Company KPIs",
                description: "Most recent monthly KPIs of a company, newest first",
                mime_type: "application/json",
            },
            ResourceDescriptor {
                uri: "personal-finances://{id}",
                name: "Personal finances",
                description: "Income, expenses and spending categories of a personal customer",
                mime_type: "application/json",
            },
        ]
    }

    /// Runs a tool and wraps the outcome in a response envelope.
    pub async fn call(&self, call: ToolCall) -> ToolResponse {
        let name = call.name();
        info!("Running tool {}", name);

        let outcome = match call {
            ToolCall::AnalyzeCompanyKpis(p) => self.analyze_kpis(&p).await.and_then(|a| {
                ToolResponse::ok("KPI analysis completed", &a)
            }),
            ToolCall::PredictFinancialTrends(p) => {
                self.predict_trends(&p).await.and_then(|f| {
                    let message = format!("Trend forecast generated for {} months", f.projections.len());
                    ToolResponse::ok(message, &f)
                })
            }
            ToolCall::SuggestBudgetOptimization(p) => self
                .optimize_budget(&p)
                .await
                .and_then(|o| ToolResponse::ok("Budget optimization analysis completed", &o)),
            ToolCall::CalculateScenarios(p) => self.scenarios(&p).await.and_then(|s| {
                let message = format!("Analysis of {} scenarios completed", s.scenarios.len());
                ToolResponse::ok(message, &s)
            }),
            ToolCall::GenerateFinancialReport(p) => self
                .report(&p)
                .await
                .and_then(|r| ToolResponse::ok("Financial report generated", &r)),
        };

        outcome.unwrap_or_else(|e| {
            if e.is_domain_error() {
                warn!("Tool {} could not produce a result: {}", name, e);
                ToolResponse::failed(e.to_string(), None)
            } else {
                error!("Tool {} failed: {}", name, e);
                ToolResponse::failed(format!("Error running {}", name), Some(e.to_string()))
            }
        })
    }

    pub async fn analyze_kpis(&self, params: &AnalysisParams) -> Result<KpiAnalysis> {
        let rows = self
            .store
            .company_kpis(&params.company_id, params.months.max(1))
            .await?;
        analyze_company_kpis(&params.company_id, &rows, params.include_comparisons)
    }

    pub async fn predict_trends(&self, params: &TrendParams) -> Result<TrendForecast> {
        let mut history = self
            .store
            .company_kpis(&params.company_id, HISTORY_WINDOW)
            .await?;
        history.reverse();
        predict_trends(
            &params.company_id,
            &history,
            params.forecast_months,
            params.include_seasonality,
        )
    }

    pub async fn optimize_budget(&self, params: &OptimizationParams) -> Result<BudgetOptimization> {
        let rows = self.store.company_kpis(&params.company_id, 1).await?;
        suggest_budget_optimization(
            &params.company_id,
            rows.first(),
            params.target_margin_increase,
            &params.priority_areas,
        )
    }

    pub async fn scenarios(&self, params: &ScenarioParams) -> Result<ScenarioComparison> {
        let rows = self.store.company_kpis(&params.company_id, 1).await?;
        calculate_scenarios(&params.company_id, rows.first(), &params.scenarios)
    }

    pub async fn personal_summary(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<PersonalSummary> {
        let transactions = self.store.personal_transactions(user_id, limit).await?;
        Ok(summarize_personal_finances(
            user_id,
            &transactions,
            today(),
        ))
    }

    pub async fn report(&self, params: &ReportParams) -> Result<FinancialReport> {
        let generated_at = Utc::now();
        if let Some(company_id) = params.company_id.as_deref() {
            let rows = self
                .store
                .company_kpis(company_id, params.period.kpi_window())
                .await?;
            let report = company_report(
                company_id,
                &rows,
                params.report_type,
                params.period,
                generated_at,
            )?;
            Ok(FinancialReport::Company(report))
        } else if let Some(user_id) = params.user_id.as_deref() {
            let summary = self.personal_summary(user_id, None).await?;
            Ok(FinancialReport::Personal(personal_report(
                summary,
                params.report_type,
                params.period,
                generated_at,
            )))
        } else {
            Err(AdvisorError::InvalidParameter(
                "either companyId or userId is required".to_string(),
            ))
        }
    }

    /// Reads a resource such as `company-kpis://<id>` or `personal-finances://<id>`.
    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        if let Some(company_id) = uri.strip_prefix(COMPANY_KPIS_SCHEME) {
            if !company_id.is_empty() {
                let rows = self
                    .store
                    .company_kpis(company_id, DEFAULT_ANALYSIS_MONTHS)
                    .await?;
                return Ok(serde_json::to_value(rows)?);
            }
        }
        if let Some(user_id) = uri.strip_prefix(PERSONAL_FINANCES_SCHEME) {
            if !user_id.is_empty() {
                let summary = self.personal_summary(user_id, None).await?;
                return Ok(serde_json::to_value(summary)?);
            }
        }
        Err(AdvisorError::UnknownResource(uri.to_string()))
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_tool_with_defaults() {
        let call = ToolCall::parse("predict_financial_trends", json!({"companyId": "acme"})).unwrap();
        match call {
            ToolCall::PredictFinancialTrends(p) => {
                assert_eq!(p.company_id, "acme");
                assert_eq!(p.forecast_months, 3);
                assert!(p.include_seasonality);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_tool_and_bad_params() {
        assert!(matches!(
            ToolCall::parse("delete_everything", json!({})),
            Err(AdvisorError::UnknownTool(_))
        ));
        assert!(matches!(
            ToolCall::parse("calculate_scenarios", json!({"companyId": "acme"})),
            Err(AdvisorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_tagged_representation() {
        let call: ToolCall = serde_json::from_value(json!({
            "tool": "suggest_budget_optimization",
            "parameters": {"companyId": "acme", "targetMarginIncrease": 3}
        }))
        .unwrap();
        assert_eq!(call.name(), "suggest_budget_optimization");
    }

    #[test]
    fn test_catalog_lists_every_tool_with_schema() {
        let catalog = Toolbox::catalog();
        let names: Vec<&str> = catalog.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "analyze_company_kpis",
                "predict_financial_trends",
                "suggest_budget_optimization",
                "calculate_scenarios",
                "generate_financial_report"
            ]
        );
        let scenario_schema = &catalog[3].input_schema;
        assert!(scenario_schema["properties"]["scenarios"].is_object());
    }

    #[test]
    fn test_resources_match_readable_schemes() {
        let resources = Toolbox::resources();
        assert_eq!(resources.len(), 2);
        assert!(resources[0].uri.starts_with(COMPANY_KPIS_SCHEME));
        assert!(resources[1].uri.starts_with(PERSONAL_FINANCES_SCHEME));
        assert!(resources.iter().all(|r| r.mime_type == "application/json"));
    }
}
