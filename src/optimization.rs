use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};
use crate::schema::{CompanyKpi, ExpenseCategory};
use crate::utils::{percent_of, round2, round2_opt};

pub const DEFAULT_TARGET_MARGIN_INCREASE: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationParams {
    #[schemars(description = "Identifier of the company")]
    pub company_id: String,
    #[schemars(description = "Target net margin increase in percentage points (default: 5)")]
    #[serde(default = "default_target")]
    pub target_margin_increase: f64,
    #[schemars(
        description = "Expense areas to optimise: marketing, payroll, infrastructure (default: all three)"
    )]
    #[serde(default = "default_priority_areas")]
    pub priority_areas: Vec<String>,
}

fn default_target() -> f64 {
    DEFAULT_TARGET_MARGIN_INCREASE
}

pub fn default_priority_areas() -> Vec<String> {
    vec![
        "marketing".to_string(),
        "payroll".to_string(),
        "infrastructure".to_string(),
    ]
}

impl OptimizationParams {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            target_margin_increase: DEFAULT_TARGET_MARGIN_INCREASE,
            priority_areas: default_priority_areas(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Feasibility {
    High,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaOptimization {
    pub area: ExpenseCategory,
    pub label: String,
    pub current_amount: f64,
    pub current_share_pct: f64,
    pub reduction_pct: f64,
    pub estimated_saving: f64,
    pub new_amount: f64,
    pub new_share_pct: Option<f64>,
    pub margin_impact_pct: Option<f64>,
    pub difficulty: Difficulty,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationTarget {
    pub target_margin_pct: f64,
    pub required_improvement: f64,
    pub achievable_margin_increase: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub total_estimated_saving: f64,
    pub feasibility: Feasibility,
    pub implementation_window: String,
    pub overall_risk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetOptimization {
    pub company_id: String,
    pub current_margin_pct: f64,
    pub revenue: f64,
    pub total_expenses: f64,
    pub target: OptimizationTarget,
    pub areas: Vec<AreaOptimization>,
    pub summary: OptimizationSummary,
    pub next_steps: Vec<String>,
}

impl BudgetOptimization {
    /// First suggestion for each area, formatted as "Area: suggestion".
    pub fn headline_recommendations(&self) -> Vec<String> {
        self.areas
            .iter()
            .map(|area| {
                let first = area
                    .recommendations
                    .first()
                    .map(String::as_str)
                    .unwrap_or("Review spending in this area");
                format!("{}: {}", area.label, first)
            })
            .collect()
    }
}

/// Larger expense shares get a more aggressive suggested cut.
pub fn reduction_for_share(share_pct: f64) -> f64 {
    if share_pct > 30.0 {
        15.0
    } else if share_pct > 20.0 {
        10.0
    } else {
        5.0
    }
}

fn difficulty_for(area: ExpenseCategory) -> Difficulty {
    match area {
        ExpenseCategory::Payroll => Difficulty::High,
        ExpenseCategory::Infrastructure => Difficulty::Medium,
        _ => Difficulty::Low,
    }
}

fn area_recommendations(area: ExpenseCategory) -> Vec<String> {
    let items: &[&str] = match area {
        ExpenseCategory::Marketing => &[
            "Evaluate the ROI of current campaigns",
            "Focus spend on the most effective digital channels",
            "Weigh organic against paid marketing",
            "Review agreements with external agencies",
        ],
        ExpenseCategory::Payroll => &[
            "Review the organizational structure",
            "Evaluate productivity by department",
            "Consider automating manual processes",
            "Optimize compensation schemes",
        ],
        ExpenseCategory::Infrastructure => &[
            "Review recurring service contracts",
            "Evaluate migrating workloads to cloud services",
            "Optimize the use of physical space",
            "Renegotiate supplier contracts",
        ],
        _ => &["Review spending in this category"],
    };
    items.iter().map(|s| s.to_string()).collect()
}

fn optimizable_area(name: &str) -> Option<ExpenseCategory> {
    match name.parse::<ExpenseCategory>() {
        Ok(
            area @ (ExpenseCategory::Marketing
            | ExpenseCategory::Payroll
            | ExpenseCategory::Infrastructure),
        ) => Some(area),
        _ => None,
    }
}

/// Suggests per-area expense cuts against the latest KPI month.
pub fn suggest_budget_optimization(
    company_id: &str,
    latest: Option<&CompanyKpi>,
    target_margin_increase: f64,
    priority_areas: &[String],
) -> Result<BudgetOptimization> {
    let kpi = latest.ok_or_else(|| {
        AdvisorError::NoData(format!(
            "no current KPIs available to optimise for company {}",
            company_id
        ))
    })?;

    if !target_margin_increase.is_finite() || target_margin_increase < 0.0 {
        return Err(AdvisorError::InvalidParameter(format!(
            "target margin increase must be a non-negative number, got {}",
            target_margin_increase
        )));
    }

    let mut areas: Vec<AreaOptimization> = Vec::new();
    for name in priority_areas {
        let Some(area) = optimizable_area(name) else {
            warn!("Skipping unsupported optimization area '{}'", name);
            continue;
        };
        if areas.iter().any(|a| a.area == area) {
            continue;
        }

        let current_amount = kpi.expense(area);
        let current_share_pct = kpi.share_pct(area);
        let reduction_pct = reduction_for_share(current_share_pct);
        let saving = current_amount * reduction_pct / 100.0;
        let new_amount = current_amount - saving;

        areas.push(AreaOptimization {
            area,
            label: area.label().to_string(),
            current_amount,
            current_share_pct: round2(current_share_pct),
            reduction_pct,
            estimated_saving: round2(saving),
            new_amount: round2(new_amount),
            new_share_pct: round2_opt(percent_of(new_amount, kpi.expenses)),
            margin_impact_pct: round2_opt(percent_of(saving, kpi.revenue)),
            difficulty: difficulty_for(area),
            recommendations: area_recommendations(area),
        });
    }

    let total_saving: f64 = areas
        .iter()
        .map(|a| a.current_amount * a.reduction_pct / 100.0)
        .sum();
    let achievable = percent_of(total_saving, kpi.revenue);
    let feasibility = match achievable {
        Some(pct) if pct >= target_margin_increase => Feasibility::High,
        _ => Feasibility::Partial,
    };

    Ok(BudgetOptimization {
        company_id: company_id.to_string(),
        current_margin_pct: round2(kpi.net_margin_pct),
        revenue: kpi.revenue,
        total_expenses: kpi.expenses,
        target: OptimizationTarget {
            target_margin_pct: round2(kpi.net_margin_pct + target_margin_increase),
            required_improvement: round2(kpi.revenue * target_margin_increase / 100.0),
            achievable_margin_increase: round2_opt(achievable),
        },
        areas,
        summary: OptimizationSummary {
            total_estimated_saving: round2(total_saving),
            feasibility,
            implementation_window: "3-6 months".to_string(),
            overall_risk: "Medium".to_string(),
        },
        next_steps: vec![
            "Review each optimization area in detail".to_string(),
            "Implement the lowest-risk changes first".to_string(),
            "Monitor the impact monthly".to_string(),
            "Adjust the strategy based on results".to_string(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn latest() -> CompanyKpi {
        CompanyKpi {
            company_id: "acme".to_string(),
            month: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            revenue: 10_000.0,
            expenses: 8_000.0,
            net_income: 2_000.0,
            net_margin_pct: 20.0,
            infrastructure: 2_000.0,
            payroll: 3_200.0,
            marketing: 800.0,
            services: 1_000.0,
            costs: 1_000.0,
            pct_infrastructure: 25.0,
            pct_payroll: 40.0,
            pct_marketing: 10.0,
            revenue_mom_pct: 0.0,
        }
    }

    #[test]
    fn test_reduction_tiers() {
        assert_eq!(reduction_for_share(35.0), 15.0);
        assert_eq!(reduction_for_share(30.0), 10.0);
        assert_eq!(reduction_for_share(25.0), 10.0);
        assert_eq!(reduction_for_share(20.0), 5.0);
    }

    #[test]
    fn test_missing_kpi_is_no_data() {
        let result = suggest_budget_optimization("acme", None, 5.0, &default_priority_areas());
        assert!(matches!(result, Err(AdvisorError::NoData(_))));
    }

    #[test]
    fn test_default_areas() {
        let kpi = latest();
        let plan =
            suggest_budget_optimization("acme", Some(&kpi), 5.0, &default_priority_areas())
                .unwrap();

        assert_eq!(plan.areas.len(), 3);

        let marketing = &plan.areas[0];
        assert_eq!(marketing.area, ExpenseCategory::Marketing);
        assert_eq!(marketing.reduction_pct, 5.0);
        assert_eq!(marketing.estimated_saving, 40.0);
        assert_eq!(marketing.new_amount, 760.0);
        assert_eq!(marketing.new_share_pct, Some(9.5));
        assert_eq!(marketing.margin_impact_pct, Some(0.4));
        assert_eq!(marketing.difficulty, Difficulty::Low);

        let payroll = &plan.areas[1];
        assert_eq!(payroll.reduction_pct, 15.0);
        assert_eq!(payroll.estimated_saving, 480.0);
        assert_eq!(payroll.difficulty, Difficulty::High);

        let infra = &plan.areas[2];
        assert_eq!(infra.reduction_pct, 10.0);
        assert_eq!(infra.estimated_saving, 200.0);
        assert_eq!(infra.difficulty, Difficulty::Medium);

        assert_eq!(plan.summary.total_estimated_saving, 720.0);
        assert_eq!(plan.target.achievable_margin_increase, Some(7.2));
        assert_eq!(plan.target.target_margin_pct, 25.0);
        assert_eq!(plan.target.required_improvement, 500.0);
        assert_eq!(plan.summary.feasibility, Feasibility::High);
    }

    #[test]
    fn test_partial_feasibility_and_unknown_areas() {
        let kpi = latest();
        let areas = vec![
            "marketing".to_string(),
            "travel".to_string(),
            "services".to_string(),
        ];
        let plan = suggest_budget_optimization("acme", Some(&kpi), 5.0, &areas).unwrap();

        assert_eq!(plan.areas.len(), 1);
        assert_eq!(plan.summary.feasibility, Feasibility::Partial);
        assert_eq!(
            plan.headline_recommendations(),
            vec!["Marketing: Evaluate the ROI of current campaigns".to_string()]
        );
    }

    #[test]
    fn test_legacy_area_names() {
        let kpi = latest();
        let areas = vec!["personal".to_string(), "infraestructura".to_string()];
        let plan = suggest_budget_optimization("acme", Some(&kpi), 5.0, &areas).unwrap();
        assert_eq!(plan.areas[0].area, ExpenseCategory::Payroll);
        assert_eq!(plan.areas[1].area, ExpenseCategory::Infrastructure);
    }

    #[test]
    fn test_negative_target_rejected() {
        let kpi = latest();
        let result =
            suggest_budget_optimization("acme", Some(&kpi), -1.0, &default_priority_areas());
        assert!(matches!(result, Err(AdvisorError::InvalidParameter(_))));
    }
}
