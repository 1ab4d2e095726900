//! "What-if" recalculation of revenue, expenses and margin against the latest
//! KPI month.

use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AdvisorError, Result};
use crate::schema::{CompanyKpi, ExpenseCategory};
use crate::utils::{percent_change, percent_of, round2, round2_opt};

const HIGH_VIABILITY_MARGIN_PCT: f64 = 10.0;
const HIGH_RISK_REVENUE_SWING_PCT: f64 = 20.0;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    pub name: String,
    #[schemars(description = "Revenue change in percent (e.g. 10 for +10%)")]
    pub revenue_change: f64,
    #[schemars(
        description = "Expense change in percent per category (infrastructure, payroll, marketing, services, costs)"
    )]
    #[serde(default)]
    pub expense_changes: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParams {
    #[schemars(description = "Identifier of the company")]
    pub company_id: String,
    #[schemars(description = "Scenarios to evaluate")]
    pub scenarios: Vec<ScenarioInput>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Viability {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Risk {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Favorable,
    Unfavorable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub base: f64,
    pub new: f64,
    pub difference: f64,
    pub change_pct: Option<f64>,
}

impl Delta {
    fn between(base: f64, new: f64) -> Self {
        Self {
            base,
            new: round2(new),
            difference: round2(new - base),
            change_pct: round2_opt(percent_change(base, new)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginDelta {
    pub base: f64,
    pub new: Option<f64>,
    pub difference: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEvaluation {
    pub viability: Viability,
    pub risk: Risk,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    /// e.g. "+10%"
    pub revenue_change_label: String,
    pub applied_expense_changes: BTreeMap<ExpenseCategory, f64>,
    pub revenue: Delta,
    pub expenses: Delta,
    pub expense_breakdown: BTreeMap<ExpenseCategory, f64>,
    pub profit: Delta,
    pub margin: MarginDelta,
    pub evaluation: ScenarioEvaluation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseScenario {
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub company_id: String,
    pub base: BaseScenario,
    pub scenarios: Vec<ScenarioOutcome>,
    pub best_scenario: String,
    pub revenue_range: Range,
    pub margin_range: Option<Range>,
}

fn signed_pct_label(pct: f64) -> String {
    if pct > 0.0 {
        format!("+{}%", pct)
    } else {
        format!("{}%", pct)
    }
}

fn parse_expense_changes(changes: &BTreeMap<String, f64>) -> BTreeMap<ExpenseCategory, f64> {
    let mut parsed = BTreeMap::new();
    for (key, pct) in changes {
        match key.parse::<ExpenseCategory>() {
            Ok(category) => {
                parsed.insert(category, *pct);
            }
            Err(_) => warn!("Ignoring unknown expense category '{}' in scenario", key),
        }
    }
    parsed
}

/// Returns the outcome with its unrounded margin.
fn evaluate(scenario: &ScenarioInput, base: &CompanyKpi) -> (ScenarioOutcome, Option<f64>) {
    let applied = parse_expense_changes(&scenario.expense_changes);

    let new_revenue = base.revenue * (1.0 + scenario.revenue_change / 100.0);
    let breakdown: BTreeMap<ExpenseCategory, f64> = ExpenseCategory::ALL
        .iter()
        .map(|&category| {
            let change = applied.get(&category).copied().unwrap_or(0.0);
            (category, base.expense(category) * (1.0 + change / 100.0))
        })
        .collect();
    let new_expenses: f64 = breakdown.values().sum();
    let new_profit = new_revenue - new_expenses;
    let new_margin = percent_of(new_profit, new_revenue);

    let viability = if new_profit > 0.0 {
        match new_margin {
            Some(m) if m > HIGH_VIABILITY_MARGIN_PCT => Viability::High,
            _ => Viability::Medium,
        }
    } else {
        Viability::Low
    };
    let risk = if scenario.revenue_change.abs() > HIGH_RISK_REVENUE_SWING_PCT {
        Risk::High
    } else {
        Risk::Medium
    };
    let verdict = match new_margin {
        Some(m) if m > base.net_margin_pct => Verdict::Favorable,
        _ => Verdict::Unfavorable,
    };

    let outcome = ScenarioOutcome {
        name: scenario.name.clone(),
        revenue_change_label: signed_pct_label(scenario.revenue_change),
        applied_expense_changes: applied,
        revenue: Delta::between(base.revenue, new_revenue),
        expenses: Delta::between(base.expenses, new_expenses),
        expense_breakdown: breakdown.into_iter().map(|(k, v)| (k, round2(v))).collect(),
        profit: Delta::between(base.net_income, new_profit),
        margin: MarginDelta {
            base: base.net_margin_pct,
            new: round2_opt(new_margin),
            difference: round2_opt(new_margin.map(|m| m - base.net_margin_pct)),
        },
        evaluation: ScenarioEvaluation {
            viability,
            risk,
            verdict,
        },
    };
    (outcome, new_margin)
}

fn range_of(values: impl Iterator<Item = f64>) -> Option<Range> {
    values.fold(None, |acc, v| match acc {
        None => Some(Range { min: v, max: v }),
        Some(r) => Some(Range {
            min: r.min.min(v),
            max: r.max.max(v),
        }),
    })
}

/// Evaluates every scenario against the latest KPI month.
pub fn calculate_scenarios(
    company_id: &str,
    base: Option<&CompanyKpi>,
    scenarios: &[ScenarioInput],
) -> Result<ScenarioComparison> {
    let base = base.ok_or_else(|| {
        AdvisorError::NoData(format!(
            "no base KPIs available for scenarios of company {}",
            company_id
        ))
    })?;

    if scenarios.is_empty() {
        return Err(AdvisorError::InvalidParameter(
            "at least one scenario is required".to_string(),
        ));
    }

    let (outcomes, margins): (Vec<ScenarioOutcome>, Vec<Option<f64>>) =
        scenarios.iter().map(|s| evaluate(s, base)).unzip();

    // Highest unrounded margin wins; the earlier scenario is kept on ties
    let mut best = 0;
    for (i, margin) in margins.iter().enumerate().skip(1) {
        let current = margin.unwrap_or(f64::NEG_INFINITY);
        let leader = margins[best].unwrap_or(f64::NEG_INFINITY);
        if current > leader {
            best = i;
        }
    }
    let best_scenario = outcomes[best].name.clone();

    let revenue_range = range_of(outcomes.iter().map(|o| o.revenue.new)).unwrap_or(Range {
        min: base.revenue,
        max: base.revenue,
    });
    let margin_range = range_of(outcomes.iter().filter_map(|o| o.margin.new));

    Ok(ScenarioComparison {
        company_id: company_id.to_string(),
        base: BaseScenario {
            revenue: base.revenue,
            expenses: base.expenses,
            profit: base.net_income,
            margin_pct: base.net_margin_pct,
        },
        scenarios: outcomes,
        best_scenario,
        revenue_range,
        margin_range,
    })
}
