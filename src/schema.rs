use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AdvisorError;

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    #[schemars(description = "An individual banking customer")]
    Personal,
    #[schemars(description = "A business banking customer")]
    Company,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Personal => write!(f, "personal"),
            UserType::Company => write!(f, "company"),
        }
    }
}

/// Expense buckets tracked for every company month.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    #[serde(alias = "infraestructura", alias = "infra")]
    Infrastructure,
    #[serde(alias = "personal")]
    Payroll,
    Marketing,
    #[serde(alias = "servicios")]
    Services,
    #[serde(alias = "costos")]
    Costs,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Infrastructure,
        ExpenseCategory::Payroll,
        ExpenseCategory::Marketing,
        ExpenseCategory::Services,
        ExpenseCategory::Costs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Infrastructure => "infrastructure",
            ExpenseCategory::Payroll => "payroll",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Services => "services",
            ExpenseCategory::Costs => "costs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Infrastructure => "Infrastructure",
            ExpenseCategory::Payroll => "Payroll",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Services => "Services",
            ExpenseCategory::Costs => "Costs",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infrastructure" | "infraestructura" | "infra" => Ok(ExpenseCategory::Infrastructure),
            "payroll" | "personal" => Ok(ExpenseCategory::Payroll),
            "marketing" => Ok(ExpenseCategory::Marketing),
            "services" | "servicios" => Ok(ExpenseCategory::Services),
            "costs" | "costos" => Ok(ExpenseCategory::Costs),
            other => Err(AdvisorError::InvalidParameter(format!(
                "Unknown expense category '{}'",
                other
            ))),
        }
    }
}

/// One month of company KPIs, as produced by the reporting view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CompanyKpi {
    pub company_id: String,
    /// First day of the reported month
    pub month: NaiveDate,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub net_margin_pct: f64,
    pub infrastructure: f64,
    pub payroll: f64,
    pub marketing: f64,
    pub services: f64,
    pub costs: f64,
    /// Share of total expenses, in percent
    pub pct_infrastructure: f64,
    pub pct_payroll: f64,
    pub pct_marketing: f64,
    pub revenue_mom_pct: f64,
}

impl CompanyKpi {
    pub fn expense(&self, category: ExpenseCategory) -> f64 {
        match category {
            ExpenseCategory::Infrastructure => self.infrastructure,
            ExpenseCategory::Payroll => self.payroll,
            ExpenseCategory::Marketing => self.marketing,
            ExpenseCategory::Services => self.services,
            ExpenseCategory::Costs => self.costs,
        }
    }

    /// Share of total expenses for a category. Uses the stored percentage where
    /// the view provides one and derives it otherwise.
    pub fn share_pct(&self, category: ExpenseCategory) -> f64 {
        match category {
            ExpenseCategory::Infrastructure => self.pct_infrastructure,
            ExpenseCategory::Payroll => self.pct_payroll,
            ExpenseCategory::Marketing => self.pct_marketing,
            other => crate::utils::percent_of(self.expense(other), self.expenses).unwrap_or(0.0),
        }
    }

    pub fn month_label(&self) -> String {
        crate::utils::month_label(self.month)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[serde(alias = "ingreso")]
    Income,
    #[serde(alias = "gasto")]
    Expense,
}

impl FromStr for TransactionKind {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "ingreso" => Ok(TransactionKind::Income),
            "expense" | "gasto" => Ok(TransactionKind::Expense),
            other => Err(AdvisorError::InvalidParameter(format!(
                "Unknown transaction kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PersonalTransaction {
    pub user_id: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Automated KPI recommendation stored alongside company data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct KpiRecommendation {
    pub kpi: String,
    pub month: NaiveDate,
    pub value: f64,
    pub decision: String,
}
