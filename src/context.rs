//! Financial context gathered for a chat turn.
//!
//! The enhanced path runs the analysis tools. When it fails on a store or
//! serialization error the builder falls back to the traditional path, which
//! reads raw rows directly and never fails: every missing piece degrades to an
//! empty section.

use chrono::Duration;
use log::{debug, warn};
use serde::Serialize;
use std::fmt::Write;

use crate::analysis::AnalysisParams;
use crate::error::Result;
use crate::optimization::OptimizationParams;
use crate::personal::PersonalSummary;
use crate::schema::{
    CompanyKpi, ExpenseCategory, KpiRecommendation, PersonalTransaction, TransactionKind, UserType,
};
use crate::tools::{today, Toolbox};
use crate::utils::month_label;

/// Tunables for the chat context.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorSettings {
    /// KPI months analysed for company customers
    pub kpi_window: usize,
    /// Transactions summarised for personal customers on the fallback path
    pub personal_transaction_window: usize,
    /// How far back stored automated recommendations are read
    pub decisions_lookback_days: i64,
    pub top_categories: usize,
    pub recent_transactions: usize,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            kpi_window: 6,
            personal_transaction_window: 50,
            decisions_lookback_days: 90,
            top_categories: 5,
            recent_transactions: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    Enhanced,
    Traditional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialContext {
    pub mode: ContextMode,
    pub body: String,
    pub recommendations: Vec<String>,
}

const GENERIC_TIPS: [&str; 3] = [
    "Review your monthly spending and look for categories to trim",
    "Keep an emergency fund covering three to six months of expenses",
    "Set concrete savings goals and track them every month",
];

#[derive(Clone)]
pub struct ContextBuilder {
    toolbox: Toolbox,
    settings: AdvisorSettings,
}

impl ContextBuilder {
    pub fn new(toolbox: Toolbox, settings: AdvisorSettings) -> Self {
        Self { toolbox, settings }
    }

    pub fn settings(&self) -> &AdvisorSettings {
        &self.settings
    }

    pub async fn build(&self, user_type: UserType, user_id: &str) -> FinancialContext {
        match self.enhanced(user_type, user_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(
                    "Enhanced context unavailable for {} {}, falling back: {}",
                    user_type, user_id, e
                );
                self.traditional(user_type, user_id).await
            }
        }
    }

    /// Context built from the analysis tools.
    pub async fn enhanced(&self, user_type: UserType, user_id: &str) -> Result<FinancialContext> {
        let body = match user_type {
            UserType::Company => {
                let params = AnalysisParams {
                    company_id: user_id.to_string(),
                    months: self.settings.kpi_window,
                    include_comparisons: true,
                };
                match self.toolbox.analyze_kpis(&params).await {
                    Ok(analysis) => format!(
                        "Advanced KPI analysis:\n{}",
                        serde_json::to_string_pretty(&analysis)?
                    ),
                    Err(e) if e.is_domain_error() => {
                        debug!("No KPI analysis for company {}: {}", user_id, e);
                        format!("Company {} has no KPI history on file yet.", user_id)
                    }
                    Err(e) => return Err(e),
                }
            }
            UserType::Personal => format!(
                "Personal banking customer {}. Detailed analysis is available on request.",
                user_id
            ),
        };

        Ok(FinancialContext {
            mode: ContextMode::Enhanced,
            body,
            recommendations: self.smart_recommendations(user_type, user_id).await?,
        })
    }

    async fn smart_recommendations(&self, user_type: UserType, user_id: &str) -> Result<Vec<String>> {
        if user_type == UserType::Company {
            let params = OptimizationParams::new(user_id);
            match self.toolbox.optimize_budget(&params).await {
                Ok(optimization) => return Ok(optimization.headline_recommendations()),
                Err(e) if e.is_domain_error() => {
                    debug!("No optimization for company {}: {}", user_id, e)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(GENERIC_TIPS.iter().map(|tip| tip.to_string()).collect())
    }

    /// Context built from raw store rows. Read failures leave their section empty.
    pub async fn traditional(&self, user_type: UserType, user_id: &str) -> FinancialContext {
        let body = match user_type {
            UserType::Company => self.company_fallback(user_id).await,
            UserType::Personal => self.personal_fallback(user_id).await,
        };
        FinancialContext {
            mode: ContextMode::Traditional,
            body,
            recommendations: Vec::new(),
        }
    }

    async fn company_fallback(&self, company_id: &str) -> String {
        let store = self.toolbox.store();
        let to = today();
        let from = to - Duration::days(self.settings.decisions_lookback_days);

        let (kpis, decisions) = futures::join!(
            store.company_kpis(company_id, self.settings.kpi_window),
            store.kpi_recommendations(company_id, from, to),
        );
        let kpis = kpis.unwrap_or_else(|e| {
            warn!("Could not read KPIs for company {}: {}", company_id, e);
            Vec::new()
        });
        let decisions = decisions.unwrap_or_else(|e| {
            warn!("Could not read recommendations for company {}: {}", company_id, e);
            Vec::new()
        });

        if kpis.is_empty() && decisions.is_empty() {
            return "No financial data available.".to_string();
        }
        render_company(&kpis, &decisions)
    }

    async fn personal_fallback(&self, user_id: &str) -> String {
        match self
            .toolbox
            .personal_summary(user_id, Some(self.settings.personal_transaction_window))
            .await
        {
            Ok(summary) if summary.transactions_analyzed > 0 => render_personal(&summary, &self.settings),
            Ok(_) => "No financial data available.".to_string(),
            Err(e) => {
                warn!("Could not read transactions for user {}: {}", user_id, e);
                "No financial data available.".to_string()
            }
        }
    }
}

fn render_company(kpis: &[CompanyKpi], decisions: &[KpiRecommendation]) -> String {
    let mut out = String::new();

    if !kpis.is_empty() {
        out.push_str("Monthly KPIs (newest first):\n");
        for kpi in kpis {
            let _ = writeln!(
                out,
                "- {}: revenue {}, expenses {}, net income {}, margin {:.2}%, revenue MoM {:+.2}%",
                kpi.month_label(),
                format_money(kpi.revenue),
                format_money(kpi.expenses),
                format_money(kpi.net_income),
                kpi.net_margin_pct,
                kpi.revenue_mom_pct
            );
            let breakdown: Vec<String> = ExpenseCategory::ALL
                .iter()
                .map(|&category| {
                    format!(
                        "{} {} ({:.1}%)",
                        category.label(),
                        format_money(kpi.expense(category)),
                        kpi.share_pct(category)
                    )
                })
                .collect();
            let _ = writeln!(out, "  expenses: {}", breakdown.join(", "));
        }
    }

    if !decisions.is_empty() {
        out.push_str("\nAutomated recommendations:\n");
        for decision in decisions {
            let _ = writeln!(
                out,
                "- {} {} ({:.2}): {}",
                month_label(decision.month),
                decision.kpi,
                decision.value,
                decision.decision
            );
        }
    }

    out.trim_end().to_string()
}

fn render_personal(summary: &PersonalSummary, settings: &AdvisorSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Last {} transactions: income {}, expenses {}, balance {}",
        summary.transactions_analyzed,
        format_money(summary.overall.income),
        format_money(summary.overall.expenses),
        format_money(summary.overall.balance)
    );
    let _ = writeln!(
        out,
        "This month: income {}, expenses {}",
        format_money(summary.current_month.income),
        format_money(summary.current_month.expenses)
    );

    let top = summary.top_categories(settings.top_categories);
    if !top.is_empty() {
        out.push_str("\nTop spending categories:\n");
        for (category, amount) in top {
            let _ = writeln!(out, "- {}: {}", category, format_money(amount));
        }
    }

    out.push_str("\nRecent transactions:\n");
    for tx in summary.recent_transactions.iter().take(settings.recent_transactions) {
        let sign = match tx.kind {
            TransactionKind::Income => "+",
            TransactionKind::Expense => "-",
        };
        let _ = writeln!(
            out,
            "- {} {}{} {}",
            tx.date,
            sign,
            format_money(tx.amount),
            transaction_label(tx)
        );
    }

    out.trim_end().to_string()
}

fn transaction_label(tx: &PersonalTransaction) -> &str {
    tx.description
        .as_deref()
        .or(tx.category.as_deref())
        .filter(|label| !label.trim().is_empty())
        .unwrap_or("No description")
}

/// `1234567.891` renders as `$1,234,567.89`.
pub(crate) fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
