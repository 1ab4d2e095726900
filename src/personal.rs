use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{PersonalTransaction, TransactionKind};
use crate::utils::{first_day_of_month, round2};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const RECENT_TRANSACTIONS: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

impl Totals {
    fn from_transactions<'a>(transactions: impl Iterator<Item = &'a PersonalTransaction>) -> Self {
        let (income, expenses) =
            transactions.fold((0.0, 0.0), |(income, expenses), tx| match tx.kind {
                TransactionKind::Income => (income + tx.amount, expenses),
                TransactionKind::Expense => (income, expenses + tx.amount),
            });
        Self {
            income: round2(income),
            expenses: round2(expenses),
            balance: round2(income - expenses),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalSummary {
    pub user_id: String,
    pub overall: Totals,
    pub transactions_analyzed: usize,
    pub current_month: Totals,
    pub expenses_by_category: BTreeMap<String, f64>,
    pub recent_transactions: Vec<PersonalTransaction>,
}

impl PersonalSummary {
    /// Spending categories sorted by amount, largest first.
    pub fn top_categories(&self, n: usize) -> Vec<(String, f64)> {
        let mut categories: Vec<(String, f64)> = self
            .expenses_by_category
            .iter()
            .map(|(name, amount)| (name.clone(), *amount))
            .collect();
        categories.sort_by(|a, b| b.1.total_cmp(&a.1));
        categories.truncate(n);
        categories
    }
}

/// Summarises transactions ordered newest first. `as_of` determines which
/// calendar month counts as the current one.
pub fn summarize_personal_finances(
    user_id: &str,
    transactions: &[PersonalTransaction],
    as_of: NaiveDate,
) -> PersonalSummary {
    let month_start = first_day_of_month(as_of);

    let mut expenses_by_category: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
    {
        let category = tx
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        *expenses_by_category.entry(category.to_string()).or_insert(0.0) += tx.amount;
    }
    for amount in expenses_by_category.values_mut() {
        *amount = round2(*amount);
    }

    PersonalSummary {
        user_id: user_id.to_string(),
        overall: Totals::from_transactions(transactions.iter()),
        transactions_analyzed: transactions.len(),
        current_month: Totals::from_transactions(
            transactions.iter().filter(|tx| tx.date >= month_start),
        ),
        expenses_by_category,
        recent_transactions: transactions
            .iter()
            .take(RECENT_TRANSACTIONS)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(
        date: (i32, u32, u32),
        kind: TransactionKind,
        amount: f64,
        category: Option<&str>,
    ) -> PersonalTransaction {
        PersonalTransaction {
            user_id: "42".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            kind,
            amount,
            category: category.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn test_summary_totals_and_current_month() {
        let transactions = vec![
            tx((2024, 5, 20), TransactionKind::Expense, 300.0, Some("Food")),
            tx((2024, 5, 2), TransactionKind::Income, 2000.0, Some("Salary")),
            tx((2024, 4, 28), TransactionKind::Expense, 500.0, Some("Rent")),
            tx((2024, 4, 15), TransactionKind::Expense, 100.0, None),
            tx((2024, 4, 1), TransactionKind::Income, 1500.0, None),
        ];
        let as_of = NaiveDate::from_ymd_opt(2024, 5, 25).unwrap();
        let summary = summarize_personal_finances("42", &transactions, as_of);

        assert_eq!(summary.overall.income, 3500.0);
        assert_eq!(summary.overall.expenses, 900.0);
        assert_eq!(summary.overall.balance, 2600.0);
        assert_eq!(summary.transactions_analyzed, 5);

        assert_eq!(summary.current_month.income, 2000.0);
        assert_eq!(summary.current_month.expenses, 300.0);
        assert_eq!(summary.current_month.balance, 1700.0);

        assert_eq!(summary.expenses_by_category.get(UNCATEGORIZED), Some(&100.0));
        assert_eq!(summary.expenses_by_category.get("Salary"), None);

        assert_eq!(
            summary.top_categories(2),
            vec![("Rent".to_string(), 500.0), ("Food".to_string(), 300.0)]
        );
    }

    #[test]
    fn test_recent_transactions_capped() {
        let transactions: Vec<PersonalTransaction> = (1..=15)
            .rev()
            .map(|d| tx((2024, 3, d), TransactionKind::Expense, 10.0, Some("Misc")))
            .collect();
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let summary = summarize_personal_finances("42", &transactions, as_of);

        assert_eq!(summary.recent_transactions.len(), RECENT_TRANSACTIONS);
        assert_eq!(
            summary.recent_transactions[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_empty_history() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let summary = summarize_personal_finances("42", &[], as_of);
        assert_eq!(summary.overall, Totals::default());
        assert!(summary.expenses_by_category.is_empty());
    }
}
