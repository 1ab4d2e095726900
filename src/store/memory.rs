use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use super::FinancialStore;
use crate::error::{AdvisorError, Result};
use crate::schema::{CompanyKpi, KpiRecommendation, PersonalTransaction};

/// In-memory store. Rows may be added in any order; reads sort them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    kpis: HashMap<String, Vec<CompanyKpi>>,
    recommendations: HashMap<String, Vec<KpiRecommendation>>,
    transactions: HashMap<String, Vec<PersonalTransaction>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kpis(mut self, rows: impl IntoIterator<Item = CompanyKpi>) -> Self {
        for row in rows {
            self.kpis.entry(row.company_id.clone()).or_default().push(row);
        }
        self
    }

    pub fn with_recommendation(
        mut self,
        company_id: impl Into<String>,
        recommendation: KpiRecommendation,
    ) -> Self {
        self.recommendations
            .entry(company_id.into())
            .or_default()
            .push(recommendation);
        self
    }

    pub fn with_transactions(
        mut self,
        transactions: impl IntoIterator<Item = PersonalTransaction>,
    ) -> Self {
        for tx in transactions {
            self.transactions
                .entry(tx.user_id.clone())
                .or_default()
                .push(tx);
        }
        self
    }

    /// Makes every read fail, to exercise fallback paths.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(AdvisorError::Store("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FinancialStore for MemoryStore {
    async fn company_kpis(&self, company_id: &str, limit: usize) -> Result<Vec<CompanyKpi>> {
        self.check_available()?;
        let mut rows = self.kpis.get(company_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.month.cmp(&a.month));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn kpi_recommendations(
        &self,
        company_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KpiRecommendation>> {
        self.check_available()?;
        let mut rows: Vec<KpiRecommendation> = self
            .recommendations
            .get(company_id)
            .map(|recs| {
                recs.iter()
                    .filter(|r| r.month >= from && r.month <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| b.month.cmp(&a.month));
        Ok(rows)
    }

    async fn personal_transactions(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PersonalTransaction>> {
        self.check_available()?;
        let mut rows = self.transactions.get(user_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}
