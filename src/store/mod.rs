//! Access to stored company KPIs, automated recommendations and personal
//! transactions.

mod memory;
#[cfg(feature = "server")]
mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "server")]
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::schema::{CompanyKpi, KpiRecommendation, PersonalTransaction};

#[async_trait]
pub trait FinancialStore: Send + Sync {
    /// Most recent KPI months for a company, newest first.
    async fn company_kpis(&self, company_id: &str, limit: usize) -> Result<Vec<CompanyKpi>>;

    /// Automated recommendations whose month falls within `[from, to]`.
    async fn kpi_recommendations(
        &self,
        company_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KpiRecommendation>>;

    /// Transactions for a user, newest first. `None` returns all of them.
    async fn personal_transactions(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PersonalTransaction>>;
}
