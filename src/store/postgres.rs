use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::FinancialStore;
use crate::error::Result;
use crate::schema::{CompanyKpi, KpiRecommendation, PersonalTransaction};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct KpiRow {
    company_id: String,
    month: NaiveDate,
    revenue: f64,
    expenses: f64,
    net_income: f64,
    net_margin_pct: f64,
    infrastructure: f64,
    payroll: f64,
    marketing: f64,
    services: f64,
    costs: f64,
    pct_infrastructure: f64,
    pct_payroll: f64,
    pct_marketing: f64,
    revenue_mom_pct: f64,
}

impl From<KpiRow> for CompanyKpi {
    fn from(row: KpiRow) -> Self {
        CompanyKpi {
            company_id: row.company_id,
            month: row.month,
            revenue: row.revenue,
            expenses: row.expenses,
            net_income: row.net_income,
            net_margin_pct: row.net_margin_pct,
            infrastructure: row.infrastructure,
            payroll: row.payroll,
            marketing: row.marketing,
            services: row.services,
            costs: row.costs,
            pct_infrastructure: row.pct_infrastructure,
            pct_payroll: row.pct_payroll,
            pct_marketing: row.pct_marketing,
            revenue_mom_pct: row.revenue_mom_pct,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    kpi: String,
    month: NaiveDate,
    value: f64,
    decision: String,
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    user_id: String,
    date: NaiveDate,
    kind: String,
    amount: f64,
    category: Option<String>,
    description: Option<String>,
}

impl TryFrom<TransactionRow> for PersonalTransaction {
    type Error = crate::error::AdvisorError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(PersonalTransaction {
            user_id: row.user_id,
            date: row.date,
            kind: row.kind.parse()?,
            amount: row.amount,
            category: row.category,
            description: row.description,
        })
    }
}

/// Postgres rejects negative limits, so oversized values saturate.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database connected and migrations applied");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FinancialStore for PgStore {
    async fn company_kpis(&self, company_id: &str, limit: usize) -> Result<Vec<CompanyKpi>> {
        debug!("Loading up to {} KPI months for company {}", limit, company_id);
        let rows = sqlx::query_as::<_, KpiRow>(
            r#"
            SELECT company_id, month, revenue, expenses, net_income, net_margin_pct,
                   infrastructure, payroll, marketing, services, costs,
                   pct_infrastructure, pct_payroll, pct_marketing, revenue_mom_pct
            FROM company_kpis
            WHERE company_id = $1
            ORDER BY month DESC
            LIMIT $2
            "#,
        )
        .bind(company_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CompanyKpi::from).collect())
    }

    async fn kpi_recommendations(
        &self,
        company_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<KpiRecommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT kpi, month, value, decision
            FROM kpi_recommendations
            WHERE company_id = $1 AND month BETWEEN $2 AND $3
            ORDER BY month DESC
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| KpiRecommendation {
                kpi: row.kpi,
                month: row.month,
                value: row.value,
                decision: row.decision,
            })
            .collect())
    }

    async fn personal_transactions(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PersonalTransaction>> {
        // LIMIT NULL means no limit in Postgres
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT user_id, date, kind, amount, category, description
            FROM personal_transactions
            WHERE user_id = $1
            ORDER BY date DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit.map(sql_limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PersonalTransaction::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(6), 6);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }
}
