//! # Financial Advisor Chat
//!
//! A financial-advice chat assistant for personal and business banking
//! customers. The crate computes derived metrics over monthly KPI rows and
//! personal transactions, exposes them as named tools, and folds them into the
//! prompt sent to a hosted language model.
//!
//! ## Core Concepts
//!
//! - **KPI analysis**: revenue and margin trends, expense mix, alerts
//! - **Trend forecast**: linear extrapolation of revenue and expenses with an
//!   optional seasonal adjustment
//! - **Budget optimization**: share-based expense reduction suggestions
//! - **Scenarios**: what-if recalculation of revenue, expenses and margin
//! - **Chat**: context assembly (tool-backed, with a raw-data fallback),
//!   prompt building and the model call
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_advisor_chat::*;
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new().with_kpis(rows);
//! let toolbox = Toolbox::new(Arc::new(store));
//!
//! let call = ToolCall::parse(
//!     "predict_financial_trends",
//!     serde_json::json!({ "companyId": "acme", "forecastMonths": 6 }),
//! )?;
//! let response = toolbox.call(call).await;
//! assert!(response.success);
//! ```

pub mod advisor;
pub mod analysis;
pub mod context;
pub mod error;
pub mod forecast;
pub mod llm;
pub mod optimization;
pub mod personal;
pub mod prompt;
pub mod report;
pub mod scenarios;
pub mod schema;
pub mod store;
pub mod tools;
pub mod utils;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod http;

pub use advisor::{ChatAdvisor, ChatReply, ChatRequest};
pub use analysis::{analyze_company_kpis, AnalysisParams, KpiAnalysis};
pub use context::{AdvisorSettings, ContextBuilder, ContextMode, FinancialContext};
pub use error::{AdvisorError, Result};
pub use forecast::{predict_trends, TrendForecast, TrendParams};
pub use llm::ChatModel;
pub use optimization::{suggest_budget_optimization, BudgetOptimization, OptimizationParams};
pub use personal::{summarize_personal_finances, PersonalSummary};
pub use prompt::build_prompt;
pub use report::{FinancialReport, ReportParams, ReportPeriod, ReportType};
pub use scenarios::{calculate_scenarios, ScenarioComparison, ScenarioInput, ScenarioParams};
pub use schema::*;
pub use store::{FinancialStore, MemoryStore};
pub use tools::{ResourceDescriptor, ToolCall, ToolDescriptor, ToolResponse, Toolbox};
