#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use financial_advisor_chat::http::{router, AppState};
use financial_advisor_chat::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct CannedModel(Result<String>);

#[async_trait]
impl ChatModel for CannedModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        match &self.0 {
            Ok(text) => Ok(text.clone()),
            Err(AdvisorError::Llm { status, message }) => Err(AdvisorError::Llm {
                status: *status,
                message: message.clone(),
            }),
            Err(other) => Err(AdvisorError::Store(other.to_string())),
        }
    }
}

fn kpi(month: u32) -> CompanyKpi {
    CompanyKpi {
        company_id: "acme".to_string(),
        month: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
        revenue: 20_000.0,
        expenses: 15_000.0,
        net_income: 5_000.0,
        net_margin_pct: 25.0,
        infrastructure: 3_000.0,
        payroll: 6_000.0,
        marketing: 1_500.0,
        services: 2_000.0,
        costs: 2_500.0,
        pct_infrastructure: 20.0,
        pct_payroll: 40.0,
        pct_marketing: 10.0,
        revenue_mom_pct: 0.0,
    }
}

fn app(model: CannedModel) -> axum::Router {
    let store = MemoryStore::new().with_kpis((1..=4).map(kpi));
    let toolbox = Toolbox::new(Arc::new(store));
    let advisor = ChatAdvisor::new(toolbox.clone(), Arc::new(model));
    router(AppState::new(advisor, toolbox))
}

fn ok_app() -> axum::Router {
    app(CannedModel(Ok("Keep it up.".to_string())))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(ok_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_chat_round_trip() {
    let (status, body) = send(
        ok_app(),
        post_json(
            "/api/chat",
            json!({"message": "How are we doing?", "userType": "company", "userId": "acme"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Keep it up.");
}

#[tokio::test]
async fn test_chat_requires_message() {
    let (status, body) = send(
        ok_app(),
        post_json("/api/chat", json!({"userType": "personal", "userId": "u1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request: message is required");
}

#[tokio::test]
async fn test_chat_passes_through_rate_limits() {
    let model = CannedModel(Err(AdvisorError::Llm {
        status: Some(429),
        message: "quota exceeded".to_string(),
    }));
    let (status, body) = send(
        app(model),
        post_json(
            "/api/chat",
            json!({"message": "hi", "userType": "personal", "userId": "u1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn test_tool_catalog() {
    let (status, body) = send(ok_app(), get("/api/tools")).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body.as_array().unwrap();
    assert_eq!(tools.len(), 5);
    assert_eq!(tools[0]["name"], "analyze_company_kpis");
    assert!(tools[0]["input_schema"]["properties"]["companyId"].is_object());
}

#[tokio::test]
async fn test_run_tool() {
    let (status, body) = send(
        ok_app(),
        post_json(
            "/api/tools",
            json!({"tool": "suggest_budget_optimization", "parameters": {"companyId": "acme"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["areas"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_run_tool_rejects_bad_invocations() {
    let (status, body) = send(ok_app(), post_json("/api/tools", json!({"tool": "calculate_scenarios"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request: tool and parameters are required");

    let (status, body) = send(
        ok_app(),
        post_json("/api/tools", json!({"tool": "transfer_funds", "parameters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown tool: transfer_funds");
}

#[tokio::test]
async fn test_resources() {
    let (status, body) = send(ok_app(), get("/api/resources?uri=company-kpis://acme")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(4));

    let (status, body) = send(ok_app(), get("/api/resources")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["uri"], "company-kpis://{id}");
    assert_eq!(body[1]["mime_type"], "application/json");

    let (status, _) = send(ok_app(), get("/api/resources?uri=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(ok_app(), get("/api/resources?uri=ledger://acme")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
