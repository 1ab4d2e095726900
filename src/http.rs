//! HTTP surface of the advisor.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::advisor::{ChatAdvisor, ChatReply, ChatRequest};
use crate::error::AdvisorError;
use crate::tools::{ToolCall, ToolDescriptor, ToolResponse, Toolbox};

#[derive(Clone)]
pub struct AppState {
    pub advisor: ChatAdvisor,
    pub toolbox: Toolbox,
}

impl AppState {
    pub fn new(advisor: ChatAdvisor, toolbox: Toolbox) -> Self {
        Self { advisor, toolbox }
    }
}

impl AdvisorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdvisorError::InvalidRequest(_)
            | AdvisorError::InvalidParameter(_)
            | AdvisorError::UnknownTool(_) => StatusCode::BAD_REQUEST,
            AdvisorError::NoData(_) | AdvisorError::UnknownResource(_) => StatusCode::NOT_FOUND,
            AdvisorError::Llm {
                status: Some(code @ (401 | 403 | 429)),
                ..
            } => StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdvisorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(error = %self, status = status.as_u16(), "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn invalid_body(rejection: JsonRejection) -> AdvisorError {
    AdvisorError::InvalidRequest(rejection.body_text())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/tools", get(list_tools).post(run_tool))
        .route("/api/resources", get(read_resource))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Financial advisor listening on {}", addr);
    }
    axum::serve(listener, router(state)).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AdvisorError> {
    let Json(request) = body.map_err(invalid_body)?;
    let reply = state.advisor.respond(&request).await?;
    Ok(Json(reply))
}

async fn list_tools() -> Json<Vec<ToolDescriptor>> {
    Json(Toolbox::catalog())
}

#[derive(Debug, Deserialize)]
struct ToolInvocation {
    tool: Option<String>,
    parameters: Option<Value>,
}

async fn run_tool(
    State(state): State<AppState>,
    body: Result<Json<ToolInvocation>, JsonRejection>,
) -> Result<Json<ToolResponse>, AdvisorError> {
    let Json(invocation) = body.map_err(invalid_body)?;
    let (Some(tool), Some(parameters)) = (invocation.tool, invocation.parameters) else {
        return Err(AdvisorError::InvalidRequest(
            "tool and parameters are required".to_string(),
        ));
    };
    let call = ToolCall::parse(&tool, parameters)?;
    Ok(Json(state.toolbox.call(call).await))
}

#[derive(Debug, Deserialize)]
struct ResourceQuery {
    uri: Option<String>,
}

async fn read_resource(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> Result<Json<Value>, AdvisorError> {
    match query.uri {
        Some(uri) if !uri.trim().is_empty() => Ok(Json(state.toolbox.read_resource(&uri).await?)),
        Some(_) => Err(AdvisorError::InvalidRequest("uri must not be empty".to_string())),
        None => Ok(Json(serde_json::to_value(Toolbox::resources())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AdvisorError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdvisorError::UnknownTool("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdvisorError::NoData("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        for code in [401u16, 403, 429] {
            let err = AdvisorError::Llm {
                status: Some(code),
                message: String::new(),
            };
            assert_eq!(err.status_code().as_u16(), code);
        }
        let upstream = AdvisorError::Llm {
            status: Some(503),
            message: String::new(),
        };
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AdvisorError::Store("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
