//! HTTP server exposing the analysis workflow

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::app_controller::Controller;
use crate::errors::{AnalysisError, AppError, ProviderError};

/// Single-page UI served at `/`
const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
}

/// Body of `POST /analyze`
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl AnalyzeRequest {
    /// Read the request body field by field.
    ///
    /// A field of the wrong type is ignored on its own; a body that is not
    /// a JSON object counts as an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

        Self {
            url: field("url").unwrap_or_default(),
            api_key: field("api_key"),
        }
    }
}

/// Build the application router
pub fn router(controller: Arc<Controller>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .with_state(AppState { controller })
}

/// Bind and serve until the process is stopped
pub async fn start_http_server(controller: Arc<Controller>, host: &str, port: u16) -> Result<()> {
    let app = router(controller);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("AnimeJapanese listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "animejp",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn analyze_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request = AnalyzeRequest::from_body(&body);
    info!("Analyze request for {:?}", request.url);

    match state.controller.analyze(&request.url, request.api_key.as_deref()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &AppError) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        error!("Analyze request failed: {}", error);
    } else {
        warn!("Analyze request rejected: {}", error);
    }

    (status, Json(serde_json::json!({ "error": user_message(error) }))).into_response()
}

/// HTTP status reported for an error
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::MissingUrl | AppError::InvalidUrl(_) | AppError::MissingApiKey => StatusCode::BAD_REQUEST,
        AppError::SubtitlesNotFound | AppError::EmptyTranscript(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Analysis(AnalysisError::Provider(ProviderError::AuthenticationError(_))) => StatusCode::UNAUTHORIZED,
        AppError::Analysis(AnalysisError::Provider(ProviderError::RateLimitExceeded(_))) => StatusCode::TOO_MANY_REQUESTS,
        AppError::Analysis(_) | AppError::File(_) | AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to the user for an error
pub fn user_message(error: &AppError) -> String {
    match error {
        AppError::MissingUrl => "請提供 YouTube URL".to_string(),
        AppError::InvalidUrl(_) => "無效的 URL 格式".to_string(),
        AppError::MissingApiKey => {
            "請設定 Anthropic API Key（環境變數 ANTHROPIC_API_KEY 或在設定中輸入）".to_string()
        },
        AppError::SubtitlesNotFound => {
            "找不到日文字幕。請確認該影片有日文字幕（官方或自動生成）。".to_string()
        },
        AppError::EmptyTranscript(_) => "日文字幕內容為空，無法分析。".to_string(),
        AppError::Analysis(AnalysisError::Provider(ProviderError::AuthenticationError(_))) => {
            "API Key 無效，請確認 Anthropic API Key 正確。".to_string()
        },
        AppError::Analysis(AnalysisError::Provider(ProviderError::RateLimitExceeded(_))) => {
            "API 使用超限，請稍後再試。".to_string()
        },
        AppError::Analysis(AnalysisError::InvalidJson(e)) => format!("Claude 回傳格式解析失敗：{}", e),
        AppError::Analysis(AnalysisError::Provider(e)) => format!("AI 分析失敗：{}", e),
        AppError::File(e) | AppError::Unknown(e) => format!("伺服器錯誤：{}", e),
    }
}
