//! HTTP 处理函数

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::router::AppState;
use crate::api::validator::validate_document_request;
use crate::error::{AppError, AppResult, ValidationError};
use crate::infrastructure::PrintEngine;
use crate::models::GeneratedFile;

/// `GET /` 健康检查
pub async fn health<E: PrintEngine>(State(state): State<AppState<E>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.service_name.as_ref(),
    }))
}

/// `POST /generate`
///
/// 请求体按原始字节接收，自行解析 JSON，保证所有错误都是 `{"error": ...}` 格式
pub async fn generate<E: PrintEngine>(
    State(state): State<AppState<E>>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<GeneratedFile> {
    let body = body.map_err(|rejection| {
        warn!("⚠️ 读取请求体失败: {}", rejection.body_text());
        body_error(rejection, state.body_limit)
    })?;
    let data: Value = serde_json::from_slice(&body)?;
    let request = validate_document_request(&data).inspect_err(|e| warn!("⚠️ 请求校验失败: {}", e))?;
    state.flow.run(&request).await
}

fn body_error(rejection: BytesRejection, limit: usize) -> ValidationError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::PayloadTooLarge { limit }
    } else {
        ValidationError::InvalidJson {
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for GeneratedFile {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, self.mime_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.file_name),
                ),
                (header::CACHE_CONTROL, "no-cache".to_string()),
            ],
            self.bytes,
        )
            .into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
