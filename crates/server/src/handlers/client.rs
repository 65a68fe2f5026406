//! 客户端配置端点

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use keycast_services::FailureKind;
use serde::Deserialize;

use crate::AppState;

const YAML_CONTENT_TYPE: &str = "text/yaml; charset=utf-8";

/// `/api` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    #[serde(default)]
    pub key: Option<String>,
}

fn yaml_response(yaml: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, YAML_CONTENT_TYPE)],
        yaml,
    )
        .into_response()
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// GET /client/:id - 指定凭证的客户端配置
pub async fn client_config(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.coordinator.client_config_for_id(id).await {
        Ok(doc) => yaml_response(doc.yaml),
        Err(e) if e.kind() == FailureKind::NotFound => {
            (StatusCode::NOT_FOUND, "User not found").into_response()
        }
        Err(e) => {
            tracing::error!("[SERVER] 生成客户端配置失败: id={}, {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating client config: {e}"),
            )
                .into_response()
        }
    }
}

/// GET /api?key=<secret> - 凭密钥获取客户端配置（无需登录）
pub async fn client_config_by_key(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Response {
    let key = query.key.as_deref().map(str::trim).unwrap_or_default();
    if key.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "Missing key parameter. Use /api?key=password",
        );
    }

    match state.coordinator.client_config_for_secret(key).await {
        Ok(doc) => {
            tracing::info!("[SERVER] 客户端配置已下发: id={}", doc.credential.id);
            yaml_response(doc.yaml)
        }
        Err(e) if e.kind() == FailureKind::NotFound => json_error(
            StatusCode::NOT_FOUND,
            "User not found. Invalid password/secret.",
        ),
        Err(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error retrieving client key: {e}"),
        ),
    }
}

/// GET /health
pub async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}
