//! 管理端点
//!
//! 凭证列表、增删改，结果以 JSON 返回。

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use keycast_core::credential::{Cipher, CredentialEdit};
use keycast_services::{ActionOutcome, FailureKind};
use serde::Deserialize;

use crate::AppState;

/// 首页查询参数
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// 新增凭证请求
#[derive(Debug, Default, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    pub expire_date: Option<String>,
}

/// 更新凭证请求
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// 未提供时使用默认加密方式
    #[serde(default)]
    pub cipher: Option<String>,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub expire_date: Option<String>,
}

impl UpdateRequest {
    fn into_edit(self) -> Result<CredentialEdit, String> {
        let cipher = match self.cipher.as_deref().map(str::trim) {
            None | Some("") => Cipher::default(),
            Some(value) => value.parse::<Cipher>()?,
        };
        Ok(CredentialEdit {
            name: self.name,
            cipher,
            secret: self.secret,
            expire_date: self.expire_date,
        })
    }
}

/// 失败类别对应的 HTTP 状态码
pub fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
        FailureKind::Config | FailureKind::Restart | FailureKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn outcome_response(outcome: ActionOutcome) -> Response {
    let status = outcome.failure.map(failure_status).unwrap_or(StatusCode::OK);
    (status, Json(outcome)).into_response()
}

/// 未配置对外域名时使用请求的 Host 头
fn request_base_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("http://{host}"))
}

/// GET / - 凭证列表
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IndexQuery>,
) -> Response {
    let mut view = state.coordinator.index_view(query.search.as_deref()).await;
    if view.api_base_url.is_none() {
        view.api_base_url = request_base_url(&headers);
    }
    Json(view).into_response()
}

/// POST /add - 新增凭证
pub async fn add_credential(
    State(state): State<AppState>,
    request: Option<Json<AddRequest>>,
) -> Response {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    outcome_response(state.coordinator.add_credential(request.expire_date).await)
}

/// GET /edit/:id - 编辑表单数据
pub async fn edit_form(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.coordinator.edit_form(id).await {
        Ok(form) => Json(form).into_response(),
        Err(e) => {
            let kind = e.kind();
            let message = if kind == FailureKind::NotFound {
                format!("User {id} not found")
            } else {
                format!("Error loading user: {e}")
            };
            outcome_response(ActionOutcome::failed(kind, message))
        }
    }
}

/// POST /update/:id - 更新凭证
pub async fn update_credential(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateRequest>,
) -> Response {
    let edit = match request.into_edit() {
        Ok(edit) => edit,
        Err(message) => {
            return outcome_response(ActionOutcome::failed(FailureKind::InvalidInput, message))
        }
    };
    outcome_response(state.coordinator.edit_credential(id, edit).await)
}

/// POST /delete/:id - 删除凭证
pub async fn delete_credential(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    outcome_response(state.coordinator.delete_credential(id).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_cipher() {
        let request = UpdateRequest {
            cipher: Some("aes-128-gcm".to_string()),
            secret: "x".to_string(),
            ..UpdateRequest::default()
        };
        assert_eq!(request.into_edit().unwrap().cipher, Cipher::Aes128Gcm);

        let request = UpdateRequest::default();
        assert_eq!(request.into_edit().unwrap().cipher, Cipher::default());

        let request = UpdateRequest {
            cipher: Some("rc4-md5".to_string()),
            ..UpdateRequest::default()
        };
        assert!(request.into_edit().is_err());
    }

    #[test]
    fn test_failure_status() {
        assert_eq!(failure_status(FailureKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(failure_status(FailureKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            failure_status(FailureKind::Restart),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
