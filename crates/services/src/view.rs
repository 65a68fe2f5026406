//! 展示与操作结果模型

use keycast_core::credential::{
    compute_expiry_status, format_bytes, mask_secret, Cipher, Credential, DEFAULT_VISIBLE,
};
use keycast_infra::UsageSnapshot;
use serde::{Deserialize, Serialize};

/// 未设置过期时间时的展示文本
pub const NO_EXPIRATION: &str = "No expiration";

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// 面向用户的提示消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// 失败类别（供 HTTP 层映射状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 凭证不存在
    NotFound,
    /// 提交内容无效
    InvalidInput,
    /// 配置文件读写失败
    Config,
    /// 配置已保存，但代理进程未能启动
    Restart,
    /// 内部错误
    Internal,
}

/// 一次管理操作的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// 受影响的凭证（失败时为空）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
    /// 提示消息
    pub notices: Vec<Notice>,
    /// 失败类别
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ActionOutcome {
    pub fn succeeded(credential: Credential, message: impl Into<String>) -> Self {
        Self {
            credential: Some(credential),
            notices: vec![Notice::success(message)],
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            credential: None,
            notices: vec![Notice::error(message)],
            failure: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// 凭证使用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Expired,
    Active,
    Idle,
}

/// 列表中的一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRow {
    pub id: String,
    pub name: String,
    pub cipher: Cipher,
    pub secret_masked: String,
    /// 规范化后的过期日期；格式无效时为原始值
    pub expire_date: Option<String>,
    pub is_expired: bool,
    pub expiry_label: String,
    pub usage_bytes: f64,
    pub usage_display: String,
    pub status: UsageStatus,
}

impl CredentialRow {
    /// 组合凭证与流量数据
    pub fn build(credential: &Credential, usage: &UsageSnapshot) -> Self {
        let id = credential.id.to_string();
        let expiry = compute_expiry_status(credential.expire_date.as_deref());
        let usage_bytes = usage.get(&id).copied().unwrap_or(0.0);

        let expiry_label = match (&expiry.date, expiry.is_expired) {
            (None, _) => NO_EXPIRATION.to_string(),
            (Some(date), true) => format!("Expired: {date}"),
            (Some(date), false) => date.clone(),
        };
        let status = if expiry.is_expired {
            UsageStatus::Expired
        } else if usage_bytes > 0.0 {
            UsageStatus::Active
        } else {
            UsageStatus::Idle
        };

        Self {
            id,
            name: credential.display_name().to_string(),
            cipher: credential.cipher,
            secret_masked: mask_secret(&credential.secret, DEFAULT_VISIBLE),
            expire_date: expiry.date,
            is_expired: expiry.is_expired,
            expiry_label,
            usage_bytes,
            usage_display: format_bytes(usage_bytes),
            status,
        }
    }
}

/// 首页视图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexView {
    pub rows: Vec<CredentialRow>,
    pub search: String,
    pub total_usage_bytes: f64,
    /// 对外 API 基础地址（未配置时由 HTTP 层补全）
    pub api_base_url: Option<String>,
    /// 加载失败时的提示横幅
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Notice>,
}

/// 编辑表单数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditForm {
    pub id: u64,
    pub name: String,
    pub cipher: Cipher,
    pub secret: String,
    pub expire_date: String,
    /// 建议使用的新密钥
    pub suggested_secret: String,
    pub ciphers: Vec<Cipher>,
}

/// 按名称过滤（不区分大小写的子串匹配）
pub fn matches_search(credential: &Credential, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    needle.is_empty() || credential.display_name().to_lowercase().contains(&needle)
}
