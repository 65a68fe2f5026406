//! 错误类型定义

use std::path::PathBuf;

/// 配置文件错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("config file not found: {}", .0.display())]
    Missing(PathBuf),
    /// 配置文件无法解析或结构不完整
    #[error("invalid config file: {0}")]
    Invalid(String),
    /// 配置文件写入失败
    #[error("failed to write config file: {0}")]
    Write(String),
}

/// 凭证操作错误
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// 凭证不存在（按 ID 或按密钥查找均未命中）
    #[error("credential not found: {0}")]
    NotFound(String),
    /// 提交的密钥为空
    #[error("secret cannot be empty")]
    EmptySecret,
    /// 配置文件读写失败
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CredentialError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// 运行设置错误
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}
