//! Keycast Core Crate
//!
//! 包含纯数据类型和不依赖外部进程/网络的基础模块。
//!
//! ## 模块结构
//! - `config`: 代理配置文档、配置文件存储、运行设置
//! - `credential`: 凭证类型、生命周期、展示辅助
//! - `client_config`: 客户端连接配置生成
//! - `errors`: 错误类型定义
//! - `logger`: 日志配置

pub mod client_config;
pub mod config;
pub mod credential;
pub mod errors;
pub mod logger;

// 重新导出常用类型
pub use client_config::ClientConfig;
pub use config::{ConfigStore, Document, Settings};
pub use credential::{Cipher, Credential, CredentialEdit, CredentialId, CredentialLifecycle};
pub use errors::{ConfigError, CredentialError, SettingsError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
