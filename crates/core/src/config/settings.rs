//! 运行设置
//!
//! 管理进程自身的设置（配置文件路径、代理二进制、指标端口、对外域名等），
//! 启动时加载一次并在构造各组件时传入。

use crate::errors::SettingsError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 设置文件路径环境变量
pub const SETTINGS_ENV: &str = "KEYCAST_SETTINGS";

/// 运行设置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// 代理配置文件路径
    pub config_path: PathBuf,
    /// 代理二进制路径
    pub binary_path: PathBuf,
    /// 代理进程输出日志
    pub proxy_log_path: PathBuf,
    /// 代理指标监听地址
    pub metrics_addr: String,
    /// 按凭证统计流量的指标名
    pub metric_name: String,
    /// 客户端配置中使用的域名
    pub domain: String,
    /// 对外 API 基础地址，为空时使用管理服务自身地址
    pub api_domain: Option<String>,
    /// 管理服务监听地址
    pub listen_addr: String,
    /// 停止旧进程后的等待时间（毫秒）
    pub grace_period_ms: u64,
    /// 等待旧进程退出的最长时间（毫秒）
    pub terminate_timeout_ms: u64,
    /// 指标抓取超时（毫秒）
    pub scrape_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.yaml"),
            binary_path: PathBuf::from("./outline-ss-server"),
            proxy_log_path: PathBuf::from("outline.log"),
            metrics_addr: "127.0.0.1:9091".to_string(),
            metric_name: "shadowsocks_data_bytes".to_string(),
            domain: "example.com".to_string(),
            api_domain: None,
            listen_addr: "0.0.0.0:5000".to_string(),
            grace_period_ms: 1000,
            terminate_timeout_ms: 5000,
            scrape_timeout_ms: 2000,
        }
    }
}

impl Settings {
    /// 加载设置
    ///
    /// 指定路径的文件不存在时使用默认值。
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = match path {
            Some(p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                if content.trim().is_empty() {
                    Self::default()
                } else {
                    serde_yaml::from_str(&content)?
                }
            }
            Some(p) => {
                tracing::warn!("[CONFIG] 设置文件 {:?} 不存在，使用默认设置", p);
                Self::default()
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// 从命令行参数或环境变量确定设置文件路径
    pub fn locate(arg: Option<String>) -> Option<PathBuf> {
        arg.or_else(|| std::env::var(SETTINGS_ENV).ok())
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    /// 校验设置
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.config_path.as_os_str().is_empty() {
            return Err(SettingsError::Invalid("config_path must not be empty".to_string()));
        }
        if self.binary_path.as_os_str().is_empty() {
            return Err(SettingsError::Invalid("binary_path must not be empty".to_string()));
        }
        if self.metric_name.trim().is_empty() {
            return Err(SettingsError::Invalid("metric_name must not be empty".to_string()));
        }
        self.metrics_socket()?;
        self.listen_socket()?;
        Ok(())
    }

    pub fn metrics_socket(&self) -> Result<SocketAddr, SettingsError> {
        self.metrics_addr
            .parse()
            .map_err(|e| SettingsError::Invalid(format!("metrics_addr: {e}")))
    }

    pub fn listen_socket(&self) -> Result<SocketAddr, SettingsError> {
        self.listen_addr
            .parse()
            .map_err(|e| SettingsError::Invalid(format!("listen_addr: {e}")))
    }

    /// 指标抓取地址
    pub fn metrics_url(&self) -> String {
        format!("http://{}/metrics", self.metrics_addr)
    }

    /// 代理进程识别参数（`-config=<path>`）
    pub fn config_flag(&self) -> String {
        format!("-config={}", self.config_path.display())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_millis(self.scrape_timeout_ms)
    }
}
