//! 指标抓取

use super::exposition::{parse_exposition, UsageSnapshot};
use super::UsageSource;
use async_trait::async_trait;
use keycast_core::Settings;
use reqwest::StatusCode;
use std::time::Duration;

/// 代理指标抓取器
#[derive(Debug, Clone)]
pub struct MetricsScraper {
    client: reqwest::Client,
    url: String,
    metric_name: String,
}

impl MetricsScraper {
    pub fn new(url: impl Into<String>, metric_name: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("[METRICS] 创建 HTTP 客户端失败，使用默认配置: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            url: url.into(),
            metric_name: metric_name.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.metrics_url(),
            settings.metric_name.clone(),
            settings.scrape_timeout(),
        )
    }

    async fn fetch(&self) -> Result<String, String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("请求失败: {e}"))?;
        if response.status() != StatusCode::OK {
            return Err(format!("状态码异常: {}", response.status()));
        }
        response
            .text()
            .await
            .map_err(|e| format!("读取响应失败: {e}"))
    }
}

#[async_trait]
impl UsageSource for MetricsScraper {
    async fn scrape(&self) -> UsageSnapshot {
        match self.fetch().await {
            Ok(text) => {
                let usage = parse_exposition(&text, &self.metric_name);
                tracing::debug!("[METRICS] 抓取完成: {} 个凭证有流量", usage.len());
                usage
            }
            Err(e) => {
                // 代理可能正在重启，按无流量处理
                tracing::debug!("[METRICS] 抓取 {} 失败: {}", self.url, e);
                UsageSnapshot::new()
            }
        }
    }
}
