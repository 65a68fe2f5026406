//! 流量统计
//!
//! 抓取代理的 Prometheus 指标并按凭证汇总流量。抓取失败不会向上传播，
//! 一律返回空结果。

mod exposition;
mod scraper;

pub use exposition::{parse_exposition, UsageSnapshot};
pub use scraper::MetricsScraper;

use async_trait::async_trait;

/// 流量数据来源
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// 获取各凭证的累计流量，失败时返回空结果
    async fn scrape(&self) -> UsageSnapshot;
}
