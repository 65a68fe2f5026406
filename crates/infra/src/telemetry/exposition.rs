//! Prometheus 文本格式解析
//!
//! 只关心按访问密钥统计流量的指标，例如：
//!
//! ```text
//! shadowsocks_data_bytes{access_key="3",dir="c<p",proto="tcp"} 100
//! shadowsocks_data_bytes{access_key="3",dir="p>c",proto="tcp"} 250
//! ```
//!
//! 同一个 access_key 的多行（不同方向、协议）累加为总流量。

use std::collections::HashMap;

/// 凭证 ID（字符串形式）→ 累计字节数
pub type UsageSnapshot = HashMap<String, f64>;

const ACCESS_KEY_LABEL: &str = "access_key=\"";

/// 解析指标文本
///
/// 格式异常的单行直接跳过，不影响其他行。
pub fn parse_exposition(text: &str, metric_name: &str) -> UsageSnapshot {
    let mut usage = UsageSnapshot::new();
    for line in text.lines() {
        if line.starts_with('#') || !line.starts_with(metric_name) {
            continue;
        }
        if let Some((key_id, value)) = parse_sample(line) {
            *usage.entry(key_id.to_string()).or_insert(0.0) += value;
        }
    }
    usage
}

/// 解析单行样本，返回 (access_key, 数值)
fn parse_sample(line: &str) -> Option<(&str, f64)> {
    let mut tokens = line.split_whitespace();
    let value = tokens.next_back()?;
    // 至少需要 "名称{标签}" 和数值两段
    tokens.next()?;
    let value: f64 = value.parse().ok()?;

    let start = line.find(ACCESS_KEY_LABEL)? + ACCESS_KEY_LABEL.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some((&rest[..end], value))
}
