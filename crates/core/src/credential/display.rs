//! 凭证展示辅助
//!
//! 密钥脱敏、过期状态计算和流量格式化，仅用于展示，不参与比较和持久化。

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// 脱敏字符
pub const MASK_CHAR: char = '*';

/// 默认首尾保留字符数
pub const DEFAULT_VISIBLE: usize = 4;

/// 过期日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 脱敏显示密钥
///
/// 长度不超过 `2 * visible` 时原样返回；否则保留首尾各 `visible` 个字符，
/// 中间用 `*` 填充，总长度不变。
pub fn mask_secret(secret: &str, visible: usize) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= visible * 2 {
        return secret.to_string();
    }
    let head: String = chars[..visible].iter().collect();
    let tail: String = chars[chars.len() - visible..].iter().collect();
    let middle = MASK_CHAR.to_string().repeat(chars.len() - visible * 2);
    format!("{head}{middle}{tail}")
}

/// 过期状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryStatus {
    /// 是否已过期
    pub is_expired: bool,
    /// 规范化后的日期；无法解析时为原始字符串
    pub date: Option<String>,
}

/// 计算过期状态（以本地日期为准）
pub fn compute_expiry_status(expire_date: Option<&str>) -> ExpiryStatus {
    expiry_status_on(expire_date, Local::now().date_naive())
}

/// 以指定日期为"今天"计算过期状态
///
/// 日期格式无法解析时视为未过期，并原样返回输入。
pub fn expiry_status_on(expire_date: Option<&str>, today: NaiveDate) -> ExpiryStatus {
    let raw = match expire_date {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return ExpiryStatus {
                is_expired: false,
                date: None,
            }
        }
    };

    match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
        Ok(date) => ExpiryStatus {
            is_expired: date < today,
            date: Some(date.format(DATE_FORMAT).to_string()),
        },
        Err(_) => {
            tracing::debug!("[KEYS] 过期日期格式无效，按未过期处理: {}", raw);
            ExpiryStatus {
                is_expired: false,
                date: Some(raw.to_string()),
            }
        }
    }
}

/// 格式化流量（十进制单位）
///
/// 小于 1000 字节显示为 `N Bytes`，否则保留一位小数，如 `1.5 MB`。
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    let bytes = if bytes.is_finite() && bytes > 0.0 {
        bytes
    } else {
        0.0
    };
    if bytes < 1000.0 {
        let n = bytes as u64;
        return if n == 1 {
            "1 Byte".to_string()
        } else {
            format!("{n} Bytes")
        };
    }
    let mut value = bytes / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
