//! 凭证相关类型定义
//!
//! 定义访问密钥（凭证）、凭证 ID、加密方式等核心类型

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 凭证 ID
///
/// 正常情况下是正整数；手工编辑配置文件可能留下非数字、负数、小数、
/// null 甚至缺失的 ID，这些值原样保留并在保存时写回。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialId {
    /// 数字 ID
    Numeric(u64),
    /// 字符串（包括数字字符串）
    Text(String),
    /// 其他任意值（负数、小数、null 等）
    Other(serde_yaml::Value),
}

impl Default for CredentialId {
    /// 缺失的 ID
    fn default() -> Self {
        Self::Other(serde_yaml::Value::Null)
    }
}

impl CredentialId {
    /// 解析为数字 ID
    ///
    /// 数字字符串（如 `"3"`）也视为数字。
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Other(_) => None,
        }
    }

    /// ID 缺失（或为 null），保存时不写出该字段
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Other(serde_yaml::Value::Null))
    }

    /// 是否匹配给定的数字 ID
    pub fn matches(&self, id: u64) -> bool {
        self.as_number() == Some(id)
    }
}

impl From<u64> for CredentialId {
    fn from(id: u64) -> Self {
        Self::Numeric(id)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Other(serde_yaml::Value::Null) => Ok(()),
            Self::Other(serde_yaml::Value::Number(n)) => write!(f, "{n}"),
            Self::Other(other) => {
                let text = serde_yaml::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(text.trim_end())
            }
        }
    }
}

/// 加密方式（Shadowsocks AEAD）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cipher {
    #[serde(rename = "chacha20-ietf-poly1305")]
    Chacha20IetfPoly1305,
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "aes-192-gcm")]
    Aes192Gcm,
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,
}

impl Cipher {
    /// 所有支持的加密方式
    pub const ALL: [Cipher; 4] = [
        Cipher::Chacha20IetfPoly1305,
        Cipher::Aes256Gcm,
        Cipher::Aes192Gcm,
        Cipher::Aes128Gcm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chacha20IetfPoly1305 => "chacha20-ietf-poly1305",
            Self::Aes256Gcm => "aes-256-gcm",
            Self::Aes192Gcm => "aes-192-gcm",
            Self::Aes128Gcm => "aes-128-gcm",
        }
    }
}

impl Default for Cipher {
    fn default() -> Self {
        Self::Chacha20IetfPoly1305
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cipher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported cipher: {s}"))
    }
}

/// 凭证 - 配置文件 `keys` 列表中的一条记录
///
/// 字段顺序即保存时的输出顺序，未识别的字段保存在 `extra` 中原样写回。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    /// 唯一标识符
    #[serde(default, skip_serializing_if = "CredentialId::is_missing")]
    pub id: CredentialId,
    /// 显示名称（仅管理界面使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 加密方式
    #[serde(default)]
    pub cipher: Cipher,
    /// 访问密钥
    #[serde(default)]
    pub secret: String,
    /// 过期日期（YYYY-MM-DD），缺省表示永不过期
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<String>,
    /// 运维手工添加的其他字段
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Credential {
    /// 创建新凭证
    pub fn new(id: u64, cipher: Cipher, secret: String) -> Self {
        Self {
            id: CredentialId::Numeric(id),
            name: None,
            cipher,
            secret,
            expire_date: None,
            extra: IndexMap::new(),
        }
    }

    /// 设置过期日期，空白值表示不过期
    pub fn with_expire_date(mut self, expire_date: Option<&str>) -> Self {
        self.expire_date = non_blank(expire_date);
        self
    }

    /// 显示名称，未设置时返回空字符串
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// 编辑凭证的提交内容（全量替换语义）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialEdit {
    /// 显示名称，空白表示清除
    #[serde(default)]
    pub name: Option<String>,
    /// 加密方式
    #[serde(default)]
    pub cipher: Cipher,
    /// 访问密钥，不能为空
    #[serde(default)]
    pub secret: String,
    /// 过期日期，空白表示移除过期时间
    #[serde(default)]
    pub expire_date: Option<String>,
}

/// 去除首尾空白，空字符串视为 None
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
