//! 代理配置文档
//!
//! 对应 outline-ss-server 的 `config.yaml`：
//!
//! ```yaml
//! services:
//!   - listeners:
//!       - type: tcp
//!         address: "[::]:9000"
//!     keys:
//!       - id: 1
//!         cipher: chacha20-ietf-poly1305
//!         secret: Secret0123456789abcd
//! ```
//!
//! 只对 `services[0].keys` 做强类型解析，其余字段通过 `extra` 原样保留。

use crate::credential::Credential;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 代理服务配置段
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceSection {
    /// listeners 等未建模字段
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
    /// 凭证列表，缺失时视为空
    #[serde(default)]
    pub keys: Vec<Credential>,
}

/// 配置文档
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// 服务段列表，只有第一个服务段由本系统管理
    #[serde(default)]
    pub services: Vec<ServiceSection>,
    /// 其他顶层字段
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Document {
    /// 受管服务段
    pub fn service(&self) -> Option<&ServiceSection> {
        self.services.first()
    }

    /// 获取凭证列表
    ///
    /// 没有服务段时返回空列表。
    pub fn credentials(&self) -> &[Credential] {
        self.service().map(|s| s.keys.as_slice()).unwrap_or(&[])
    }

    /// 获取可变凭证列表，没有服务段时自动创建
    pub fn credentials_mut(&mut self) -> &mut Vec<Credential> {
        if self.services.is_empty() {
            self.services.push(ServiceSection::default());
        }
        &mut self.services[0].keys
    }

    /// 替换凭证列表，没有服务段时自动创建
    pub fn set_credentials(&mut self, keys: Vec<Credential>) {
        *self.credentials_mut() = keys;
    }
}
