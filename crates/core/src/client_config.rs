//! 客户端连接配置生成
//!
//! 根据凭证生成 Outline 客户端可直接导入的 YAML（TCP + UDP 均走 WebSocket）。

use crate::credential::{Cipher, Credential};
use serde::Serialize;

/// WebSocket 端点
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    #[serde(rename = "$type")]
    pub kind: &'static str,
    pub url: String,
}

/// Shadowsocks 传输配置
#[derive(Debug, Clone, Serialize)]
pub struct ShadowsocksDialer {
    #[serde(rename = "$type")]
    pub kind: &'static str,
    pub endpoint: Endpoint,
    pub cipher: Cipher,
    pub secret: String,
}

/// TCP/UDP 组合传输
#[derive(Debug, Clone, Serialize)]
pub struct Transport {
    #[serde(rename = "$type")]
    pub kind: &'static str,
    pub tcp: ShadowsocksDialer,
    pub udp: ShadowsocksDialer,
}

/// 客户端配置文档
#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    pub transport: Transport,
}

impl ClientConfig {
    /// 为指定凭证构建客户端配置
    pub fn for_credential(domain: &str, credential: &Credential) -> Self {
        let dialer = |path: &str| ShadowsocksDialer {
            kind: "shadowsocks",
            endpoint: Endpoint {
                kind: "websocket",
                url: format!("wss://{domain}/{path}"),
            },
            cipher: credential.cipher,
            secret: credential.secret.clone(),
        };
        Self {
            transport: Transport {
                kind: "tcpudp",
                tcp: dialer("tcp-ray"),
                udp: dialer("udp-ray"),
            },
        }
    }

    /// 序列化为 YAML 文本
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
