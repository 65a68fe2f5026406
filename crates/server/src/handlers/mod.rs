//! HTTP 请求处理器模块
//!
//! - `admin` - 凭证管理
//! - `client` - 客户端配置下发

pub mod admin;
pub mod client;

pub use admin::*;
pub use client::*;
