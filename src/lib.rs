//! Keycast - Shadowsocks 访问密钥管理服务
//!
//! 管理 outline-ss-server 配置文件中的访问密钥，修改后重启代理进程，
//! 并按密钥汇总代理上报的流量。
//!
//! ## Workspace 结构
//! - keycast-core（设置、配置文件、凭证生命周期、日志）
//! - keycast-infra（代理进程编排、指标抓取）
//! - keycast-services（管理操作编排、视图模型）
//! - keycast-server（HTTP 管理接口）

pub mod app;

pub use app::run;
