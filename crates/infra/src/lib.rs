//! Keycast Infra Crate
//!
//! 与外部进程、网络打交道的基础设施：
//! - `process`: 代理进程的停止与启动
//! - `telemetry`: 代理指标抓取与流量汇总

pub mod process;
pub mod telemetry;

pub use process::{ProcessOrchestrator, ProxyController, RestartError, RestartOutcome};
pub use telemetry::{parse_exposition, MetricsScraper, UsageSnapshot, UsageSource};
