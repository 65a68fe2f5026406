//! 日志配置
//!
//! 控制台输出，级别由 `RUST_LOG` 控制，默认 `info`。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 默认日志级别
pub const DEFAULT_FILTER: &str = "info";

/// 初始化日志系统
///
/// 重复调用时静默忽略（测试中可能被多次调用）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("[LOGGER] 日志系统已初始化");
    }
}
