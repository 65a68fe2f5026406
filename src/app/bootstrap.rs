//! 应用启动引导模块
//!
//! 包含设置加载、状态初始化等启动逻辑。

use anyhow::Context;
use keycast_core::Settings;
use keycast_infra::{MetricsScraper, ProcessOrchestrator};
use keycast_server::AppState;
use keycast_services::SyncCoordinator;
use std::sync::Arc;

/// 加载并校验运行设置
///
/// 路径取自第一个命令行参数，其次是 `KEYCAST_SETTINGS` 环境变量。
pub fn load_settings(arg: Option<String>) -> anyhow::Result<Settings> {
    let path = Settings::locate(arg);
    let settings = Settings::load(path.as_deref())
        .with_context(|| format!("无法加载设置文件: {path:?}"))?;
    tracing::info!(
        "[Bootstrap] 配置文件: {:?}, 代理程序: {:?}, 指标地址: {}",
        settings.config_path,
        settings.binary_path,
        settings.metrics_addr
    );
    Ok(settings)
}

/// 初始化应用状态
pub fn init_states(settings: &Settings) -> AppState {
    let orchestrator = Arc::new(ProcessOrchestrator::new(settings));
    let scraper = Arc::new(MetricsScraper::from_settings(settings));
    AppState::new(SyncCoordinator::new(settings, orchestrator, scraper))
}
