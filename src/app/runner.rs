//! 应用运行器模块

use super::bootstrap;

/// 运行管理服务
///
/// 1. 加载和验证设置
/// 2. 初始化应用状态
/// 3. 启动 HTTP 服务，收到 Ctrl+C 后退出
pub async fn run() -> anyhow::Result<()> {
    keycast_core::logger::init();
    tracing::info!("[Bootstrap] keycast {} 启动", keycast_core::version());

    let settings = bootstrap::load_settings(std::env::args().nth(1))?;
    let addr = settings.listen_socket()?;
    let state = bootstrap::init_states(&settings);

    keycast_server::serve(addr, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[Bootstrap] 无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[Bootstrap] 收到退出信号");
}
