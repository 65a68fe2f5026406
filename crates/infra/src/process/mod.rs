//! 代理进程编排
//!
//! 停止旧的代理进程并以最新配置启动新进程。不保留进程句柄，
//! 旧进程按命令行中的 `-config=<path>` 识别。

mod orchestrator;

pub use orchestrator::ProcessOrchestrator;

use async_trait::async_trait;
use std::path::PathBuf;

/// 重启结果（成功路径）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// 旧进程已退出，新进程已启动
    Restarted,
    /// 旧进程未在限定时间内退出，新进程仍已启动
    TerminationTimedOut,
}

/// 重启失败（新进程未能运行）
#[derive(Debug, thiserror::Error)]
pub enum RestartError {
    /// 代理程序不存在
    #[error("proxy binary not found: {}", .0.display())]
    BinaryMissing(PathBuf),
    /// 启动失败
    #[error("failed to launch proxy process: {0}")]
    Launch(String),
    /// 启动后立即退出（端口被占用、配置无法解析等）
    #[error("proxy process exited right after launch: {0}")]
    ExitedEarly(String),
}

/// 代理进程控制器
///
/// 测试中可以替换为不启动任何进程的实现。
#[async_trait]
pub trait ProxyController: Send + Sync {
    /// 重启代理进程
    async fn restart(&self) -> Result<RestartOutcome, RestartError>;
}
