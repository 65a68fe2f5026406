//! outline-ss-server 进程编排实现

use super::{ProxyController, RestartError, RestartOutcome};
use async_trait::async_trait;
use keycast_core::Settings;
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System, UpdateKind};
use tokio::sync::Mutex;

/// 轮询旧进程退出的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 启动后检查进程是否立即退出的等待时间
const STARTUP_CHECK: Duration = Duration::from_millis(300);

/// 进程编排器
///
/// 克隆体共享同一把重启锁，同一时刻只有一次 停止 → 等待 → 启动 在执行。
#[derive(Debug, Clone)]
pub struct ProcessOrchestrator {
    binary_path: PathBuf,
    config_flag: String,
    metrics_addr: String,
    log_path: PathBuf,
    grace_period: Duration,
    terminate_timeout: Duration,
    startup_check: Duration,
    restart_lock: Arc<Mutex<()>>,
}

impl ProcessOrchestrator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binary_path: settings.binary_path.clone(),
            config_flag: settings.config_flag(),
            metrics_addr: settings.metrics_addr.clone(),
            log_path: settings.proxy_log_path.clone(),
            grace_period: settings.grace_period(),
            terminate_timeout: settings.terminate_timeout(),
            startup_check: STARTUP_CHECK,
            restart_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 代理进程识别参数
    pub fn config_flag(&self) -> &str {
        &self.config_flag
    }

    /// 查找命令行包含 `-config=<path>` 的进程
    ///
    /// 进程表扫描是阻塞调用，放在阻塞线程池中执行。
    pub async fn matching_pids(&self) -> Vec<Pid> {
        let flag = self.config_flag.clone();
        tokio::task::spawn_blocking(move || scan_pids(&flag))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("[PROCESS] 扫描进程表失败: {}", e);
                Vec::new()
            })
    }

    /// 向匹配的进程发送 SIGTERM，返回发送数量
    async fn signal_terminate(&self, pids: Vec<Pid>) -> usize {
        tokio::task::spawn_blocking(move || send_terminate(&pids))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("[PROCESS] 发送终止信号失败: {}", e);
                0
            })
    }

    /// 停止旧进程
    ///
    /// 返回 false 表示等待超时，仍有进程存活。
    pub async fn terminate_existing(&self) -> bool {
        let pids = self.matching_pids().await;
        if pids.is_empty() {
            tracing::debug!("[PROCESS] 没有运行中的代理进程: {}", self.config_flag);
            return true;
        }

        let signalled = self.signal_terminate(pids.clone()).await;
        tracing::info!(
            "[PROCESS] 已向 {} 个代理进程发送终止信号: {:?}",
            signalled,
            pids
        );

        let deadline = Instant::now() + self.terminate_timeout;
        loop {
            let remaining = self.matching_pids().await;
            if remaining.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "[PROCESS] 等待代理进程退出超时 ({:?})，仍存活: {:?}",
                    self.terminate_timeout,
                    remaining
                );
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// 启动新的代理进程（脱离当前进程生命周期）
    pub async fn launch(&self) -> Result<u32, RestartError> {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| RestartError::Launch(format!("cannot open proxy log: {e}")))?;
        let log_err = log
            .try_clone()
            .map_err(|e| RestartError::Launch(format!("cannot clone log handle: {e}")))?;

        let mut command = tokio::process::Command::new(&self.binary_path);
        command
            .arg(&self.config_flag)
            .arg("-metrics")
            .arg(&self.metrics_addr)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(false);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => RestartError::BinaryMissing(self.binary_path.clone()),
            _ => RestartError::Launch(e.to_string()),
        })?;
        let pid = child.id().unwrap_or_default();

        tokio::time::sleep(self.startup_check).await;
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::error!("[PROCESS] 代理进程启动后立即退出: {}", status);
                return Err(RestartError::ExitedEarly(format!(
                    "{status}, see {}",
                    self.log_path.display()
                )));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("[PROCESS] 检查代理进程状态失败: {}", e),
        }

        tracing::info!(
            "[PROCESS] 代理进程已启动: pid={}, {} -metrics {}",
            pid,
            self.config_flag,
            self.metrics_addr
        );
        Ok(pid)
    }
}

#[async_trait]
impl ProxyController for ProcessOrchestrator {
    async fn restart(&self) -> Result<RestartOutcome, RestartError> {
        let _guard = self.restart_lock.lock().await;

        let terminated = self.terminate_existing().await;

        tokio::time::sleep(self.grace_period).await;

        self.launch().await?;

        Ok(if terminated {
            RestartOutcome::Restarted
        } else {
            RestartOutcome::TerminationTimedOut
        })
    }
}

fn scan_pids(flag: &str) -> Vec<Pid> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::new().with_cmd(UpdateKind::Always),
    );
    let own = sysinfo::get_current_pid().ok();

    system
        .processes()
        .iter()
        .filter(|(pid, _)| Some(**pid) != own)
        .filter(|(_, process)| process.status() != ProcessStatus::Zombie)
        .filter(|(_, process)| cmd_contains(process.cmd(), flag))
        .map(|(pid, _)| *pid)
        .collect()
}

fn send_terminate(pids: &[Pid]) -> usize {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(pids), true);

    pids.iter()
        .filter_map(|pid| system.process(*pid))
        .filter(|process| match process.kill_with(Signal::Term) {
            Some(sent) => sent,
            // 平台不支持 SIGTERM 时直接结束
            None => process.kill(),
        })
        .count()
}

fn cmd_contains<S: AsRef<OsStr>>(cmd: &[S], flag: &str) -> bool {
    cmd.iter()
        .any(|arg| arg.as_ref().to_string_lossy().contains(flag))
}
