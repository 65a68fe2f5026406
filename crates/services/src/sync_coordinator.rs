//! 管理操作编排
//!
//! 写路径：凭证操作（加锁 load → mutate → save）成功后重启代理进程，
//! 所有错误在这里转换为面向用户的提示。读路径只读取配置和流量指标，
//! 不修改任何内容，加载失败时返回空列表和错误横幅。

use crate::view::{
    matches_search, ActionOutcome, CredentialRow, EditForm, FailureKind, IndexView, Notice,
};
use keycast_core::credential::{generate_secret, Cipher, Credential, CredentialEdit};
use keycast_core::{ClientConfig, ConfigStore, CredentialError, CredentialLifecycle, Settings};
use keycast_infra::{ProxyController, RestartError, RestartOutcome, UsageSource};
use std::sync::Arc;

/// 编排层错误
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Restart(#[from] RestartError),
    /// 阻塞任务被取消或 panic
    #[error("background task failed: {0}")]
    Task(String),
    #[error("cannot render client config: {0}")]
    Render(String),
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Credential(CredentialError::NotFound(_)) => FailureKind::NotFound,
            Self::Credential(CredentialError::EmptySecret) => FailureKind::InvalidInput,
            Self::Credential(CredentialError::Config(_)) => FailureKind::Config,
            Self::Restart(_) => FailureKind::Restart,
            Self::Task(_) | Self::Render(_) => FailureKind::Internal,
        }
    }
}

/// 渲染好的客户端配置
#[derive(Debug, Clone)]
pub struct ClientDocument {
    pub credential: Credential,
    pub yaml: String,
}

/// 管理操作编排器
#[derive(Clone)]
pub struct SyncCoordinator {
    lifecycle: CredentialLifecycle,
    controller: Arc<dyn ProxyController>,
    usage: Arc<dyn UsageSource>,
    domain: String,
    api_domain: Option<String>,
}

impl SyncCoordinator {
    pub fn new(
        settings: &Settings,
        controller: Arc<dyn ProxyController>,
        usage: Arc<dyn UsageSource>,
    ) -> Self {
        Self {
            lifecycle: CredentialLifecycle::new(ConfigStore::new(settings.config_path.clone())),
            controller,
            usage,
            domain: settings.domain.clone(),
            api_domain: settings
                .api_domain
                .as_deref()
                .map(|d| d.trim().trim_end_matches('/').to_string())
                .filter(|d| !d.is_empty()),
        }
    }

    /// 在阻塞线程池中执行凭证操作（文件锁和文件 I/O 都是阻塞调用）
    async fn blocking<T, F>(&self, op: F) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&CredentialLifecycle) -> Result<T, CredentialError> + Send + 'static,
    {
        let lifecycle = self.lifecycle.clone();
        tokio::task::spawn_blocking(move || op(&lifecycle))
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
            .map_err(SyncError::from)
    }

    /// 写操作收尾：失败直接转换为提示，成功后重启代理进程
    async fn finish(
        &self,
        action: &str,
        result: Result<Credential, SyncError>,
        message: impl FnOnce(&Credential) -> String,
    ) -> ActionOutcome {
        let credential = match result {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!("[SYNC] {} 失败: {}", action, e);
                return ActionOutcome::failed(e.kind(), format!("Error {action} user: {e}"));
            }
        };

        let text = message(&credential);
        let mut outcome = ActionOutcome::succeeded(credential, text);
        match self.controller.restart().await {
            Ok(RestartOutcome::Restarted) => {
                tracing::info!("[SYNC] {} 完成，代理进程已重启", action);
            }
            Ok(RestartOutcome::TerminationTimedOut) => {
                outcome.push(Notice::warning("Warning: Server restart timeout"));
            }
            Err(e) => {
                // 配置已经保存，不回滚
                tracing::error!("[SYNC] {} 已保存，但代理进程重启失败: {}", action, e);
                outcome.push(Notice::error(format!("Error restarting server: {e}")));
                outcome.failure = Some(SyncError::from(e).kind());
            }
        }
        outcome
    }

    /// 新增凭证并重启代理
    pub async fn add_credential(&self, expire_date: Option<String>) -> ActionOutcome {
        let result = self
            .blocking(move |lifecycle| lifecycle.add_credential(expire_date.as_deref()))
            .await;
        self.finish("adding", result, |c| {
            format!("User {} added and Server Restarted!", c.id)
        })
        .await
    }

    /// 编辑凭证并重启代理
    pub async fn edit_credential(&self, id: u64, edit: CredentialEdit) -> ActionOutcome {
        let result = self
            .blocking(move |lifecycle| lifecycle.edit_credential(id, edit))
            .await;
        self.finish("updating", result, |c| {
            format!("User {} updated and Server Restarted!", c.id)
        })
        .await
    }

    /// 删除凭证并重启代理
    pub async fn delete_credential(&self, id: u64) -> ActionOutcome {
        let result = self
            .blocking(move |lifecycle| lifecycle.delete_credential(id))
            .await;
        self.finish("deleting", result, |c| {
            format!("User {} deleted and Server Restarted!", c.id)
        })
        .await
    }

    /// 首页视图
    pub async fn index_view(&self, search: Option<&str>) -> IndexView {
        let mut view = IndexView {
            api_base_url: self.api_domain.clone(),
            ..IndexView::default()
        };

        let credentials = match self.blocking(|lifecycle| lifecycle.list()).await {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!("[SYNC] 加载凭证列表失败: {}", e);
                view.banner = Some(Notice::error(format!("Error loading config: {e}")));
                return view;
            }
        };

        view.search = search.map(str::trim).unwrap_or_default().to_string();
        let usage = self.usage.scrape().await;
        view.rows = credentials
            .iter()
            .filter(|c| matches_search(c, &view.search))
            .map(|c| CredentialRow::build(c, &usage))
            .collect();
        view.total_usage_bytes = view.rows.iter().map(|r| r.usage_bytes).sum();
        view
    }

    /// 编辑表单（当前值 + 建议的新密钥）
    pub async fn edit_form(&self, id: u64) -> Result<EditForm, SyncError> {
        let credential = self.blocking(move |lifecycle| lifecycle.find_by_id(id)).await?;
        Ok(EditForm {
            id,
            name: credential.display_name().to_string(),
            cipher: credential.cipher,
            secret: credential.secret.clone(),
            expire_date: credential.expire_date.clone().unwrap_or_default(),
            suggested_secret: generate_secret(),
            ciphers: Cipher::ALL.to_vec(),
        })
    }

    /// 按 ID 生成客户端配置
    pub async fn client_config_for_id(&self, id: u64) -> Result<ClientDocument, SyncError> {
        let credential = self.blocking(move |lifecycle| lifecycle.find_by_id(id)).await?;
        self.render(credential)
    }

    /// 按密钥生成客户端配置
    pub async fn client_config_for_secret(&self, secret: &str) -> Result<ClientDocument, SyncError> {
        let secret = secret.to_string();
        let credential = self
            .blocking(move |lifecycle| lifecycle.find_by_secret(&secret))
            .await?;
        self.render(credential)
    }

    fn render(&self, credential: Credential) -> Result<ClientDocument, SyncError> {
        let yaml = ClientConfig::for_credential(&self.domain, &credential)
            .to_yaml()
            .map_err(|e| SyncError::Render(e.to_string()))?;
        Ok(ClientDocument { credential, yaml })
    }
}
