//! Keycast Services Crate
//!
//! 业务编排层，连接凭证存储、代理进程和流量指标。
//!
//! ## 模块结构
//! - `sync_coordinator` - 管理操作编排（写路径重启代理，读路径组合视图）
//! - `view` - 视图模型与操作结果

pub mod sync_coordinator;
pub mod view;

pub use sync_coordinator::{ClientDocument, SyncCoordinator, SyncError};
pub use view::{
    ActionOutcome, CredentialRow, EditForm, FailureKind, IndexView, Notice, NoticeLevel,
    UsageStatus,
};
