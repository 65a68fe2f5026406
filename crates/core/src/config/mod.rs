//! 配置管理
//!
//! - `document`: 代理配置文档（YAML）的强类型结构
//! - `store`: 配置文件的加载、校验、原子保存和文件锁
//! - `settings`: 管理进程自身的运行设置

pub mod document;
pub mod settings;
pub mod store;

pub use document::{Document, ServiceSection};
pub use settings::{Settings, SETTINGS_ENV};
pub use store::{ConfigStore, StoreLock};
