//! 配置文件读写
//!
//! 每次操作都从磁盘重新加载，不做跨请求缓存。保存时先写同目录临时文件，
//! fsync 后再 rename 覆盖目标文件，代理进程不会读到写了一半的配置。

use super::document::Document;
use crate::errors::ConfigError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// 配置文件存储
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

/// 独占锁守卫，drop 时释放
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("[CONFIG] 释放配置文件锁失败: {}", e);
        }
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 锁文件路径（`<config>.lock`）
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "config".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// 获取独占锁
    ///
    /// 串行化 load → mutate → save，只读路径不需要加锁。
    /// 阻塞调用，异步上下文中应放在 `spawn_blocking` 里执行。
    pub fn lock_exclusive(&self) -> Result<StoreLock, ConfigError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|e| ConfigError::Write(format!("cannot open lock file: {e}")))?;
        file.lock_exclusive()
            .map_err(|e| ConfigError::Write(format!("cannot acquire config lock: {e}")))?;
        Ok(StoreLock { file })
    }

    /// 加载并校验配置文档
    ///
    /// # 错误
    /// - 文件不存在返回 `ConfigError::Missing`
    /// - 无法解析、内容为空或缺少服务段返回 `ConfigError::Invalid`
    pub fn load(&self) -> Result<Document, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::Missing(self.path.clone()));
            }
            Err(e) => return Err(ConfigError::Invalid(format!("cannot read file: {e}"))),
        };

        if content.trim().is_empty() {
            return Err(ConfigError::Invalid("config file is empty".to_string()));
        }

        let doc: Document = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Invalid(format!("YAML parse error: {e}")))?;

        if doc.services.is_empty() {
            return Err(ConfigError::Invalid("missing 'services' section".to_string()));
        }

        tracing::debug!(
            "[CONFIG] 已加载配置: {:?}, 凭证数={}",
            self.path,
            doc.credentials().len()
        );
        Ok(doc)
    }

    /// 原子保存配置文档
    ///
    /// 写入失败时原文件保持不变。
    pub fn save(&self, doc: &Document) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(doc)
            .map_err(|e| ConfigError::Write(format!("cannot serialize document: {e}")))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".keycast-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| ConfigError::Write(format!("cannot create temp file: {e}")))?;

        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.flush())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ConfigError::Write(format!("cannot write temp file: {e}")))?;

        // 临时文件默认 0600，沿用原配置文件的权限
        if let Ok(meta) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), meta.permissions())
                .map_err(|e| ConfigError::Write(format!("cannot copy file permissions: {e}")))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| ConfigError::Write(format!("cannot replace config file: {}", e.error)))?;

        tracing::info!(
            "[CONFIG] 配置已保存: {:?}, 凭证数={}",
            self.path,
            doc.credentials().len()
        );
        Ok(())
    }
}
