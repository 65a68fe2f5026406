//! 凭证生命周期
//!
//! 创建、编辑、删除和查找凭证。每个变更操作都在配置文件独占锁内完成
//! load → mutate → save；保存失败时内存中的修改直接丢弃。
//! 代理进程重启由上层（SyncCoordinator）在释放锁后发起。

use super::types::{non_blank, Cipher, Credential, CredentialEdit};
use crate::config::{ConfigStore, Document};
use crate::errors::CredentialError;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use subtle::ConstantTimeEq;

/// 生成密钥的长度
pub const SECRET_LENGTH: usize = 20;

/// 生成随机密钥（字母 + 数字，来自操作系统 CSPRNG）
pub fn generate_secret() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// 计算下一个凭证 ID
///
/// 取现有最大 ID + 1；存在无法解析的 ID 时退化为 `数量 + 1`。
pub fn next_credential_id(keys: &[Credential]) -> u64 {
    if keys.is_empty() {
        return 1;
    }
    let numeric: Option<Vec<u64>> = keys.iter().map(|k| k.id.as_number()).collect();
    match numeric.and_then(|ids| ids.into_iter().max()) {
        Some(max) => max.saturating_add(1),
        None => {
            tracing::warn!("[KEYS] 存在无法解析的凭证 ID，按数量分配新 ID");
            keys.len() as u64 + 1
        }
    }
}

/// 按密钥精确查找（常量时间比较）
pub fn find_by_secret<'a>(keys: &'a [Credential], secret: &str) -> Option<&'a Credential> {
    if secret.is_empty() {
        return None;
    }
    keys.iter()
        .find(|k| bool::from(k.secret.as_bytes().ct_eq(secret.as_bytes())))
}

/// 凭证生命周期管理
#[derive(Debug, Clone)]
pub struct CredentialLifecycle {
    store: ConfigStore,
}

impl CredentialLifecycle {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// 在独占锁内执行 load → mutate → save
    ///
    /// `mutate` 返回错误时不写回配置文件。
    fn transact<T>(
        &self,
        mutate: impl FnOnce(&mut Document) -> Result<T, CredentialError>,
    ) -> Result<T, CredentialError> {
        let _lock = self.store.lock_exclusive()?;
        let mut doc = self.store.load()?;
        let result = mutate(&mut doc)?;
        self.store.save(&doc)?;
        Ok(result)
    }

    /// 列出所有凭证（只读，不加锁）
    pub fn list(&self) -> Result<Vec<Credential>, CredentialError> {
        Ok(self.store.load()?.credentials().to_vec())
    }

    /// 新增凭证
    ///
    /// 自动分配 ID、生成密钥，默认使用 chacha20-ietf-poly1305。
    pub fn add_credential(&self, expire_date: Option<&str>) -> Result<Credential, CredentialError> {
        let credential = self.transact(|doc| {
            let keys = doc.credentials_mut();
            let id = next_credential_id(keys);
            let credential = Credential::new(id, Cipher::default(), generate_secret())
                .with_expire_date(expire_date);
            keys.push(credential.clone());
            Ok(credential)
        })?;
        tracing::info!(
            "[KEYS] 新增凭证: id={}, expire_date={:?}",
            credential.id,
            credential.expire_date
        );
        Ok(credential)
    }

    /// 编辑凭证（全量替换名称、加密方式、密钥和过期日期）
    ///
    /// # 错误
    /// - 密钥为空返回 `CredentialError::EmptySecret`，不写入任何内容
    /// - ID 不存在返回 `CredentialError::NotFound`
    pub fn edit_credential(
        &self,
        id: u64,
        edit: CredentialEdit,
    ) -> Result<Credential, CredentialError> {
        let secret = edit.secret.trim().to_string();
        if secret.is_empty() {
            return Err(CredentialError::EmptySecret);
        }

        let updated = self.transact(|doc| {
            let target = doc
                .credentials_mut()
                .iter_mut()
                .find(|k| k.id.matches(id))
                .ok_or_else(|| CredentialError::NotFound(format!("id {id}")))?;

            target.name = non_blank(edit.name.as_deref());
            target.cipher = edit.cipher;
            target.secret = secret;
            target.expire_date = non_blank(edit.expire_date.as_deref());
            Ok(target.clone())
        })?;

        tracing::info!(
            "[KEYS] 更新凭证: id={}, cipher={}, expire_date={:?}",
            updated.id,
            updated.cipher,
            updated.expire_date
        );
        Ok(updated)
    }

    /// 删除凭证
    pub fn delete_credential(&self, id: u64) -> Result<Credential, CredentialError> {
        let removed = self.transact(|doc| {
            let keys = doc.credentials_mut();
            let index = keys
                .iter()
                .position(|k| k.id.matches(id))
                .ok_or_else(|| CredentialError::NotFound(format!("id {id}")))?;
            Ok(keys.remove(index))
        })?;
        tracing::info!("[KEYS] 删除凭证: id={}", removed.id);
        Ok(removed)
    }

    /// 按 ID 查找
    pub fn find_by_id(&self, id: u64) -> Result<Credential, CredentialError> {
        self.store
            .load()?
            .credentials()
            .iter()
            .find(|k| k.id.matches(id))
            .cloned()
            .ok_or_else(|| CredentialError::NotFound(format!("id {id}")))
    }

    /// 按密钥查找（未鉴权的客户端配置获取路径）
    pub fn find_by_secret(&self, secret: &str) -> Result<Credential, CredentialError> {
        let doc = self.store.load()?;
        find_by_secret(doc.credentials(), secret)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound("no credential holds this secret".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialId;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"services:
  - listeners:
      - type: tcp
        address: "[::]:9000"
    keys:
      - id: 1
        cipher: chacha20-ietf-poly1305
        secret: AAAAbbbbCCCCddddEEEE
      - id: 3
        name: bob
        cipher: aes-256-gcm
        secret: FFFFggggHHHHiiiiJJJJ
"#;

    fn lifecycle_with(content: &str) -> (TempDir, CredentialLifecycle) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, content).unwrap();
        (dir, CredentialLifecycle::new(ConfigStore::new(path)))
    }

    fn cred(id: CredentialId) -> Credential {
        Credential {
            id,
            ..Credential::new(0, Cipher::default(), "s".to_string())
        }
    }

    #[test]
    fn test_generate_secret() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), SECRET_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_next_id_empty() {
        assert_eq!(next_credential_id(&[]), 1);
    }

    #[test]
    fn test_next_id_uses_max() {
        let keys = vec![
            cred(CredentialId::Numeric(4)),
            cred(CredentialId::Text("9".to_string())),
            cred(CredentialId::Numeric(2)),
        ];
        assert_eq!(next_credential_id(&keys), 10);
    }

    #[test]
    fn test_next_id_falls_back_to_count() {
        let keys = vec![
            cred(CredentialId::Numeric(4)),
            cred(CredentialId::Text("legacy".to_string())),
        ];
        assert_eq!(next_credential_id(&keys), 3);
    }

    #[test]
    fn test_add_credential_with_corrupt_ids_falls_back_to_count() {
        for id_line in ["id: -1\n        ", "id: 2.5\n        ", "id: null\n        ", ""] {
            let content = format!(
                "services:\n  - keys:\n      - id: 7\n        secret: a\n      - {id_line}secret: b\n"
            );
            let (_dir, lifecycle) = lifecycle_with(&content);
            let added = lifecycle.add_credential(None).unwrap();
            assert_eq!(added.id, CredentialId::Numeric(3), "{id_line:?}");

            let keys = lifecycle.list().unwrap();
            assert_eq!(keys.len(), 3);
            assert!(keys[0].id.matches(7));
            assert_eq!(keys[1].id.as_number(), None);
            assert_eq!(keys[1].secret, "b");
        }
    }

    #[test]
    fn test_add_credential_without_expire_date() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let added = lifecycle.add_credential(Some("")).unwrap();
        assert_eq!(added.id, CredentialId::Numeric(4));
        assert_eq!(added.cipher, Cipher::Chacha20IetfPoly1305);
        assert_eq!(added.secret.len(), SECRET_LENGTH);
        assert!(added.expire_date.is_none());

        let raw = fs::read_to_string(lifecycle.store().path()).unwrap();
        assert!(!raw.contains("expire_date"));
        assert_eq!(lifecycle.list().unwrap().len(), 3);
    }

    #[test]
    fn test_add_credential_with_expire_date() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let added = lifecycle.add_credential(Some(" 2031-02-03 ")).unwrap();
        assert_eq!(added.expire_date.as_deref(), Some("2031-02-03"));
        let stored = lifecycle.find_by_id(4).unwrap();
        assert_eq!(stored, added);
    }

    #[test]
    fn test_add_credential_creates_missing_keys() {
        let (_dir, lifecycle) = lifecycle_with("services:\n  - listeners: []\n");
        let added = lifecycle.add_credential(None).unwrap();
        assert_eq!(added.id, CredentialId::Numeric(1));
    }

    #[test]
    fn test_edit_credential_full_replace() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let updated = lifecycle
            .edit_credential(
                3,
                CredentialEdit {
                    name: Some("  ".to_string()),
                    cipher: Cipher::Aes128Gcm,
                    secret: " NewSecretValue ".to_string(),
                    expire_date: Some("2020-01-01".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.name, None);
        assert_eq!(updated.cipher, Cipher::Aes128Gcm);
        assert_eq!(updated.secret, "NewSecretValue");
        assert_eq!(updated.expire_date.as_deref(), Some("2020-01-01"));

        let status = crate::credential::compute_expiry_status(updated.expire_date.as_deref());
        assert!(status.is_expired);
        assert_eq!(status.date.as_deref(), Some("2020-01-01"));

        // 空白过期日期表示移除
        let cleared = lifecycle
            .edit_credential(
                3,
                CredentialEdit {
                    secret: "NewSecretValue".to_string(),
                    ..CredentialEdit::default()
                },
            )
            .unwrap();
        assert!(cleared.expire_date.is_none());
    }

    #[test]
    fn test_edit_empty_secret_leaves_store_unchanged() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let err = lifecycle
            .edit_credential(
                3,
                CredentialEdit {
                    name: Some("mallory".to_string()),
                    secret: "   ".to_string(),
                    ..CredentialEdit::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CredentialError::EmptySecret));
        assert_eq!(
            fs::read_to_string(lifecycle.store().path()).unwrap(),
            SAMPLE
        );
    }

    #[test]
    fn test_edit_missing_id() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let err = lifecycle
            .edit_credential(
                42,
                CredentialEdit {
                    secret: "whatever".to_string(),
                    ..CredentialEdit::default()
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_credential() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let removed = lifecycle.delete_credential(1).unwrap();
        assert_eq!(removed.id, CredentialId::Numeric(1));
        let left = lifecycle.list().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, CredentialId::Numeric(3));
    }

    #[test]
    fn test_delete_missing_id_leaves_store_unchanged() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let err = lifecycle.delete_credential(99).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            fs::read_to_string(lifecycle.store().path()).unwrap(),
            SAMPLE
        );
    }

    #[test]
    fn test_find_by_secret_exact_match() {
        let (_dir, lifecycle) = lifecycle_with(SAMPLE);
        let found = lifecycle.find_by_secret("FFFFggggHHHHiiiiJJJJ").unwrap();
        assert_eq!(found.id, CredentialId::Numeric(3));

        assert!(lifecycle.find_by_secret("ffffgggghhhhiiiijjjj").is_err());
        assert!(lifecycle.find_by_secret("FFFFgggg").is_err());
        assert!(lifecycle.find_by_secret("").is_err());
    }

    #[test]
    fn test_missing_config_surfaces_error() {
        let dir = TempDir::new().unwrap();
        let lifecycle = CredentialLifecycle::new(ConfigStore::new(dir.path().join("x.yaml")));
        assert!(matches!(
            lifecycle.add_credential(None),
            Err(CredentialError::Config(crate::errors::ConfigError::Missing(_)))
        ));
    }

    proptest! {
        #[test]
        fn prop_next_id_is_strictly_greater(ids in prop::collection::vec(1u64..1_000_000, 0..20)) {
            let keys: Vec<Credential> = ids.iter().map(|&id| cred(CredentialId::Numeric(id))).collect();
            let next = next_credential_id(&keys);
            prop_assert!(ids.iter().all(|&id| next > id));
            prop_assert!(!ids.contains(&next));
        }
    }
}
