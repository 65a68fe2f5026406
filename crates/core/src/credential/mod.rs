//! 凭证核心
//!
//! 包含凭证类型定义、生命周期管理（增删改查）以及展示辅助。

pub mod display;
pub mod lifecycle;
pub mod types;

pub use display::{
    compute_expiry_status, expiry_status_on, format_bytes, mask_secret, ExpiryStatus,
    DEFAULT_VISIBLE,
};
pub use lifecycle::{
    find_by_secret, generate_secret, next_credential_id, CredentialLifecycle, SECRET_LENGTH,
};
pub use types::{non_blank, Cipher, Credential, CredentialEdit, CredentialId};
