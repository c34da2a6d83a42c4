//! 口令哈希（Argon2id）
//!
//! 输出为 PHC 字符串（`$argon2id$v=19$m=...,t=...,p=...$salt$hash`），
//! 其中已经包含 salt 与参数，校验时不需要额外配置。
//!
//! 校验时同时接受已有的 bcrypt 哈希（`$2a$` / `$2b$` / `$2y$`，
//! 包括 htpasswd 中的 bcrypt 条目），新哈希始终使用 Argon2id。

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::debug;

use crate::error::{CryptError, Result};

/// 默认内存成本（KiB）：64 MB
pub const DEFAULT_MEMORY_COST: u32 = 64 * 1024;

/// 默认时间成本（迭代次数）
pub const DEFAULT_TIME_COST: u32 = 3;

/// 默认并行度
pub const DEFAULT_PARALLELISM: u32 = 1;

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::new(DEFAULT_MEMORY_COST, DEFAULT_TIME_COST, DEFAULT_PARALLELISM, None)
                .unwrap_or_default(),
        }
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义成本参数；参数不合法时返回配置错误
    pub fn with_cost(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_cost, time_cost, parallelism, None)
            .map_err(|e| CryptError::config(format!("The cost parameters are not valid: {e}")))?;
        Ok(Self { params })
    }

    pub fn memory_cost(&self) -> u32 {
        self.params.m_cost()
    }

    pub fn time_cost(&self) -> u32 {
        self.params.t_cost()
    }

    pub fn parallelism(&self) -> u32 {
        self.params.p_cost()
    }

    /// 生成带随机 salt 的 PHC 哈希字符串
    pub fn create(&self, password: &[u8]) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password, &salt)
            .map_err(|e| CryptError::Platform(format!("password hashing failed: {e}")))?;

        debug!(
            m_cost = self.memory_cost(),
            t_cost = self.time_cost(),
            p_cost = self.parallelism(),
            "password hashed"
        );
        Ok(hash.to_string())
    }

    /// 校验口令；哈希字符串格式不合法时返回配置错误
    pub fn verify(&self, password: &[u8], hash: &str) -> Result<bool> {
        if is_bcrypt(hash) {
            return bcrypt::verify(password, hash).map_err(|e| {
                CryptError::config(format!("The hash is not a valid bcrypt string: {e}"))
            });
        }

        let parsed = PasswordHash::new(hash)
            .map_err(|e| CryptError::config(format!("The hash is not a valid PHC string: {e}")))?;
        Ok(self.argon2().verify_password(password, &parsed).is_ok())
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::with_cost(8 * 1024, 1, 1).unwrap()
    }

    #[test]
    fn create_then_verify() {
        let hasher = cheap();
        let hash = hasher.create(b"correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(b"correct horse", &hash).unwrap());
        assert!(!hasher.verify(b"wrong horse", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = cheap();
        let a = hasher.create(b"same").unwrap();
        let b = hasher.create(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_uses_parameters_from_the_hash() {
        let hash = cheap().create(b"password").unwrap();
        let other = PasswordHasher::with_cost(16 * 1024, 2, 1).unwrap();
        assert!(other.verify(b"password", &hash).unwrap());
    }

    #[test]
    fn invalid_cost_is_rejected() {
        assert!(matches!(
            PasswordHasher::with_cost(8 * 1024, 0, 1),
            Err(CryptError::Config(_))
        ));
    }

    #[test]
    fn malformed_hash_is_a_config_error() {
        assert!(matches!(
            cheap().verify(b"password", "not a phc string"),
            Err(CryptError::Config(_))
        ));
    }

    #[test]
    fn verifies_existing_bcrypt_hashes() {
        // $2y$ 哈希（cost 10），口令为 "test"
        let hash = "$2y$10$123456789012345678901uIcehzOq0s9RvVtyXJFIsuuxuE2XZRMq";
        let hasher = PasswordHasher::new();

        assert!(hasher.verify(b"test", hash).unwrap());
        assert!(!hasher.verify(b"t", hash).unwrap());
    }

    #[test]
    fn malformed_bcrypt_hash_is_a_config_error() {
        assert!(matches!(
            cheap().verify(b"test", "$2y$10$tooshort"),
            Err(CryptError::Config(_))
        ));
    }

    #[test]
    fn default_cost() {
        let hasher = PasswordHasher::new();
        assert_eq!(hasher.memory_cost(), DEFAULT_MEMORY_COST);
        assert_eq!(hasher.time_cost(), DEFAULT_TIME_COST);
        assert_eq!(hasher.parallelism(), DEFAULT_PARALLELISM);
    }
}
