//! 文件加密
//!
//! `FileCipher` 保存文件加解密所需的配置，实际流程在
//! `encrypt` / `decrypt` 模块中实现：
//! - 模式固定为 CBC（整个文件共享一条 CBC 链）
//! - 认证方式为 Encrypt-then-MAC，整个文件一个 HMAC tag
//! - 输出文件先写入同目录下的临时文件，认证通过后才链接为目标文件（不覆盖已有文件）

use std::path::Path;

use zeroize::Zeroizing;

use crate::algorithm::{self, CipherAlgorithm, CipherMode};
use crate::config::CipherOptions;
use crate::crypto::hmac::HashAlgorithm;
use crate::error::{CryptError, Result};
use crate::{decrypt, encrypt};

/// 每次读取的明文 / 密文 chunk 大小
pub const BUFFER_SIZE: usize = 1_048_576;

/// PBKDF2 默认迭代次数
pub const DEFAULT_KEY_ITERATION: u32 = 10_000;

pub struct FileCipher {
    key: Option<Zeroizing<Vec<u8>>>,
    algorithm: CipherAlgorithm,
    hash: HashAlgorithm,
    pbkdf2_hash: HashAlgorithm,
    key_iteration: u32,
    chunk_size: usize,
}

impl Default for FileCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FileCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCipher")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("algorithm", &self.algorithm)
            .field("hash", &self.hash)
            .field("pbkdf2_hash", &self.pbkdf2_hash)
            .field("key_iteration", &self.key_iteration)
            .finish()
    }
}

impl FileCipher {
    pub fn new() -> Self {
        Self {
            key: None,
            algorithm: CipherAlgorithm::Aes,
            hash: HashAlgorithm::Sha256,
            pbkdf2_hash: HashAlgorithm::Sha256,
            key_iteration: DEFAULT_KEY_ITERATION,
            chunk_size: BUFFER_SIZE,
        }
    }

    /// 应用配置项；模式、填充与 AEAD 相关配置对文件加密没有意义，会被忽略
    pub fn set_options(&mut self, options: &CipherOptions) -> Result<()> {
        if let Some(name) = &options.algorithm {
            self.set_cipher_algorithm(name)?;
        }
        if let Some(key) = &options.key {
            self.set_key(key.as_bytes())?;
        }
        if let Some(count) = options.iteration_count {
            self.set_key_iteration(count)?;
        }
        if let Some(name) = &options.hash_algorithm {
            self.set_hash_algorithm(name)?;
        }
        if let Some(name) = &options.pbkdf2_hash_algorithm {
            self.set_pbkdf2_hash_algorithm(name)?;
        }
        Ok(())
    }

    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CryptError::config("The key cannot be empty"));
        }
        self.key = Some(Zeroizing::new(key.to_vec()));
        Ok(())
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref().map(Vec::as_slice)
    }

    pub fn set_cipher_algorithm(&mut self, name: &str) -> Result<()> {
        let algorithm = CipherAlgorithm::from_name(name)
            .filter(|algo| algorithm::is_supported(*algo, CipherMode::Cbc))
            .ok_or_else(|| {
                CryptError::config(format!("The algorithm {name} is not supported"))
            })?;
        self.algorithm = algorithm;
        Ok(())
    }

    pub fn cipher_algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn cipher_supported_algorithms(&self) -> Vec<CipherAlgorithm> {
        algorithm::supported_algorithms()
    }

    pub fn set_hash_algorithm(&mut self, name: &str) -> Result<()> {
        self.hash = HashAlgorithm::parse(name)?;
        Ok(())
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn set_pbkdf2_hash_algorithm(&mut self, name: &str) -> Result<()> {
        self.pbkdf2_hash = HashAlgorithm::parse(name)?;
        Ok(())
    }

    pub fn pbkdf2_hash_algorithm(&self) -> HashAlgorithm {
        self.pbkdf2_hash
    }

    pub fn set_key_iteration(&mut self, count: u32) -> Result<()> {
        if count == 0 {
            return Err(CryptError::config(
                "The number of iterations must be at least 1",
            ));
        }
        self.key_iteration = count;
        Ok(())
    }

    pub fn key_iteration(&self) -> u32 {
        self.key_iteration
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// salt（即 CBC IV）长度
    pub fn salt_size(&self) -> usize {
        algorithm::iv_size(self.algorithm, CipherMode::Cbc)
    }

    /// 加密 `input`，写出到尚不存在的 `output`
    pub fn encrypt(&self, input: &Path, output: &Path) -> Result<()> {
        encrypt::encrypt_file(self, input, output)
    }

    /// 解密 `input`，写出到尚不存在的 `output`
    ///
    /// 认证失败返回 `Ok(false)`，此时 `output` 不会被创建。
    pub fn decrypt(&self, input: &Path, output: &Path) -> Result<bool> {
        decrypt::decrypt_file(self, input, output)
    }

    #[cfg(test)]
    pub(crate) fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}
