//! 带认证的分组加密（Encrypt-then-MAC / 原生 AEAD）
//!
//! `BlockCipher` 在 `SymmetricCipher` 之上提供一次性的认证加密：
//! - 使用口令 + salt 通过 PBKDF2 派生密钥
//! - 非 AEAD 模式：对 `salt || ciphertext` 计算 HMAC
//! - AEAD 模式（gcm / ccm）：直接使用底层模式自带的认证标签
//!
//! 输出格式：
//! - 非 AEAD：`[salt][HMAC tag][ciphertext]`
//! - AEAD：`[tag][IV][ciphertext]`
//!
//! 默认对输出做 base64 编码，可通过 `set_binary_output(true)` 关闭。
//! 走哪条路径只取决于 cipher 当前的模式，而不是额外的开关。

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::algorithm::CipherAlgorithm;
use crate::config::CipherOptions;
use crate::crypto::hmac::{self, HashAlgorithm};
use crate::crypto::kdf::{self, generate_salt};
use crate::error::{CryptError, Result};
use crate::symmetric::{SymmetricAdapter, SymmetricCipher};

/// PBKDF2 默认迭代次数
pub const DEFAULT_KEY_ITERATION: u32 = 5000;

/// HMAC 与 PBKDF2 默认使用的哈希算法
pub const DEFAULT_HASH: HashAlgorithm = HashAlgorithm::Sha256;

pub struct BlockCipher {
    cipher: SymmetricCipher,
    key: Option<Zeroizing<Vec<u8>>>,
    salt_fixed: bool,
    hash: HashAlgorithm,
    pbkdf2_hash: HashAlgorithm,
    key_iteration: u32,
    binary_output: bool,
}

impl std::fmt::Debug for BlockCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockCipher")
            .field("cipher", &self.cipher)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("hash", &self.hash)
            .field("pbkdf2_hash", &self.pbkdf2_hash)
            .field("key_iteration", &self.key_iteration)
            .field("binary_output", &self.binary_output)
            .finish()
    }
}

impl Default for BlockCipher {
    fn default() -> Self {
        Self::new(SymmetricCipher::new())
    }
}

impl BlockCipher {
    pub fn new(cipher: SymmetricCipher) -> Self {
        Self {
            cipher,
            key: None,
            salt_fixed: false,
            hash: DEFAULT_HASH,
            pbkdf2_hash: DEFAULT_HASH,
            key_iteration: DEFAULT_KEY_ITERATION,
            binary_output: false,
        }
    }

    /// 按名称选择适配器，并应用配置
    pub fn factory(adapter: &str, options: &CipherOptions) -> Result<Self> {
        let adapter = SymmetricAdapter::from_name(adapter).ok_or_else(|| {
            CryptError::config(format!("The symmetric adapter {adapter} does not exist"))
        })?;

        let mut block_cipher = Self::new(adapter.build(&CipherOptions::default())?);
        block_cipher.set_options(options)?;
        Ok(block_cipher)
    }

    /// 应用配置项
    ///
    /// `key` 作为口令保存，`salt` 视为固定 salt，
    /// 其余 cipher 级别的配置交给 `SymmetricCipher`。
    pub fn set_options(&mut self, options: &CipherOptions) -> Result<()> {
        let cipher_options = CipherOptions {
            key: None,
            salt: None,
            ..options.clone()
        };
        self.cipher.set_options(&cipher_options)?;

        if let Some(key) = &options.key {
            self.set_key(key.as_bytes())?;
        }
        if let Some(salt) = &options.salt {
            self.set_salt(salt.as_bytes())?;
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
        if let Some(binary) = options.binary_output {
            self.set_binary_output(binary);
        }
        Ok(())
    }

    pub fn cipher(&self) -> &SymmetricCipher {
        &self.cipher
    }

    pub fn cipher_mut(&mut self) -> &mut SymmetricCipher {
        &mut self.cipher
    }

    /// 保存口令；实际的加密 / 认证密钥在每次调用时派生
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

    /// 固定 salt；未设置时每次加密都会生成新的随机 salt
    pub fn set_salt(&mut self, salt: &[u8]) -> Result<()> {
        self.cipher.set_salt(salt)?;
        self.salt_fixed = true;
        Ok(())
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.cipher.salt()
    }

    pub fn original_salt(&self) -> Option<&[u8]> {
        self.cipher.original_salt()
    }

    pub fn set_cipher_algorithm(&mut self, name: &str) -> Result<()> {
        self.cipher.set_algorithm(name)
    }

    pub fn cipher_algorithm(&self) -> CipherAlgorithm {
        self.cipher.algorithm()
    }

    pub fn cipher_supported_algorithms(&self) -> Vec<CipherAlgorithm> {
        self.cipher.supported_algorithms()
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

    pub fn set_binary_output(&mut self, binary: bool) {
        self.binary_output = binary;
    }

    pub fn binary_output(&self) -> bool {
        self.binary_output
    }

    /// 认证加密
    ///
    /// 任何非空输入都是合法明文，包括 `b"0"`。
    pub fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(CryptError::config("The data to encrypt cannot be empty"));
        }
        let passphrase = self
            .key
            .as_deref()
            .ok_or_else(|| CryptError::config("No key specified for the encryption"))?;

        // ---------- 准备 salt ----------
        let salt = match (self.salt_fixed, self.cipher.salt()) {
            (true, Some(salt)) => salt.to_vec(),
            _ => generate_salt(self.cipher.salt_size()),
        };
        self.cipher.set_salt(&salt)?;

        debug!(
            algorithm = %self.cipher.algorithm(),
            mode = %self.cipher.mode(),
            len = data.len(),
            "encrypting"
        );

        // ---------- AEAD：由模式本身提供认证 ----------
        if self.cipher.is_auth_enc_mode() {
            let key = kdf::pbkdf2_hmac(
                self.pbkdf2_hash,
                passphrase,
                &salt,
                self.key_iteration,
                self.cipher.key_size(),
            )?;
            self.cipher.set_key(&key)?;

            let envelope = self.cipher.encrypt(data)?;
            return Ok(self.encode(envelope));
        }

        // ---------- 派生加密密钥与认证密钥 ----------
        let keys = kdf::derive_keys(
            self.pbkdf2_hash,
            passphrase,
            &salt,
            self.key_iteration,
            self.cipher.key_size(),
        )?;
        self.cipher.set_key(&keys.encryption)?;

        // ---------- 加密，并对 salt || ciphertext 计算 HMAC ----------
        let sealed = self.cipher.encrypt(data)?;
        let tag = hmac::compute(&keys.authentication, self.hash, &sealed)?;

        let (iv, ciphertext) = sealed.split_at(salt.len());
        let mut envelope = Vec::with_capacity(sealed.len() + tag.len());
        envelope.extend_from_slice(iv);
        envelope.extend_from_slice(&tag);
        envelope.extend_from_slice(ciphertext);

        Ok(self.encode(envelope))
    }

    /// 认证解密（兼容接口）
    ///
    /// 认证失败返回 `Ok(None)`，不会返回任何被篡改的明文；
    /// 配置错误（空输入、未设置密钥等）仍然以 `Err` 返回。
    pub fn decrypt(&mut self, data: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.try_decrypt(data) {
            Ok(plaintext) => Ok(Some(plaintext)),
            Err(err) if err.is_authentication_failure() => {
                warn!(mode = %self.cipher.mode(), "authentication failed");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// 认证解密，认证失败时返回 `CryptError::AuthenticationFailed`
    pub fn try_decrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(CryptError::config("The data to decrypt cannot be empty"));
        }
        let passphrase = self
            .key
            .as_deref()
            .ok_or_else(|| CryptError::config("No key specified for the decryption"))?;

        let envelope = if self.binary_output {
            data.to_vec()
        } else {
            STANDARD
                .decode(data)
                .map_err(|_| CryptError::AuthenticationFailed)?
        };

        let salt_size = self.cipher.salt_size();

        // ---------- AEAD：IV 即 KDF salt，校验交给底层模式 ----------
        if self.cipher.is_auth_enc_mode() {
            let tag_size = self.cipher.tag_size();
            let iv = envelope
                .get(tag_size..tag_size + salt_size)
                .ok_or(CryptError::AuthenticationFailed)?;

            let key = kdf::pbkdf2_hmac(
                self.pbkdf2_hash,
                passphrase,
                iv,
                self.key_iteration,
                self.cipher.key_size(),
            )?;
            self.cipher.set_key(&key)?;

            return self.cipher.decrypt(&envelope);
        }

        // ---------- 拆分 salt / tag / ciphertext ----------
        let tag_size = self.hash.output_size();
        if envelope.len() <= salt_size + tag_size {
            return Err(CryptError::AuthenticationFailed);
        }
        let (salt, rest) = envelope.split_at(salt_size);
        let (tag, ciphertext) = rest.split_at(tag_size);

        let keys = kdf::derive_keys(
            self.pbkdf2_hash,
            passphrase,
            salt,
            self.key_iteration,
            self.cipher.key_size(),
        )?;

        // ---------- 先校验 HMAC，再解密 ----------
        let mut sealed = Vec::with_capacity(salt.len() + ciphertext.len());
        sealed.extend_from_slice(salt);
        sealed.extend_from_slice(ciphertext);

        if !hmac::verify(&keys.authentication, self.hash, &sealed, tag)? {
            return Err(CryptError::AuthenticationFailed);
        }

        self.cipher.set_key(&keys.encryption)?;
        self.cipher.decrypt(&sealed)
    }

    fn encode(&self, envelope: Vec<u8>) -> Vec<u8> {
        if self.binary_output {
            envelope
        } else {
            STANDARD.encode(envelope).into_bytes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_cipher() -> BlockCipher {
        let mut cipher = BlockCipher::default();
        cipher.set_key(b"test").unwrap();
        cipher.set_key_iteration(10).unwrap();
        cipher
    }

    #[test]
    fn defaults() {
        let cipher = BlockCipher::default();
        assert_eq!(cipher.key_iteration(), 5000);
        assert_eq!(cipher.hash_algorithm(), HashAlgorithm::Sha256);
        assert_eq!(cipher.pbkdf2_hash_algorithm(), HashAlgorithm::Sha256);
        assert!(!cipher.binary_output());
        assert_eq!(cipher.cipher_algorithm(), CipherAlgorithm::Aes);
    }

    #[test]
    fn binary_envelope_layout() {
        let mut cipher = fast_cipher();
        cipher.set_binary_output(true);

        let envelope = cipher.encrypt(b"hello").unwrap();
        // 16 (salt) + 32 (HMAC-SHA256) + 16 (一个填充后的分组)
        assert_eq!(envelope.len(), 16 + 32 + 16);
    }

    #[test]
    fn fixed_salt_gives_deterministic_output() {
        let mut cipher = fast_cipher();
        cipher.set_salt(&[7u8; 16]).unwrap();

        let a = cipher.encrypt(b"payload").unwrap();
        let b = cipher.encrypt(b"payload").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn random_salt_changes_every_call() {
        let mut cipher = fast_cipher();
        let a = cipher.encrypt(b"payload").unwrap();
        let b = cipher.encrypt(b"payload").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_base64_is_an_authentication_failure() {
        let mut cipher = fast_cipher();
        assert_eq!(cipher.decrypt(b"!!not base64!!").unwrap(), None);
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut cipher = BlockCipher::default();
        assert!(matches!(
            cipher.set_key_iteration(0),
            Err(CryptError::Config(_))
        ));
    }
}
