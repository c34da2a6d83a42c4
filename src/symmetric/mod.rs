//! 对称加密适配层
//!
//! [`SymmetricCipher`] 保存一组加密配置（算法、模式、密钥、IV、填充，
//! AEAD 模式下还有 tag 长度与附加数据），每个 setter 都会按当前构建的能力校验。
//! 非 AEAD 模式不做任何认证，需要认证时使用 [`BlockCipher`](crate::BlockCipher)。
//!
//! 输出格式：
//! - 非 AEAD：`[IV][ciphertext]`
//! - AEAD：`[tag][IV][ciphertext]`

pub mod padding;

use zeroize::Zeroizing;

use crate::algorithm::{
    self, CipherAlgorithm, CipherMode, DEFAULT_TAG_SIZE, block::BlockTransform,
};
use crate::config::CipherOptions;
use crate::crypto::{aead, modes::ModeCipher};
use crate::error::{CryptError, Result};
use padding::{Padding, PaddingScheme};

/// 按名称选择的加密后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymmetricAdapter {
    /// RustCrypto 分组密码、`aes-gcm` 与 `ccm`
    #[default]
    RustCrypto,
}

impl SymmetricAdapter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rustcrypto" => Some(Self::RustCrypto),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RustCrypto => "rustcrypto",
        }
    }

    pub fn build(self, options: &CipherOptions) -> Result<SymmetricCipher> {
        match self {
            Self::RustCrypto => SymmetricCipher::with_options(options),
        }
    }
}

pub struct SymmetricCipher {
    algorithm: CipherAlgorithm,
    mode: CipherMode,
    key: Option<Zeroizing<Vec<u8>>>,
    iv: Option<Vec<u8>>,
    padding: Option<Padding>,
    aad: Vec<u8>,
    tag_size: usize,
    tag: Option<Vec<u8>>,
}

impl Default for SymmetricCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricCipher")
            .field("algorithm", &self.algorithm)
            .field("mode", &self.mode)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("padding", &self.padding)
            .field("tag_size", &self.tag_size)
            .finish()
    }
}

impl SymmetricCipher {
    /// 默认：AES / CBC / PKCS#7
    pub fn new() -> Self {
        Self {
            algorithm: CipherAlgorithm::Aes,
            mode: CipherMode::Cbc,
            key: None,
            iv: None,
            padding: Some(Padding::Pkcs7),
            aad: Vec::new(),
            tag_size: DEFAULT_TAG_SIZE,
            tag: None,
        }
    }

    pub fn with_options(options: &CipherOptions) -> Result<Self> {
        let mut cipher = Self::new();
        cipher.set_options(options)?;
        Ok(cipher)
    }

    /// 应用加密层的选项，其余字段忽略
    ///
    /// 先设置算法和模式，再按最终配置校验密钥与 IV 的长度。
    pub fn set_options(&mut self, options: &CipherOptions) -> Result<()> {
        if let Some(algorithm) = &options.algorithm {
            self.set_algorithm(algorithm)?;
        }
        if let Some(mode) = &options.mode {
            self.set_mode(mode)?;
        }
        if let Some(key) = &options.key {
            self.set_key(key.as_bytes())?;
        }
        if let Some(salt) = &options.salt {
            self.set_salt(salt.as_bytes())?;
        }
        if let Some(name) = &options.padding {
            let padding = Padding::from_name(name).ok_or_else(|| {
                CryptError::config(format!("The padding {name} does not exist"))
            })?;
            self.set_padding(padding);
        }
        if let Some(size) = options.tag_size {
            self.set_tag_size(size)?;
        }
        if let Some(aad) = &options.aad {
            self.set_aad(aad.as_bytes())?;
        }
        Ok(())
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, name: &str) -> Result<()> {
        let algorithm = CipherAlgorithm::from_name(name)
            .filter(|algo| algo.is_available())
            .ok_or_else(|| CryptError::config(format!("The algorithm {name} is not supported")))?;

        self.algorithm = algorithm;
        if !algorithm::is_supported(algorithm, self.mode) {
            self.mode = CipherMode::Cbc;
            self.tag_size = DEFAULT_TAG_SIZE;
            self.aad.clear();
        }
        self.drop_short_material();
        Ok(())
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn set_mode(&mut self, name: &str) -> Result<()> {
        let mode = CipherMode::from_name(name)
            .filter(|mode| algorithm::is_supported(self.algorithm, *mode))
            .ok_or_else(|| {
                CryptError::config(format!(
                    "The mode {name} is not supported by {}",
                    self.algorithm
                ))
            })?;

        if mode != self.mode {
            self.mode = mode;
            self.tag_size = DEFAULT_TAG_SIZE;
            self.tag = None;
            if !mode.is_aead() {
                self.aad.clear();
            }
        }
        self.drop_short_material();
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }

    pub fn key_size(&self) -> usize {
        self.algorithm.key_size()
    }

    /// 当前算法与模式下的 IV 长度
    pub fn salt_size(&self) -> usize {
        algorithm::iv_size(self.algorithm, self.mode)
    }

    /// 保存完整密钥，使用时截断到 [`key_size`](Self::key_size)
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CryptError::config("The key cannot be empty"));
        }
        let key_size = self.key_size();
        if key.len() < key_size {
            return Err(CryptError::config(format!(
                "The size of the key must be at least of {key_size} bytes"
            )));
        }
        self.key = Some(Zeroizing::new(key.to_vec()));
        Ok(())
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_ref().map(|key| &key[..self.key_size()])
    }

    pub fn set_salt(&mut self, salt: &[u8]) -> Result<()> {
        let salt_size = self.salt_size();
        if salt.is_empty() && salt_size > 0 {
            return Err(CryptError::config("The salt (IV) cannot be empty"));
        }
        if salt.len() < salt_size {
            return Err(CryptError::config(format!(
                "The size of the salt (IV) must be at least {salt_size} bytes"
            )));
        }
        self.iv = Some(salt.to_vec());
        Ok(())
    }

    /// 截断到 [`salt_size`](Self::salt_size) 的 IV；无 IV 的模式返回空切片
    pub fn salt(&self) -> Option<&[u8]> {
        if self.salt_size() == 0 {
            return Some(&[]);
        }
        self.iv.as_ref().map(|iv| &iv[..self.salt_size()])
    }

    /// 设置时的原始 IV
    pub fn original_salt(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    pub fn padding(&self) -> Option<Padding> {
        self.padding
    }

    pub fn set_padding(&mut self, padding: Padding) {
        self.padding = Some(padding);
    }

    pub fn clear_padding(&mut self) {
        self.padding = None;
    }

    pub fn aad(&self) -> &[u8] {
        &self.aad
    }

    pub fn set_aad(&mut self, aad: &[u8]) -> Result<()> {
        if !self.mode.is_aead() {
            return Err(CryptError::config(
                "You can set Additional Authentication Data (AAD) only for AEAD modes",
            ));
        }
        self.aad = aad.to_vec();
        Ok(())
    }

    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    /// 设置 AEAD tag 长度：GCM 为 12..=16，CCM 为 4..=16 的偶数
    ///
    /// GCM 不支持短于 12 字节的 tag，使用这类 tag 生成的 GCM 信封无法在这里解密。
    pub fn set_tag_size(&mut self, size: usize) -> Result<()> {
        if !self.mode.is_aead() {
            return Err(CryptError::config(
                "You can set the tag size only for AEAD modes",
            ));
        }
        if !self.mode.tag_sizes().contains(&size) {
            let mut message = format!(
                "The tag size {size} is not supported by {}; valid sizes are {:?}",
                self.mode,
                self.mode.tag_sizes()
            );
            if self.mode == CipherMode::Gcm && size < 12 {
                message.push_str(
                    "; gcm tags shorter than 12 bytes cannot be produced or verified",
                );
            }
            return Err(CryptError::config(message));
        }
        self.tag_size = size;
        Ok(())
    }

    /// 最近一次 AEAD 操作的 tag
    pub fn tag(&self) -> Option<&[u8]> {
        self.tag.as_deref()
    }

    pub fn supported_algorithms(&self) -> Vec<CipherAlgorithm> {
        algorithm::supported_algorithms()
    }

    pub fn supported_modes(&self) -> &'static [CipherMode] {
        algorithm::supported_modes(self.algorithm)
    }

    pub fn is_auth_enc_available(&self) -> bool {
        algorithm::is_auth_enc_available()
    }

    pub fn is_auth_enc_mode(&self) -> bool {
        self.mode.is_aead()
    }

    /// 填充并加密 `data`
    pub fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(CryptError::config("The data to encrypt cannot be empty"));
        }
        let key = self
            .key()
            .ok_or_else(|| CryptError::config("No key specified for the encryption"))?;
        let iv = self
            .salt()
            .ok_or_else(|| CryptError::config("The salt (IV) cannot be empty"))?;
        let padding = self
            .padding
            .ok_or_else(|| CryptError::config("You have to specify a padding method"))?;

        let mut buffer = padding.pad(data, self.block_size())?;

        if self.mode.is_aead() {
            let tag = aead::seal(self.mode, self.tag_size, key, iv, &self.aad, &mut buffer)?;

            let mut out = Vec::with_capacity(tag.len() + iv.len() + buffer.len());
            out.extend_from_slice(&tag);
            out.extend_from_slice(iv);
            out.extend_from_slice(&buffer);
            self.tag = Some(tag);
            return Ok(out);
        }

        let transform = BlockTransform::new(self.algorithm, key)?;
        ModeCipher::new(transform, self.mode, iv)?.encrypt(&mut buffer)?;

        let mut out = Vec::with_capacity(iv.len() + buffer.len());
        out.extend_from_slice(iv);
        out.extend_from_slice(&buffer);
        Ok(out)
    }

    /// 拆出 IV（和 tag），解密并去除填充
    ///
    /// AEAD tag 不匹配返回 [`CryptError::AuthenticationFailed`]，
    /// 填充错误返回 [`CryptError::InvalidPadding`]。
    pub fn decrypt(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(CryptError::config("The data to decrypt cannot be empty"));
        }
        let key = self
            .key
            .as_ref()
            .map(|key| &key[..self.algorithm.key_size()])
            .ok_or_else(|| CryptError::config("No key specified for the decryption"))?;
        let padding = self
            .padding
            .ok_or_else(|| CryptError::config("You have to specify a padding method"))?;
        let salt_size = self.salt_size();

        let mut buffer = if self.mode.is_aead() {
            if data.len() < self.tag_size + salt_size {
                return Err(CryptError::AuthenticationFailed);
            }
            let (tag, rest) = data.split_at(self.tag_size);
            let (iv, ciphertext) = rest.split_at(salt_size);

            let mut buffer = ciphertext.to_vec();
            aead::open(self.mode, self.tag_size, key, iv, &self.aad, &mut buffer, tag)?;
            self.tag = Some(tag.to_vec());
            buffer
        } else {
            if data.len() < salt_size {
                return Err(CryptError::InvalidPadding);
            }
            let (iv, ciphertext) = data.split_at(salt_size);
            // CFB / OFB / CTR 允许最后一个分组不完整
            let misaligned = matches!(self.mode, CipherMode::Ecb | CipherMode::Cbc)
                && ciphertext.len() % self.block_size() != 0;
            if ciphertext.is_empty() || misaligned {
                return Err(CryptError::InvalidPadding);
            }

            let mut buffer = ciphertext.to_vec();
            let transform = BlockTransform::new(self.algorithm, key)?;
            ModeCipher::new(transform, self.mode, iv)?.decrypt(&mut buffer)?;
            buffer
        };

        let len = padding
            .strip(&buffer)
            .ok_or(CryptError::InvalidPadding)?
            .len();
        buffer.truncate(len);
        Ok(buffer)
    }

    fn drop_short_material(&mut self) {
        if self.key.as_ref().is_some_and(|k| k.len() < self.key_size()) {
            self.key = None;
        }
        let salt_size = self.salt_size();
        if self.iv.as_ref().is_some_and(|iv| iv.len() < salt_size) {
            self.iv = None;
        }
    }
}
