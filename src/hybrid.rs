//! 混合加密（RSA 封装会话密钥 + BlockCipher 加密正文）
//!
//! 消息格式：
//!
//! ```text
//! base64(id):base64(wrapped session key):   （每个接收者一段）
//! ;
//! BlockCipher 输出
//! ```
//!
//! 会话密钥为随机字节，长度等于 cipher 的密钥长度。
//! 只有一个接收者且没有 id 时，id 为空字符串。

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::{RngCore, rngs::OsRng};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use tracing::debug;
use zeroize::Zeroizing;

use crate::block_cipher::BlockCipher;
use crate::error::{CryptError, Result};

/// 会话密钥的封装 / 解封装方式
pub trait KeyWrap {
    fn wrap(&self, session_key: &[u8], public_key_pem: &str) -> Result<Vec<u8>>;

    fn unwrap_key(&self, wrapped: &[u8], private_key_pem: &str) -> Result<Zeroizing<Vec<u8>>>;
}

/// RSA-OAEP（SHA-1），密钥为 PKCS#8 PEM
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaOaep;

impl RsaOaep {
    /// 生成一对 PEM 编码的密钥：(私钥, 公钥)
    pub fn generate_key_pair(bits: usize) -> Result<(Zeroizing<String>, String)> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptError::Platform(format!("RSA key generation failed: {e}")))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptError::Platform(format!("RSA private key encoding failed: {e}")))?;
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptError::Platform(format!("RSA public key encoding failed: {e}")))?;

        Ok((private_pem, public_pem))
    }
}

impl KeyWrap for RsaOaep {
    fn wrap(&self, session_key: &[u8], public_key_pem: &str) -> Result<Vec<u8>> {
        let public_key = RsaPublicKey::from_public_key_pem(public_key_pem).map_err(|_| {
            CryptError::config("The public key must be a string in PEM format")
        })?;

        public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha1>(), session_key)
            .map_err(|e| CryptError::Platform(format!("RSA encryption failed: {e}")))
    }

    fn unwrap_key(&self, wrapped: &[u8], private_key_pem: &str) -> Result<Zeroizing<Vec<u8>>> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem).map_err(|_| {
            CryptError::config("The private key must be a string in PEM format")
        })?;

        private_key
            .decrypt(Oaep::new::<Sha1>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|e| CryptError::Platform(format!("RSA decryption failed: {e}")))
    }
}

pub struct Hybrid<W: KeyWrap = RsaOaep> {
    block_cipher: BlockCipher,
    key_wrap: W,
}

impl Default for Hybrid<RsaOaep> {
    fn default() -> Self {
        Self::new(BlockCipher::default(), RsaOaep)
    }
}

impl<W: KeyWrap> Hybrid<W> {
    pub fn new(block_cipher: BlockCipher, key_wrap: W) -> Self {
        Self {
            block_cipher,
            key_wrap,
        }
    }

    pub fn block_cipher(&self) -> &BlockCipher {
        &self.block_cipher
    }

    pub fn block_cipher_mut(&mut self) -> &mut BlockCipher {
        &mut self.block_cipher
    }

    pub fn key_wrap(&self) -> &W {
        &self.key_wrap
    }

    /// 为单个不带 id 的接收者加密
    pub fn encrypt_for(&mut self, plaintext: &[u8], public_key_pem: &str) -> Result<Vec<u8>> {
        self.encrypt(plaintext, &[("", public_key_pem)])
    }

    /// 为多个接收者加密；`recipients` 为 `(id, 公钥 PEM)` 列表
    pub fn encrypt(&mut self, plaintext: &[u8], recipients: &[(&str, &str)]) -> Result<Vec<u8>> {
        if recipients.is_empty() {
            return Err(CryptError::config("At least one public key is required"));
        }

        // ---------- 随机会话密钥加密正文 ----------
        let mut session_key = Zeroizing::new(vec![0u8; self.block_cipher.cipher().key_size()]);
        OsRng.fill_bytes(&mut session_key);

        self.block_cipher.set_key(&session_key)?;
        let ciphertext = self.block_cipher.encrypt(plaintext)?;

        // ---------- 为每个接收者封装会话密钥 ----------
        let mut message = Vec::new();
        for (id, public_key_pem) in recipients {
            let wrapped = self.key_wrap.wrap(&session_key, public_key_pem)?;
            message.extend_from_slice(STANDARD.encode(id).as_bytes());
            message.push(b':');
            message.extend_from_slice(STANDARD.encode(wrapped).as_bytes());
            message.push(b':');
        }
        message.push(b';');
        message.extend_from_slice(&ciphertext);

        debug!(recipients = recipients.len(), "hybrid message sealed");
        Ok(message)
    }

    /// 使用 `id` 对应的私钥解密
    ///
    /// 正文认证失败返回 `Ok(None)`；消息中没有 `id` 对应的会话密钥时返回错误。
    pub fn decrypt(
        &mut self,
        message: &[u8],
        private_key_pem: &str,
        id: &str,
    ) -> Result<Option<Vec<u8>>> {
        let split = message
            .iter()
            .position(|&b| b == b';')
            .ok_or_else(|| CryptError::config("The message is not a hybrid envelope"))?;
        let (keys, ciphertext) = (&message[..split], &message[split + 1..]);

        let keys = std::str::from_utf8(keys)
            .map_err(|_| CryptError::config("The message is not a hybrid envelope"))?;
        let entries: Vec<&str> = keys.split(':').collect();
        let wanted = STANDARD.encode(id);

        let wrapped = entries
            .chunks(2)
            .find_map(|pair| match pair {
                [entry_id, wrapped] if *entry_id == wanted && !wrapped.is_empty() => Some(*wrapped),
                _ => None,
            })
            .ok_or_else(|| {
                CryptError::config("This private key cannot be used for decryption")
            })?;

        let wrapped = STANDARD
            .decode(wrapped)
            .map_err(|_| CryptError::config("The message is not a hybrid envelope"))?;
        let session_key = self.key_wrap.unwrap_key(&wrapped, private_key_pem)?;

        self.block_cipher.set_key(&session_key)?;
        self.block_cipher.decrypt(ciphertext)
    }
}
