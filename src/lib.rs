//! 带认证的对称分组加密
//!
//! - `symmetric`：算法 / 模式 / 密钥 / IV / 填充的配置与校验
//! - `BlockCipher`：一次性认证加密（HMAC 或原生 AEAD）
//! - `FileCipher`：任意大小文件的流式认证加密
//! - `hybrid`：RSA 封装会话密钥的多接收者加密
//! - `crypto::hmac`、`password`：独立的 HMAC 与口令哈希工具

mod encrypt;
mod decrypt;

pub mod algorithm;
pub mod block_cipher;
pub mod config;
pub mod crypto;
pub mod error;
pub mod file_cipher;
pub mod format;
pub mod fs;
pub mod hybrid;
pub mod password;
pub mod symmetric;

pub use algorithm::{CipherAlgorithm, CipherMode};
pub use block_cipher::BlockCipher;
pub use config::CipherOptions;
pub use crypto::hmac::HashAlgorithm;
pub use error::{CryptError, Result};
pub use file_cipher::FileCipher;
pub use hybrid::{Hybrid, KeyWrap, RsaOaep};
pub use password::PasswordHasher;
pub use symmetric::padding::{Padding, PaddingScheme};
pub use symmetric::{SymmetricAdapter, SymmetricCipher};
