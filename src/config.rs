//! 加密配置项
//!
//! `CipherOptions` 描述可以一次性交给 `SymmetricCipher` /
//! `BlockCipher` / `FileCipher` 的全部配置：
//! - 既可以在代码中直接构造
//! - 也可以从 TOML 文件或字符串加载
//!
//! 未识别的配置项会被忽略而不是报错。
//! 所有字段都是可选的：缺省字段保持目标对象当前的取值。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CryptError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherOptions {
    /// 分组密码算法，例如 "aes"
    #[serde(alias = "algo")]
    pub algorithm: Option<String>,
    /// 链接模式，例如 "cbc" / "gcm"
    pub mode: Option<String>,
    /// 密钥或口令（UTF-8）
    pub key: Option<String>,
    /// salt / IV
    #[serde(alias = "iv")]
    pub salt: Option<String>,
    /// 填充方式："pkcs7" / "nopadding"
    pub padding: Option<String>,
    /// PBKDF2 迭代次数
    #[serde(alias = "key_iteration")]
    pub iteration_count: Option<u32>,
    /// HMAC 使用的哈希算法
    pub hash_algorithm: Option<String>,
    /// PBKDF2 使用的哈希算法
    pub pbkdf2_hash_algorithm: Option<String>,
    /// 是否输出原始字节（否则 base64）
    pub binary_output: Option<bool>,
    /// AEAD 附加认证数据
    pub aad: Option<String>,
    /// AEAD 认证标签长度（字节）
    pub tag_size: Option<usize>,
}

impl CipherOptions {
    /// 从 TOML 字符串解析配置
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| CryptError::config(format!("invalid cipher options: {e}")))
    }

    /// 从 TOML 文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
