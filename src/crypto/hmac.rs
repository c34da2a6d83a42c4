//! HMAC 模块
//!
//! [`Hmac`] 支持增量输入，文件加密用它为整个数据流计算一个 tag。

use std::fmt;

use hmac::Mac;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};

use crate::error::{CryptError, Result};

type HmacMd5 = hmac::Hmac<Md5>;
type HmacSha1 = hmac::Hmac<Sha1>;
type HmacSha224 = hmac::Hmac<Sha224>;
type HmacSha256 = hmac::Hmac<Sha256>;
type HmacSha384 = hmac::Hmac<Sha384>;
type HmacSha512 = hmac::Hmac<Sha512>;
type HmacSha3_256 = hmac::Hmac<Sha3_256>;
type HmacSha3_512 = hmac::Hmac<Sha3_512>;

/// 可用于 HMAC 与 PBKDF2 的哈希算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 8] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_256,
        Self::Sha3_512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_512 => "sha3-512",
        }
    }

    /// 名称查找，不区分大小写
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.name().eq_ignore_ascii_case(name))
    }

    pub fn parse(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| {
            CryptError::config(format!(
                "The specified hash algorithm '{name}' is not supported"
            ))
        })
    }

    /// 摘要长度，也就是 HMAC tag 长度
    pub fn output_size(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
pub enum Hmac {
    Md5(HmacMd5),
    Sha1(HmacSha1),
    Sha224(HmacSha224),
    Sha256(HmacSha256),
    Sha384(HmacSha384),
    Sha512(HmacSha512),
    Sha3_256(HmacSha3_256),
    Sha3_512(HmacSha3_512),
}

macro_rules! each_mac {
    ($self:expr, $mac:ident => $body:expr) => {
        match $self {
            Hmac::Md5($mac) => $body,
            Hmac::Sha1($mac) => $body,
            Hmac::Sha224($mac) => $body,
            Hmac::Sha256($mac) => $body,
            Hmac::Sha384($mac) => $body,
            Hmac::Sha512($mac) => $body,
            Hmac::Sha3_256($mac) => $body,
            Hmac::Sha3_512($mac) => $body,
        }
    };
}

impl Hmac {
    pub fn new(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(CryptError::config("Provided key is null or empty"));
        }

        // HMAC 接受任意长度的密钥，这里不会失败
        let invalid = |_| CryptError::Platform("invalid HMAC key length".into());
        let mac = match algorithm {
            HashAlgorithm::Md5 => Self::Md5(HmacMd5::new_from_slice(key).map_err(invalid)?),
            HashAlgorithm::Sha1 => Self::Sha1(HmacSha1::new_from_slice(key).map_err(invalid)?),
            HashAlgorithm::Sha224 => {
                Self::Sha224(HmacSha224::new_from_slice(key).map_err(invalid)?)
            }
            HashAlgorithm::Sha256 => {
                Self::Sha256(HmacSha256::new_from_slice(key).map_err(invalid)?)
            }
            HashAlgorithm::Sha384 => {
                Self::Sha384(HmacSha384::new_from_slice(key).map_err(invalid)?)
            }
            HashAlgorithm::Sha512 => {
                Self::Sha512(HmacSha512::new_from_slice(key).map_err(invalid)?)
            }
            HashAlgorithm::Sha3_256 => {
                Self::Sha3_256(HmacSha3_256::new_from_slice(key).map_err(invalid)?)
            }
            HashAlgorithm::Sha3_512 => {
                Self::Sha3_512(HmacSha3_512::new_from_slice(key).map_err(invalid)?)
            }
        };
        Ok(mac)
    }

    pub fn update(&mut self, data: &[u8]) {
        each_mac!(self, mac => mac.update(data))
    }

    pub fn finalize(self) -> Vec<u8> {
        each_mac!(self, mac => mac.finalize().into_bytes().to_vec())
    }

    /// 常量时间比较
    pub fn verify(self, tag: &[u8]) -> bool {
        each_mac!(self, mac => mac.verify_slice(tag).is_ok())
    }
}

/// 计算 HMAC（原始字节）
pub fn compute(key: &[u8], algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::new(algorithm, key)?;
    mac.update(data);
    Ok(mac.finalize())
}

/// 计算 HMAC（小写十六进制）
pub fn compute_hex(key: &[u8], algorithm: HashAlgorithm, data: &[u8]) -> Result<String> {
    compute(key, algorithm, data).map(hex::encode)
}

/// 重新计算并以常量时间比较 tag
pub fn verify(key: &[u8], algorithm: HashAlgorithm, data: &[u8], tag: &[u8]) -> Result<bool> {
    let mut mac = Hmac::new(algorithm, key)?;
    mac.update(data);
    Ok(mac.verify(tag))
}

pub fn output_size(name: &str) -> Result<usize> {
    HashAlgorithm::parse(name).map(HashAlgorithm::output_size)
}

pub fn is_supported(name: &str) -> bool {
    HashAlgorithm::from_name(name).is_some()
}

/// 记录最近一次被判定为支持的哈希名称（保持调用方输入的原样）
///
/// 不支持的名称不会改动缓存。
#[derive(Debug, Default, Clone)]
pub struct SupportCache {
    last_supported: Option<String>,
}

impl SupportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_supported(&mut self, name: &str) -> bool {
        if self.last_supported.as_deref() == Some(name) {
            return true;
        }
        let supported = is_supported(name);
        if supported {
            self.last_supported = Some(name.to_owned());
        }
        supported
    }

    pub fn last_supported(&self) -> Option<&str> {
        self.last_supported.as_deref()
    }

    pub fn clear(&mut self) {
        self.last_supported = None;
    }
}
