//! 密钥派生模块（PBKDF2-HMAC）
//!
//! 一次派生输出 `2 × key_size` 字节：
//! - 前半部分为加密密钥
//! - 后半部分为认证（HMAC）密钥
//!
//! 派生结果离开作用域后自动清零。

use hmac::Hmac;
use md5::Md5;
use pbkdf2::pbkdf2;
use rand::{RngCore, rngs::OsRng};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::hmac::HashAlgorithm;
use crate::error::{CryptError, Result};

/// 由同一口令派生的加密密钥与认证密钥
pub struct DerivedKeys {
    pub encryption: Zeroizing<Vec<u8>>,
    pub authentication: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("encryption", &"[REDACTED]")
            .field("authentication", &"[REDACTED]")
            .finish()
    }
}

/// 生成随机 salt / IV
pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// PBKDF2-HMAC-`hash`，输出 `len` 字节
pub fn pbkdf2_hmac(
    hash: HashAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if iterations == 0 {
        return Err(CryptError::config("The number of iterations must be at least 1"));
    }

    let mut out = Zeroizing::new(vec![0u8; len]);
    let result = match hash {
        HashAlgorithm::Md5 => pbkdf2::<Hmac<Md5>>(password, salt, iterations, &mut out[..]),
        HashAlgorithm::Sha1 => pbkdf2::<Hmac<Sha1>>(password, salt, iterations, &mut out[..]),
        HashAlgorithm::Sha224 => pbkdf2::<Hmac<Sha224>>(password, salt, iterations, &mut out[..]),
        HashAlgorithm::Sha256 => pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut out[..]),
        HashAlgorithm::Sha384 => pbkdf2::<Hmac<Sha384>>(password, salt, iterations, &mut out[..]),
        HashAlgorithm::Sha512 => pbkdf2::<Hmac<Sha512>>(password, salt, iterations, &mut out[..]),
        HashAlgorithm::Sha3_256 => {
            pbkdf2::<Hmac<Sha3_256>>(password, salt, iterations, &mut out[..])
        }
        HashAlgorithm::Sha3_512 => {
            pbkdf2::<Hmac<Sha3_512>>(password, salt, iterations, &mut out[..])
        }
    };
    result.map_err(|e| CryptError::Platform(format!("PBKDF2 failed: {e}")))?;

    Ok(out)
}

/// 派生（加密密钥, 认证密钥）
pub fn derive_keys(
    hash: HashAlgorithm,
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    key_size: usize,
) -> Result<DerivedKeys> {
    debug!(%hash, iterations, key_size, "deriving key pair");

    let material = pbkdf2_hmac(hash, passphrase, salt, iterations, key_size * 2)?;
    let (encryption, authentication) = material.split_at(key_size);

    Ok(DerivedKeys {
        encryption: Zeroizing::new(encryption.to_vec()),
        authentication: Zeroizing::new(authentication.to_vec()),
    })
}
