//! AEAD 模式：AES-256-GCM 与 AES-256-CCM
//!
//! tag 与密文分离返回，由调用方决定写入信封的位置。
//! tag 校验失败时不会输出任何明文。

use aes::Aes256;
use aes_gcm::AesGcm;
use aes_gcm::aead::{
    AeadInPlace, KeyInit,
    consts::{U4, U6, U8, U10, U12, U13, U14, U15, U16},
    generic_array::GenericArray,
};
use ccm::Ccm;

use crate::algorithm::{AEAD_NONCE_SIZE, CipherMode};
use crate::error::{CryptError, Result};

/// AES-256 密钥长度
pub const KEY_LEN: usize = 32;

macro_rules! with_aead {
    ($mode:expr, $tag_size:expr, $f:ident ( $($arg:expr),* $(,)? )) => {
        match ($mode, $tag_size) {
            (CipherMode::Gcm, 12) => $f::<AesGcm<Aes256, U12, U12>>($($arg),*),
            (CipherMode::Gcm, 13) => $f::<AesGcm<Aes256, U12, U13>>($($arg),*),
            (CipherMode::Gcm, 14) => $f::<AesGcm<Aes256, U12, U14>>($($arg),*),
            (CipherMode::Gcm, 15) => $f::<AesGcm<Aes256, U12, U15>>($($arg),*),
            (CipherMode::Gcm, 16) => $f::<AesGcm<Aes256, U12, U16>>($($arg),*),
            (CipherMode::Ccm, 4) => $f::<Ccm<Aes256, U4, U12>>($($arg),*),
            (CipherMode::Ccm, 6) => $f::<Ccm<Aes256, U6, U12>>($($arg),*),
            (CipherMode::Ccm, 8) => $f::<Ccm<Aes256, U8, U12>>($($arg),*),
            (CipherMode::Ccm, 10) => $f::<Ccm<Aes256, U10, U12>>($($arg),*),
            (CipherMode::Ccm, 12) => $f::<Ccm<Aes256, U12, U12>>($($arg),*),
            (CipherMode::Ccm, 14) => $f::<Ccm<Aes256, U14, U12>>($($arg),*),
            (CipherMode::Ccm, 16) => $f::<Ccm<Aes256, U16, U12>>($($arg),*),
            (mode, size) => Err(CryptError::config(format!(
                "The tag size {size} is not supported by {mode}"
            ))),
        }
    };
}

/// 原地加密 `buffer`，返回分离的 tag
///
/// `key` 至少 [`KEY_LEN`] 字节，`nonce` 至少 [`AEAD_NONCE_SIZE`] 字节，多余部分忽略。
pub fn seal(
    mode: CipherMode,
    tag_size: usize,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    buffer: &mut [u8],
) -> Result<Vec<u8>> {
    let (key, nonce) = check_inputs(key, nonce)?;
    with_aead!(mode, tag_size, seal_with(key, nonce, aad, buffer))
}

/// 校验 `tag` 并原地解密 `buffer`
///
/// tag 不匹配时返回 [`CryptError::AuthenticationFailed`]，`buffer` 保持为密文。
pub fn open(
    mode: CipherMode,
    tag_size: usize,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    buffer: &mut [u8],
    tag: &[u8],
) -> Result<()> {
    let (key, nonce) = check_inputs(key, nonce)?;
    if tag.len() != tag_size {
        return Err(CryptError::AuthenticationFailed);
    }
    with_aead!(mode, tag_size, open_with(key, nonce, aad, buffer, tag))
}

fn check_inputs<'a>(key: &'a [u8], nonce: &'a [u8]) -> Result<(&'a [u8], &'a [u8])> {
    if key.len() < KEY_LEN {
        return Err(CryptError::config(format!(
            "The size of the key must be at least of {KEY_LEN} bytes"
        )));
    }
    if nonce.len() < AEAD_NONCE_SIZE {
        return Err(CryptError::config(format!(
            "The size of the salt (IV) must be at least {AEAD_NONCE_SIZE} bytes"
        )));
    }
    Ok((&key[..KEY_LEN], &nonce[..AEAD_NONCE_SIZE]))
}

fn seal_with<C: AeadInPlace + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    buffer: &mut [u8],
) -> Result<Vec<u8>> {
    let cipher =
        C::new_from_slice(key).map_err(|_| CryptError::Platform("invalid key length".into()))?;

    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), aad, buffer)
        .map_err(|_| CryptError::Platform("AEAD encrypt failed".into()))?;

    Ok(tag.to_vec())
}

fn open_with<C: AeadInPlace + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    buffer: &mut [u8],
    tag: &[u8],
) -> Result<()> {
    let cipher =
        C::new_from_slice(key).map_err(|_| CryptError::Platform("invalid key length".into()))?;

    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            aad,
            buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CryptError::AuthenticationFailed)
}
