//! 分块流式加密 / 解密
//!
//! 职责范围：
//! - 将任意大小的输入按固定大小切分为 chunk
//! - 整个流使用同一个 CBC 链：每个 chunk 的 IV 是上一个 chunk 的最后一个密文分组
//! - 只在真正的最后一个 chunk 上做 PKCS#7 填充（空输入也会产生一个填充分组）
//! - 整个流只有一个 HMAC：以 salt 作为第一段输入，随后依次喂入每个密文 chunk
//!
//! 解密时 HMAC 在整个流处理完后才比较；调用方负责在认证失败时丢弃已写出的明文。
//! 本模块不负责文件头、路径处理与原子写入。

use std::io::{self, Read, Write};

use tracing::debug;

use crate::crypto::hmac::Hmac;
use crate::crypto::modes::ModeCipher;
use crate::error::{CryptError, Result};
use crate::symmetric::padding::{PaddingScheme, Pkcs7};

/// 默认明文 chunk 大小：1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1_048_576;

/// 流式加密器
pub struct StreamEncryptor {
    cipher: ModeCipher,
    mac: Hmac,
    chunk_size: usize,
}

impl StreamEncryptor {
    /// - cipher: 以 salt 作为 IV 初始化好的 CBC 链
    /// - mac: 以认证密钥初始化、已经喂入 salt 的 HMAC
    /// - chunk_size: 必须是分组大小的整数倍
    pub fn new(cipher: ModeCipher, mac: Hmac, chunk_size: usize) -> Result<Self> {
        check_chunk_size(chunk_size, cipher.block_size())?;
        Ok(Self {
            cipher,
            mac,
            chunk_size,
        })
    }

    /// 从 reader 读取明文，加密后写入 writer，返回最终的 HMAC tag
    pub fn encrypt<R: Read, W: Write>(mut self, mut reader: R, mut writer: W) -> Result<Vec<u8>> {
        let block_size = self.cipher.block_size();
        let mut current = vec![0u8; self.chunk_size];
        let mut next = vec![0u8; self.chunk_size];
        let mut len = read_full(&mut reader, &mut current)?;
        let mut chunk_index = 0u64;

        // 整块时需要预读，才能知道它是不是最后一块
        while len == self.chunk_size {
            let next_len = read_full(&mut reader, &mut next)?;
            if next_len == 0 {
                break;
            }
            self.cipher.encrypt(&mut current)?;
            self.emit(&current, &mut writer)?;
            std::mem::swap(&mut current, &mut next);
            len = next_len;
            chunk_index += 1;
        }

        // ---------- 最后一个 chunk：填充后加密 ----------
        let mut tail = Pkcs7.pad(&current[..len], block_size)?;
        self.cipher.encrypt(&mut tail)?;
        self.emit(&tail, &mut writer)?;

        debug!(chunks = chunk_index + 1, "stream encrypted");
        Ok(self.mac.finalize())
    }

    fn emit<W: Write>(&mut self, ciphertext: &[u8], writer: &mut W) -> Result<()> {
        self.mac.update(ciphertext);
        writer.write_all(ciphertext)?;
        Ok(())
    }
}

/// 流式解密器
pub struct StreamDecryptor {
    cipher: ModeCipher,
    mac: Hmac,
    chunk_size: usize,
}

impl StreamDecryptor {
    pub fn new(cipher: ModeCipher, mac: Hmac, chunk_size: usize) -> Result<Self> {
        check_chunk_size(chunk_size, cipher.block_size())?;
        Ok(Self {
            cipher,
            mac,
            chunk_size,
        })
    }

    /// 从 reader 读取密文，解密后写入 writer
    ///
    /// 返回 `Ok(true)` 表示整个流通过认证；
    /// `Ok(false)` 表示认证失败、密文长度不合法或填充错误，
    /// 此时 writer 中的内容必须被丢弃。
    pub fn decrypt<R: Read, W: Write>(
        mut self,
        mut reader: R,
        mut writer: W,
        expected_tag: &[u8],
    ) -> Result<bool> {
        let block_size = self.cipher.block_size();
        let mut current = vec![0u8; self.chunk_size];
        let mut next = vec![0u8; self.chunk_size];
        let mut len = read_full(&mut reader, &mut current)?;

        if len == 0 {
            return Ok(false);
        }

        while len == self.chunk_size {
            let next_len = read_full(&mut reader, &mut next)?;
            if next_len == 0 {
                break;
            }
            self.mac.update(&current);
            self.cipher.decrypt(&mut current)?;
            writer.write_all(&current)?;
            std::mem::swap(&mut current, &mut next);
            len = next_len;
        }

        // ---------- 最后一个 chunk：先完成认证，再去填充 ----------
        let tail = &mut current[..len];
        self.mac.update(tail);

        if len % block_size != 0 || !self.mac.verify(expected_tag) {
            return Ok(false);
        }

        self.cipher.decrypt(tail)?;
        let Some(plaintext) = Pkcs7.strip(tail) else {
            return Ok(false);
        };
        writer.write_all(plaintext)?;
        Ok(true)
    }
}

fn check_chunk_size(chunk_size: usize, block_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size % block_size != 0 {
        return Err(CryptError::config(format!(
            "The chunk size must be a positive multiple of {block_size} bytes"
        )));
    }
    Ok(())
}

/// 尽量读满 buf，只有遇到 EOF 才会返回更短的长度
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::block::BlockTransform;
    use crate::algorithm::{CipherAlgorithm, CipherMode};
    use crate::crypto::hmac::HashAlgorithm;

    const KEY: [u8; 32] = [0x11; 32];
    const IV: [u8; 16] = [0x22; 16];

    fn chain() -> ModeCipher {
        let transform = BlockTransform::new(CipherAlgorithm::Aes, &KEY).unwrap();
        ModeCipher::new(transform, CipherMode::Cbc, &IV).unwrap()
    }

    fn mac() -> Hmac {
        let mut mac = Hmac::new(HashAlgorithm::Sha256, b"auth").unwrap();
        mac.update(&IV);
        mac
    }

    fn encrypt(plaintext: &[u8], chunk_size: usize) -> (Vec<u8>, Vec<u8>) {
        let mut out = Vec::new();
        let tag = StreamEncryptor::new(chain(), mac(), chunk_size)
            .unwrap()
            .encrypt(plaintext, &mut out)
            .unwrap();
        (out, tag)
    }

    #[test]
    fn small_chunks_roundtrip() {
        for size in [0usize, 1, 15, 16, 31, 32, 33, 64, 100] {
            let plaintext: Vec<u8> = (0..size).map(|i| i as u8).collect();
            let (ciphertext, tag) = encrypt(&plaintext, 32);
            assert_eq!(ciphertext.len(), size + 16 - size % 16);

            let mut out = Vec::new();
            let ok = StreamDecryptor::new(chain(), mac(), 32)
                .unwrap()
                .decrypt(&ciphertext[..], &mut out, &tag)
                .unwrap();
            assert!(ok, "size {size}");
            assert_eq!(out, plaintext);
        }
    }

    #[test]
    fn chunking_matches_one_shot_cbc() {
        let plaintext = vec![0x5A; 100];
        let (chunked, _) = encrypt(&plaintext, 32);

        let mut one_shot = Pkcs7.pad(&plaintext, 16).unwrap();
        chain().encrypt(&mut one_shot).unwrap();
        assert_eq!(chunked, one_shot);
    }

    #[test]
    fn tampered_stream_fails() {
        let (mut ciphertext, tag) = encrypt(&[7u8; 70], 32);
        ciphertext[5] ^= 1;

        let ok = StreamDecryptor::new(chain(), mac(), 32)
            .unwrap()
            .decrypt(&ciphertext[..], Vec::new(), &tag)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn misaligned_stream_fails() {
        let (ciphertext, tag) = encrypt(&[7u8; 40], 32);
        let ok = StreamDecryptor::new(chain(), mac(), 32)
            .unwrap()
            .decrypt(&ciphertext[..ciphertext.len() - 1], Vec::new(), &tag)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn chunk_size_must_be_block_aligned() {
        assert!(StreamEncryptor::new(chain(), mac(), 20).is_err());
    }
}
