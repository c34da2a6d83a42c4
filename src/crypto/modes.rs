//! 基于 [`BlockTransform`] 的分组工作模式
//!
//! 链接寄存器在多次调用之间保留，长消息可以按分组对齐的片段依次输入，
//! 结果与一次性处理相同。CFB / OFB / CTR 允许最后一段不满一个分组。

use crate::algorithm::CipherMode;
use crate::algorithm::block::BlockTransform;
use crate::error::{CryptError, Result};

pub struct ModeCipher {
    transform: BlockTransform,
    mode: CipherMode,
    register: Vec<u8>,
}

impl ModeCipher {
    pub fn new(transform: BlockTransform, mode: CipherMode, iv: &[u8]) -> Result<Self> {
        let block_size = transform.block_size();

        let register = match mode {
            CipherMode::Ecb => vec![0u8; block_size],
            CipherMode::Cbc | CipherMode::Cfb | CipherMode::Ofb | CipherMode::Ctr => {
                if iv.len() < block_size {
                    return Err(CryptError::config(format!(
                        "The size of the salt (IV) must be at least {block_size} bytes"
                    )));
                }
                iv[..block_size].to_vec()
            }
            CipherMode::Gcm | CipherMode::Ccm => return Err(aead_mode(mode)),
        };

        Ok(Self {
            transform,
            mode,
            register,
        })
    }

    pub fn block_size(&self) -> usize {
        self.transform.block_size()
    }

    pub fn encrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        let bs = self.block_size();

        match self.mode {
            CipherMode::Ecb => {
                self.check_aligned(buf)?;
                for block in buf.chunks_exact_mut(bs) {
                    self.transform.encrypt_block(block);
                }
            }
            CipherMode::Cbc => {
                self.check_aligned(buf)?;
                for block in buf.chunks_exact_mut(bs) {
                    xor_in_place(block, &self.register);
                    self.transform.encrypt_block(block);
                    self.register.copy_from_slice(block);
                }
            }
            CipherMode::Cfb => {
                let mut keystream = vec![0u8; bs];
                for block in buf.chunks_mut(bs) {
                    keystream.copy_from_slice(&self.register);
                    self.transform.encrypt_block(&mut keystream);
                    xor_in_place(block, &keystream);
                    self.register[..block.len()].copy_from_slice(block);
                }
            }
            CipherMode::Ofb => self.apply_ofb(buf),
            CipherMode::Ctr => self.apply_ctr(buf),
            CipherMode::Gcm | CipherMode::Ccm => return Err(aead_mode(self.mode)),
        }

        Ok(())
    }

    pub fn decrypt(&mut self, buf: &mut [u8]) -> Result<()> {
        let bs = self.block_size();

        match self.mode {
            CipherMode::Ecb => {
                self.check_aligned(buf)?;
                for block in buf.chunks_exact_mut(bs) {
                    self.transform.decrypt_block(block);
                }
            }
            CipherMode::Cbc => {
                self.check_aligned(buf)?;
                let mut previous = vec![0u8; bs];
                for block in buf.chunks_exact_mut(bs) {
                    previous.copy_from_slice(block);
                    self.transform.decrypt_block(block);
                    xor_in_place(block, &self.register);
                    self.register.copy_from_slice(&previous);
                }
            }
            CipherMode::Cfb => {
                let mut keystream = vec![0u8; bs];
                for block in buf.chunks_mut(bs) {
                    keystream.copy_from_slice(&self.register);
                    self.transform.encrypt_block(&mut keystream);
                    self.register[..block.len()].copy_from_slice(block);
                    xor_in_place(block, &keystream);
                }
            }
            CipherMode::Ofb => self.apply_ofb(buf),
            CipherMode::Ctr => self.apply_ctr(buf),
            CipherMode::Gcm | CipherMode::Ccm => return Err(aead_mode(self.mode)),
        }

        Ok(())
    }

    fn apply_ofb(&mut self, buf: &mut [u8]) {
        let bs = self.block_size();
        for block in buf.chunks_mut(bs) {
            self.transform.encrypt_block(&mut self.register);
            xor_in_place(block, &self.register);
        }
    }

    fn apply_ctr(&mut self, buf: &mut [u8]) {
        let bs = self.block_size();
        let mut keystream = vec![0u8; bs];
        for block in buf.chunks_mut(bs) {
            keystream.copy_from_slice(&self.register);
            self.transform.encrypt_block(&mut keystream);
            xor_in_place(block, &keystream);
            increment_be(&mut self.register);
        }
    }

    fn check_aligned(&self, buf: &[u8]) -> Result<()> {
        let bs = self.block_size();
        if buf.len() % bs != 0 {
            return Err(CryptError::Platform(format!(
                "data length {} is not a multiple of the {bs}-byte block size",
                buf.len()
            )));
        }
        Ok(())
    }
}

fn aead_mode(mode: CipherMode) -> CryptError {
    CryptError::Platform(format!("{mode} is an AEAD mode and has no block chaining"))
}

/// `other` 可以比 `data` 长
fn xor_in_place(data: &mut [u8], other: &[u8]) {
    for (d, o) in data.iter_mut().zip(other) {
        *d ^= o;
    }
}

fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        let (next, overflow) = byte.overflowing_add(1);
        *byte = next;
        if !overflow {
            break;
        }
    }
}
