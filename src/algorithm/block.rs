//! 单分组变换，底层为 RustCrypto 的分组密码实现。

use aes::Aes256;
use blowfish::Blowfish;
use camellia::Camellia256;
use cast5::Cast5;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray};
use des::Des;

use crate::algorithm::CipherAlgorithm;
use crate::error::{CryptError, Result};

pub enum BlockTransform {
    Aes(Box<Aes256>),
    Blowfish(Box<Blowfish>),
    Des(Des),
    Camellia(Box<Camellia256>),
    Cast5(Cast5),
}

impl BlockTransform {
    /// `key` 截断到算法的密钥长度
    pub fn new(algorithm: CipherAlgorithm, key: &[u8]) -> Result<Self> {
        let key_size = algorithm.key_size();
        if key.len() < key_size {
            return Err(CryptError::config(format!(
                "The size of the key must be at least of {key_size} bytes"
            )));
        }
        let key = &key[..key_size];

        let transform = match algorithm {
            CipherAlgorithm::Aes => Self::Aes(Box::new(
                <Aes256>::new_from_slice(key).map_err(invalid_key)?,
            )),
            CipherAlgorithm::Blowfish => Self::Blowfish(Box::new(
                <Blowfish>::new_from_slice(key).map_err(invalid_key)?,
            )),
            CipherAlgorithm::Des => Self::Des(<Des>::new_from_slice(key).map_err(invalid_key)?),
            CipherAlgorithm::Camellia => Self::Camellia(Box::new(
                <Camellia256>::new_from_slice(key).map_err(invalid_key)?,
            )),
            CipherAlgorithm::Cast5 => {
                Self::Cast5(<Cast5>::new_from_slice(key).map_err(invalid_key)?)
            }
            CipherAlgorithm::Seed => {
                return Err(CryptError::config(format!(
                    "The algorithm {algorithm} is not supported on this platform"
                )));
            }
        };

        Ok(transform)
    }

    pub fn block_size(&self) -> usize {
        match self {
            Self::Aes(_) | Self::Camellia(_) => 16,
            Self::Blowfish(_) | Self::Des(_) | Self::Cast5(_) => 8,
        }
    }

    /// 原地加密一个分组
    pub fn encrypt_block(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), self.block_size());
        match self {
            Self::Aes(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Blowfish(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Des(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Camellia(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
            Self::Cast5(c) => c.encrypt_block(GenericArray::from_mut_slice(block)),
        }
    }

    /// 原地解密一个分组
    pub fn decrypt_block(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), self.block_size());
        match self {
            Self::Aes(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Blowfish(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Des(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Camellia(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
            Self::Cast5(c) => c.decrypt_block(GenericArray::from_mut_slice(block)),
        }
    }
}

fn invalid_key(_: cipher::InvalidLength) -> CryptError {
    CryptError::Platform("invalid key length".into())
}
