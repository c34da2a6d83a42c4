//! 分组填充方案

use crate::error::{CryptError, Result};

pub trait PaddingScheme {
    /// 分组长度不被该方案支持时返回配置错误
    fn pad(&self, data: &[u8], block_size: usize) -> Result<Vec<u8>>;

    /// 去除填充；格式错误时返回 `None`
    ///
    /// 在没有认证的路径上，这是密钥错误或数据损坏的唯一信号。
    fn strip<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]>;
}

/// PKCS#7：追加 n 个值为 n 的字节；已对齐时追加一个完整分组
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pkcs7;

impl PaddingScheme for Pkcs7 {
    fn pad(&self, data: &[u8], block_size: usize) -> Result<Vec<u8>> {
        if !(1..=255).contains(&block_size) {
            return Err(CryptError::config(format!(
                "The block size {block_size} is not valid for PKCS#7 padding"
            )));
        }
        let pad = block_size - data.len() % block_size;

        let mut padded = Vec::with_capacity(data.len() + pad);
        padded.extend_from_slice(data);
        padded.resize(data.len() + pad, pad as u8);
        Ok(padded)
    }

    fn strip<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        let &last = data.last()?;
        let pad = last as usize;
        if pad == 0 || pad > data.len() {
            return None;
        }

        let (body, padding) = data.split_at(data.len() - pad);
        padding.iter().all(|&b| b == last).then_some(body)
    }
}

/// 不填充，由调用方保证分组对齐
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPadding;

impl PaddingScheme for NoPadding {
    fn pad(&self, data: &[u8], _block_size: usize) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn strip<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        Some(data)
    }
}

/// 可按名称选择的填充方案
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Padding {
    #[default]
    Pkcs7,
    NoPadding,
}

impl Padding {
    /// `pkcs7`；`nopadding` / `null` 表示不填充
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pkcs7" => Some(Self::Pkcs7),
            "nopadding" | "null" => Some(Self::NoPadding),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pkcs7 => "pkcs7",
            Self::NoPadding => "nopadding",
        }
    }
}

impl PaddingScheme for Padding {
    fn pad(&self, data: &[u8], block_size: usize) -> Result<Vec<u8>> {
        match self {
            Self::Pkcs7 => Pkcs7.pad(data, block_size),
            Self::NoPadding => NoPadding.pad(data, block_size),
        }
    }

    fn strip<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        match self {
            Self::Pkcs7 => Pkcs7.strip(data),
            Self::NoPadding => NoPadding.strip(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pkcs7_pads_short_input() {
        let padded = Pkcs7.pad(b"AAAA", 8).unwrap();
        assert_eq!(padded, b"AAAA\x04\x04\x04\x04");
        assert_eq!(Pkcs7.strip(&padded), Some(&b"AAAA"[..]));
    }

    #[test]
    fn pkcs7_adds_full_block_when_aligned() {
        let padded = Pkcs7.pad(&[0xAB; 16], 16).unwrap();
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn pkcs7_rejects_inconsistent_padding() {
        assert_eq!(Pkcs7.strip(b"AAAA\x01\x02\x03\x03"), None);
        assert_eq!(Pkcs7.strip(b"AAAA\x04\x04\x03\x04"), None);
    }

    #[test]
    fn pkcs7_rejects_zero_and_oversized_padding() {
        assert_eq!(Pkcs7.strip(b"AAAA\x00"), None);
        assert_eq!(Pkcs7.strip(b"\x05\x05"), None);
        assert_eq!(Pkcs7.strip(b""), None);
    }

    #[test]
    fn pkcs7_rejects_unusable_block_size() {
        // 0 与超过 255 的分组长度无法用一个字节表示填充长度
        assert!(matches!(Pkcs7.pad(b"AAAA", 0), Err(CryptError::Config(_))));
        assert!(matches!(Pkcs7.pad(b"AAAA", 256), Err(CryptError::Config(_))));
        assert_eq!(NoPadding.pad(b"AAAA", 0).unwrap(), b"AAAA");
    }

    #[test]
    fn names_resolve() {
        assert_eq!(Padding::from_name("PKCS7"), Some(Padding::Pkcs7));
        assert_eq!(Padding::from_name("nopadding"), Some(Padding::NoPadding));
        assert_eq!(Padding::from_name("null"), Some(Padding::NoPadding));
        assert_eq!(Padding::from_name("foo"), None);
    }

    proptest! {
        #[test]
        fn pkcs7_strip_undoes_pad(
            data in proptest::collection::vec(any::<u8>(), 0..=512),
            block_size in 1usize..=255,
        ) {
            let padded = Pkcs7.pad(&data, block_size).unwrap();
            prop_assert_eq!(padded.len() % block_size, 0);
            prop_assert!(padded.len() > data.len());
            prop_assert_eq!(Pkcs7.strip(&padded), Some(&data[..]));
        }
    }
}
