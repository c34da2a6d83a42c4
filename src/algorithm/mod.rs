//! 分组密码算法与工作模式。
//!
//! 两者都是封闭枚举，按名称查找只用于解析配置；
//! 当前构建实际可用的组合见 [`supported_algorithms`] 与 [`supported_modes`]。

pub mod block;

use std::fmt;

/// 分组密码算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgorithm {
    Aes,
    Blowfish,
    Des,
    Camellia,
    Cast5,
    Seed,
}

impl CipherAlgorithm {
    pub const ALL: [CipherAlgorithm; 6] = [
        Self::Aes,
        Self::Blowfish,
        Self::Des,
        Self::Camellia,
        Self::Cast5,
        Self::Seed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Aes => "aes",
            Self::Blowfish => "blowfish",
            Self::Des => "des",
            Self::Camellia => "camellia",
            Self::Cast5 => "cast5",
            Self::Seed => "seed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.name().eq_ignore_ascii_case(name))
    }

    /// 分组长度（字节）
    pub fn block_size(self) -> usize {
        match self {
            Self::Aes | Self::Camellia | Self::Seed => 16,
            Self::Blowfish | Self::Des | Self::Cast5 => 8,
        }
    }

    /// 密钥长度（字节），更长的密钥会被截断
    pub fn key_size(self) -> usize {
        match self {
            Self::Aes | Self::Camellia => 32,
            Self::Blowfish => 56,
            Self::Des => 8,
            Self::Cast5 | Self::Seed => 16,
        }
    }

    /// 当前构建是否带有该算法的实现
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Seed)
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 工作模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMode {
    Cbc,
    Cfb,
    Ofb,
    Ctr,
    Ecb,
    Gcm,
    Ccm,
}

impl CipherMode {
    pub const ALL: [CipherMode; 7] = [
        Self::Cbc,
        Self::Cfb,
        Self::Ofb,
        Self::Ctr,
        Self::Ecb,
        Self::Gcm,
        Self::Ccm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cbc => "cbc",
            Self::Cfb => "cfb",
            Self::Ofb => "ofb",
            Self::Ctr => "ctr",
            Self::Ecb => "ecb",
            Self::Gcm => "gcm",
            Self::Ccm => "ccm",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
    }

    /// 自带认证 tag 的 AEAD 模式
    pub fn is_aead(self) -> bool {
        matches!(self, Self::Gcm | Self::Ccm)
    }

    /// 该模式允许的 tag 长度；非 AEAD 模式为空
    ///
    /// GCM 的下限 12 来自 `aes-gcm` 的 tag 长度约束，更短的 GCM tag 无法互通。
    pub fn tag_sizes(self) -> &'static [usize] {
        match self {
            Self::Gcm => &[12, 13, 14, 15, 16],
            Self::Ccm => &[4, 6, 8, 10, 12, 14, 16],
            _ => &[],
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 默认 AEAD tag 长度
pub const DEFAULT_TAG_SIZE: usize = 16;

/// GCM / CCM 的 nonce 长度
pub const AEAD_NONCE_SIZE: usize = 12;

/// 当前构建可用的算法
pub fn supported_algorithms() -> Vec<CipherAlgorithm> {
    CipherAlgorithm::ALL
        .into_iter()
        .filter(|algo| algo.is_available())
        .collect()
}

/// `algorithm` 可用的模式
pub fn supported_modes(algorithm: CipherAlgorithm) -> &'static [CipherMode] {
    use CipherMode::*;

    match algorithm {
        CipherAlgorithm::Aes => &[Cbc, Cfb, Ofb, Ctr, Ecb, Gcm, Ccm],
        CipherAlgorithm::Camellia => &[Cbc, Cfb, Ofb, Ctr, Ecb],
        CipherAlgorithm::Blowfish | CipherAlgorithm::Des | CipherAlgorithm::Cast5 => {
            &[Cbc, Cfb, Ofb, Ecb]
        }
        CipherAlgorithm::Seed => &[],
    }
}

pub fn is_supported(algorithm: CipherAlgorithm, mode: CipherMode) -> bool {
    supported_modes(algorithm).contains(&mode)
}

/// 是否有可用的 AEAD 模式
pub fn is_auth_enc_available() -> bool {
    is_supported(CipherAlgorithm::Aes, CipherMode::Gcm)
        || is_supported(CipherAlgorithm::Aes, CipherMode::Ccm)
}

/// IV 长度：ECB 为 0，AEAD 为 nonce 长度，其余为分组长度
pub fn iv_size(algorithm: CipherAlgorithm, mode: CipherMode) -> usize {
    match mode {
        CipherMode::Ecb => 0,
        CipherMode::Gcm | CipherMode::Ccm => AEAD_NONCE_SIZE,
        _ => algorithm.block_size(),
    }
}
