use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// 算法、模式、密钥、salt 或参数不合法
    #[error("{0}")]
    Config(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid padding")]
    InvalidPadding,

    /// 底层密码原语拒绝了调用
    #[error("crypto backend error: {0}")]
    Platform(String),
}

impl CryptError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// tag 不匹配或填充错误：认证层统一视为校验失败
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed | Self::InvalidPadding)
    }
}

pub type Result<T> = std::result::Result<T, CryptError>;
