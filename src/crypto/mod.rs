//! 密码学基础模块：分组工作模式、AEAD、HMAC 与密钥派生。

pub mod aead;
pub mod hmac;
pub mod kdf;
pub mod modes;
