//! 加密文件头
//!
//! 文件格式：
//!
//! ```text
//! [salt][HMAC tag][ciphertext chunks ...]
//! ```
//!
//! - salt 长度 = 分组大小（CBC 的 IV 长度），同时用作 KDF salt
//! - tag 长度 = HMAC 哈希输出长度
//!
//! 头部没有 magic、版本号或长度前缀：两端必须使用相同的算法与哈希配置。
//! tag 要在整个密文写完后才能得到，所以加密时先写入占位头部，
//! 结束后再回到文件开头覆盖。

use std::io::{self, Read, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub salt: Vec<u8>,
    pub tag: Vec<u8>,
}

impl FileHeader {
    pub fn new(salt: Vec<u8>, tag: Vec<u8>) -> Self {
        Self { salt, tag }
    }

    /// 与真实头部等长的全零占位
    pub fn placeholder(salt_size: usize, tag_size: usize) -> Self {
        Self {
            salt: vec![0u8; salt_size],
            tag: vec![0u8; tag_size],
        }
    }

    pub fn len(&self) -> usize {
        self.salt.len() + self.tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.salt)?;
        writer.write_all(&self.tag)?;
        Ok(())
    }

    /// 读取头部
    ///
    /// 文件过短时返回 `Ok(None)`：这样的文件不可能通过认证。
    pub fn read<R: Read>(
        mut reader: R,
        salt_size: usize,
        tag_size: usize,
    ) -> io::Result<Option<Self>> {
        let mut salt = vec![0u8; salt_size];
        let mut tag = vec![0u8; tag_size];

        for buf in [&mut salt, &mut tag] {
            if let Err(e) = reader.read_exact(buf) {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    return Ok(None);
                }
                return Err(e);
            }
        }

        Ok(Some(Self { salt, tag }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let header = FileHeader::new(vec![1; 16], vec![2; 32]);
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 48);

        let parsed = FileHeader::read(&bytes[..], 16, 32).unwrap();
        assert_eq!(parsed, Some(header));
    }

    #[test]
    fn truncated_header_is_none() {
        let bytes = [0u8; 20];
        assert_eq!(FileHeader::read(&bytes[..], 16, 32).unwrap(), None);
    }

    #[test]
    fn placeholder_matches_real_length() {
        let placeholder = FileHeader::placeholder(8, 20);
        assert_eq!(placeholder.len(), 28);
        assert!(placeholder.salt.iter().all(|&b| b == 0));
    }
}
