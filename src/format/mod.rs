//! 加密文件格式：文件头与分块数据流

pub mod header;
pub mod stream;
