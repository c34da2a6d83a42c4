//! 文件解密流程实现
//!
//! 解密流程（严格顺序）：
//! 1. 检查输入 / 输出路径与密钥
//! 2. 读取头部中的 salt 与 tag
//! 3. 使用 salt + 口令派生加密密钥与认证密钥
//! 4. 使用 StreamDecryptor 流式解密，同时累积 HMAC
//! 5. 整个文件处理完后比较 HMAC
//!
//! 注意：
//! - 认证失败时返回 `Ok(false)`，目标文件不会出现
//! - 明文先写入临时文件，认证通过后才链接为目标文件

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::algorithm::CipherMode;
use crate::algorithm::block::BlockTransform;
use crate::crypto::hmac::Hmac;
use crate::crypto::kdf;
use crate::crypto::modes::ModeCipher;
use crate::encrypt::{check_output, open_input};
use crate::error::{CryptError, Result};
use crate::file_cipher::FileCipher;
use crate::format::header::FileHeader;
use crate::format::stream::StreamDecryptor;
use crate::fs::atomic::write_atomic;

pub(crate) fn decrypt_file(cipher: &FileCipher, input_path: &Path, output_path: &Path) -> Result<bool> {
    // ---------- 检查输入 / 输出 ----------
    let input = open_input(input_path)?;
    check_output(output_path)?;

    let passphrase = cipher
        .key()
        .ok_or_else(|| CryptError::config("No key specified for decryption"))?;

    // ---------- 读取头部 ----------
    let mut reader = BufReader::new(input);
    let tag_size = cipher.hash_algorithm().output_size();
    let Some(header) = FileHeader::read(&mut reader, cipher.salt_size(), tag_size)? else {
        warn!(input = %input_path.display(), "file too short to be authenticated");
        return Ok(false);
    };

    // ---------- 派生密钥 ----------
    let algorithm = cipher.cipher_algorithm();
    let keys = kdf::derive_keys(
        cipher.pbkdf2_hash_algorithm(),
        passphrase,
        &header.salt,
        cipher.key_iteration(),
        algorithm.key_size(),
    )?;

    let transform = BlockTransform::new(algorithm, &keys.encryption)?;
    let chain = ModeCipher::new(transform, CipherMode::Cbc, &header.salt)?;

    let mut mac = Hmac::new(cipher.hash_algorithm(), &keys.authentication)?;
    mac.update(&header.salt);

    let decryptor = StreamDecryptor::new(chain, mac, cipher.chunk_size())?;

    debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        %algorithm,
        "decrypting file"
    );

    // ---------- 流式解密，认证通过才落盘 ----------
    let authentic = write_atomic(output_path, |file: &mut File| -> Result<bool> {
        let mut writer = BufWriter::new(file);
        let authentic = decryptor.decrypt(&mut reader, &mut writer, &header.tag)?;
        writer.flush()?;
        Ok(authentic)
    })?;

    if authentic {
        info!(output = %output_path.display(), "file decrypted");
    } else {
        warn!(input = %input_path.display(), "authentication failed");
    }
    Ok(authentic)
}
