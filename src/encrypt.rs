//! 文件加密流程实现
//!
//! 加密流程（严格顺序）：
//! 1. 检查输入 / 输出路径与密钥
//! 2. 生成随机 salt，并通过 PBKDF2 派生加密密钥与认证密钥
//! 3. 写入与真实头部等长的占位头部
//! 4. 使用 StreamEncryptor 对文件内容进行流式加密
//! 5. 回到文件开头写入 `[salt][tag]`
//!
//! 输出先写入临时文件，全部成功后才链接为目标文件，已存在的目标不会被覆盖。

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::algorithm::CipherMode;
use crate::algorithm::block::BlockTransform;
use crate::crypto::hmac::Hmac;
use crate::crypto::kdf::{self, generate_salt};
use crate::crypto::modes::ModeCipher;
use crate::error::{CryptError, Result};
use crate::file_cipher::FileCipher;
use crate::format::header::FileHeader;
use crate::format::stream::StreamEncryptor;
use crate::fs::atomic::write_atomic;

pub(crate) fn encrypt_file(cipher: &FileCipher, input_path: &Path, output_path: &Path) -> Result<()> {
    // ---------- 检查输入 / 输出 ----------
    let input = open_input(input_path)?;
    check_output(output_path)?;

    let passphrase = cipher
        .key()
        .ok_or_else(|| CryptError::config("No key specified for encryption"))?;

    // ---------- 生成 salt，派生密钥 ----------
    let algorithm = cipher.cipher_algorithm();
    let salt = generate_salt(cipher.salt_size());
    let keys = kdf::derive_keys(
        cipher.pbkdf2_hash_algorithm(),
        passphrase,
        &salt,
        cipher.key_iteration(),
        algorithm.key_size(),
    )?;

    let transform = BlockTransform::new(algorithm, &keys.encryption)?;
    let chain = ModeCipher::new(transform, CipherMode::Cbc, &salt)?;

    let mut mac = Hmac::new(cipher.hash_algorithm(), &keys.authentication)?;
    mac.update(&salt);

    let encryptor = StreamEncryptor::new(chain, mac, cipher.chunk_size())?;

    debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        %algorithm,
        "encrypting file"
    );

    // ---------- 流式加密，最后回填头部 ----------
    let tag_size = cipher.hash_algorithm().output_size();
    write_atomic(output_path, |file: &mut File| -> Result<bool> {
        FileHeader::placeholder(salt.len(), tag_size).write(&mut *file)?;

        let mut writer = BufWriter::new(&mut *file);
        let tag = encryptor.encrypt(BufReader::new(input), &mut writer)?;
        writer.flush()?;
        drop(writer);

        file.seek(SeekFrom::Start(0))?;
        FileHeader::new(salt.clone(), tag).write(&mut *file)?;
        Ok(true)
    })?;

    info!(output = %output_path.display(), "file encrypted");
    Ok(())
}

pub(crate) fn open_input(path: &Path) -> Result<File> {
    let cannot_open = || CryptError::config(format!("I cannot open the {} file", path.display()));
    if !path.is_file() {
        return Err(cannot_open());
    }
    File::open(path).map_err(|_| cannot_open())
}

pub(crate) fn check_output(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(CryptError::config(format!(
            "The file {} already exists",
            path.display()
        )));
    }
    Ok(())
}
