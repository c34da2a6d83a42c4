use std::fs;
use std::io::Write;
use std::path::Path;

use sealcrypt::file_cipher::{BUFFER_SIZE, DEFAULT_KEY_ITERATION};
use sealcrypt::{CryptError, FileCipher};
use tempfile::tempdir;

fn file_cipher() -> FileCipher {
    let mut cipher = FileCipher::new();
    cipher.set_key(b"test").expect("set key");
    cipher.set_key_iteration(100).expect("set iterations");
    cipher
}

fn write_input(path: &Path, data: &[u8]) {
    let mut input_file = fs::File::create(path).expect("create input");
    input_file.write_all(data).expect("write plaintext");
}

fn config_message(err: CryptError) -> String {
    match err {
        CryptError::Config(message) => message,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn defaults() {
    let cipher = FileCipher::new();
    assert_eq!(BUFFER_SIZE, 1_048_576);
    assert_eq!(cipher.key_iteration(), DEFAULT_KEY_ITERATION);
    assert_eq!(cipher.cipher_algorithm().name(), "aes");
    assert_eq!(cipher.key(), None);
}

#[test]
fn encrypt_decrypt_roundtrip_across_chunk_boundaries() {
    // 覆盖：填充边界、恰好一个 chunk、chunk + 1 字节、多个 chunk。
    let temp_dir = tempdir().expect("create temp dir");
    let cipher = file_cipher();

    let sizes = [
        1,
        15,
        16,
        BUFFER_SIZE - 1,
        BUFFER_SIZE,
        BUFFER_SIZE + 1,
        2 * BUFFER_SIZE + 17,
    ];

    for size in sizes {
        let input_path = temp_dir.path().join(format!("input-{size}"));
        let encrypted_path = temp_dir.path().join(format!("encrypted-{size}"));
        let decrypted_path = temp_dir.path().join(format!("decrypted-{size}"));

        let plaintext: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        write_input(&input_path, &plaintext);

        cipher
            .encrypt(&input_path, &encrypted_path)
            .expect("encrypt file");

        // 大小不变式：明文 + salt + tag + 填充
        let encrypted_size = fs::metadata(&encrypted_path).expect("stat").len() as usize;
        assert_eq!(encrypted_size, size + 16 + 32 + (16 - size % 16), "size {size}");

        assert!(
            cipher
                .decrypt(&encrypted_path, &decrypted_path)
                .expect("decrypt file"),
            "size {size}"
        );
        let decrypted = fs::read(&decrypted_path).expect("read decrypted");
        assert_eq!(decrypted, plaintext, "size {size}");
    }
}

#[test]
fn empty_file_roundtrip() {
    // 空文件也会输出一个完整的填充分组。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("empty");
    let encrypted_path = temp_dir.path().join("empty.enc");
    let decrypted_path = temp_dir.path().join("empty.dec");
    write_input(&input_path, b"");

    let cipher = file_cipher();
    cipher
        .encrypt(&input_path, &encrypted_path)
        .expect("encrypt file");
    assert_eq!(fs::metadata(&encrypted_path).expect("stat").len(), 16 + 32 + 16);

    assert!(cipher.decrypt(&encrypted_path, &decrypted_path).expect("decrypt"));
    assert!(fs::read(&decrypted_path).expect("read").is_empty());
}

#[test]
fn decrypt_with_wrong_password_fails() {
    // 错误口令必须导致认证失败，且不产生输出文件。
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.txt");
    let encrypted_path = temp_dir.path().join("output.enc");
    let decrypted_path = temp_dir.path().join("decrypted.txt");
    write_input(&input_path, b"sealcrypt auth fail");

    file_cipher()
        .encrypt(&input_path, &encrypted_path)
        .expect("encrypt file");

    let mut wrong = file_cipher();
    wrong.set_key(b"wrong-password").expect("set key");
    let authentic = wrong
        .decrypt(&encrypted_path, &decrypted_path)
        .expect("decrypt runs");

    assert!(!authentic);
    assert!(!decrypted_path.exists());
}

#[test]
fn tampered_file_is_rejected_and_output_removed() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input.bin");
    let encrypted_path = temp_dir.path().join("input.bin.enc");
    write_input(&input_path, &vec![0x33; 5000]);

    let cipher = file_cipher();
    cipher
        .encrypt(&input_path, &encrypted_path)
        .expect("encrypt file");
    let original = fs::read(&encrypted_path).expect("read encrypted");

    // 分别篡改 salt、tag、第一个密文分组和最后一个密文分组
    for (n, position) in [0, 20, 60, original.len() - 1].into_iter().enumerate() {
        let tampered_path = temp_dir.path().join(format!("tampered-{n}"));
        let output_path = temp_dir.path().join(format!("output-{n}"));

        let mut tampered = original.clone();
        tampered[position] ^= 0x01;
        fs::write(&tampered_path, &tampered).expect("write tampered");

        assert!(
            !cipher
                .decrypt(&tampered_path, &output_path)
                .expect("decrypt runs"),
            "position {position}"
        );
        assert!(!output_path.exists(), "position {position}");
    }

    // 临时文件也必须被清理
    let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
        .expect("list dir")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn truncated_file_is_rejected() {
    let temp_dir = tempdir().expect("create temp dir");
    let short_path = temp_dir.path().join("short.enc");
    let output_path = temp_dir.path().join("short.dec");
    fs::write(&short_path, [0u8; 10]).expect("write short");

    assert!(!file_cipher().decrypt(&short_path, &output_path).expect("decrypt runs"));
    assert!(!output_path.exists());
}

#[test]
fn encrypt_without_key_fails() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input");
    write_input(&input_path, b"data");

    let err = FileCipher::new()
        .encrypt(&input_path, &temp_dir.path().join("out"))
        .expect_err("no key");
    assert_eq!(config_message(err), "No key specified for encryption");
}

#[test]
fn decrypt_without_key_fails() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input");
    write_input(&input_path, b"data");

    let err = FileCipher::new()
        .decrypt(&input_path, &temp_dir.path().join("out"))
        .expect_err("no key");
    assert_eq!(config_message(err), "No key specified for decryption");
}

#[test]
fn missing_input_file_fails() {
    let temp_dir = tempdir().expect("create temp dir");
    let missing = temp_dir.path().join("does-not-exist");
    let output = temp_dir.path().join("out");
    let expected = format!("I cannot open the {} file", missing.display());

    let err = file_cipher().encrypt(&missing, &output).expect_err("missing input");
    assert_eq!(config_message(err), expected);

    let err = file_cipher().decrypt(&missing, &output).expect_err("missing input");
    assert_eq!(config_message(err), expected);
}

#[test]
fn existing_output_file_fails() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input");
    let output_path = temp_dir.path().join("existing");
    write_input(&input_path, b"data");
    write_input(&output_path, b"keep me");
    let expected = format!("The file {} already exists", output_path.display());

    let err = file_cipher()
        .encrypt(&input_path, &output_path)
        .expect_err("existing output");
    assert_eq!(config_message(err), expected);

    let err = file_cipher()
        .decrypt(&input_path, &output_path)
        .expect_err("existing output");
    assert_eq!(config_message(err), expected);

    assert_eq!(fs::read(&output_path).expect("read"), b"keep me");
}

#[test]
fn configured_algorithm_and_hashes_roundtrip() {
    let temp_dir = tempdir().expect("create temp dir");
    let input_path = temp_dir.path().join("input");
    let encrypted_path = temp_dir.path().join("encrypted");
    let decrypted_path = temp_dir.path().join("decrypted");
    write_input(&input_path, b"camellia with sha512 tags");

    let mut cipher = file_cipher();
    cipher.set_cipher_algorithm("camellia").expect("set algorithm");
    cipher.set_hash_algorithm("sha512").expect("set hash");
    cipher.set_pbkdf2_hash_algorithm("sha1").expect("set pbkdf2 hash");

    cipher
        .encrypt(&input_path, &encrypted_path)
        .expect("encrypt file");
    assert_eq!(
        fs::metadata(&encrypted_path).expect("stat").len(),
        16 + 64 + 32
    );

    assert!(cipher.decrypt(&encrypted_path, &decrypted_path).expect("decrypt"));
    assert_eq!(
        fs::read(&decrypted_path).expect("read"),
        b"camellia with sha512 tags"
    );
}

#[test]
fn wrong_hash_algorithm_is_rejected() {
    let mut cipher = FileCipher::new();
    assert!(matches!(
        cipher.set_hash_algorithm("unknown"),
        Err(CryptError::Config(_))
    ));
    assert!(matches!(
        cipher.set_pbkdf2_hash_algorithm("unknown"),
        Err(CryptError::Config(_))
    ));
    assert!(matches!(cipher.set_key(b""), Err(CryptError::Config(_))));
}

#[test]
fn directory_input_is_rejected() {
    // 目录不是可读的输入文件。
    let temp_dir = tempdir().expect("create temp dir");
    let output = temp_dir.path().join("out");
    let expected = format!("I cannot open the {} file", temp_dir.path().display());

    let err = file_cipher()
        .encrypt(temp_dir.path(), &output)
        .expect_err("directory input");
    assert_eq!(config_message(err), expected);

    let err = file_cipher()
        .decrypt(temp_dir.path(), &output)
        .expect_err("directory input");
    assert_eq!(config_message(err), expected);
    assert!(!output.exists());
}
