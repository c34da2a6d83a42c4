//! sealcrypt 命令行入口
//!
//! 用法：
//!   sealcrypt encrypt-file <input> <output>
//!   sealcrypt decrypt-file <input> <output>
//!   sealcrypt encrypt <text>
//!   sealcrypt decrypt <envelope>
//!   sealcrypt hmac <data> --key <key> [--algorithm sha256]
//!   sealcrypt hash-password
//!   sealcrypt verify-password <hash>
//!
//! 口令通过 `--key` 传入，缺省时交互式输入（不回显）。
//! `--config` 指定 TOML 配置文件，字段见 `CipherOptions`。
//! 所有实际逻辑都委托给库。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use sealcrypt::crypto::hmac;
use sealcrypt::{BlockCipher, CipherOptions, FileCipher, HashAlgorithm, PasswordHasher};

#[derive(Parser, Debug)]
#[command(name = "sealcrypt", version, about = "Authenticated symmetric encryption")]
struct Cli {
    /// TOML file with cipher options
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Passphrase or key (prompted when omitted)
    #[arg(long, short = 'k', global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file
    EncryptFile { input: PathBuf, output: PathBuf },

    /// Decrypt a file; fails if authentication does not pass
    DecryptFile { input: PathBuf, output: PathBuf },

    /// Encrypt a string, printing the base64 envelope
    Encrypt { data: String },

    /// Decrypt a base64 envelope
    Decrypt { envelope: String },

    /// Print the hex HMAC of a string
    Hmac {
        data: String,
        #[arg(long, short = 'a', default_value = "sha256")]
        algorithm: String,
    },

    /// Hash a password with Argon2id
    HashPassword,

    /// Verify a password against an Argon2id PHC string
    VerifyPassword { hash: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Commands::EncryptFile { input, output } => {
            let mut cipher = FileCipher::new();
            cipher.set_options(&options)?;
            let key = passphrase(cli.key, &options)?;
            cipher.set_key(key.as_bytes())?;

            cipher
                .encrypt(&input, &output)
                .with_context(|| format!("encrypting {}", input.display()))?;
        }
        Commands::DecryptFile { input, output } => {
            let mut cipher = FileCipher::new();
            cipher.set_options(&options)?;
            let key = passphrase(cli.key, &options)?;
            cipher.set_key(key.as_bytes())?;

            let authentic = cipher
                .decrypt(&input, &output)
                .with_context(|| format!("decrypting {}", input.display()))?;
            if !authentic {
                bail!("authentication failed for {}", input.display());
            }
        }
        Commands::Encrypt { data } => {
            let mut cipher = block_cipher(&options)?;
            let key = passphrase(cli.key, &options)?;
            cipher.set_key(key.as_bytes())?;

            let envelope = cipher.encrypt(data.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&envelope));
        }
        Commands::Decrypt { envelope } => {
            let mut cipher = block_cipher(&options)?;
            let key = passphrase(cli.key, &options)?;
            cipher.set_key(key.as_bytes())?;

            let Some(plaintext) = cipher.decrypt(envelope.trim().as_bytes())? else {
                bail!("authentication failed");
            };
            println!("{}", String::from_utf8_lossy(&plaintext));
        }
        Commands::Hmac { data, algorithm } => {
            let algorithm = HashAlgorithm::parse(&algorithm)?;
            let key = passphrase(cli.key, &options)?;
            println!("{}", hmac::compute_hex(key.as_bytes(), algorithm, data.as_bytes())?);
        }
        Commands::HashPassword => {
            let password = passphrase(cli.key, &CipherOptions::default())?;
            println!("{}", PasswordHasher::new().create(password.as_bytes())?);
        }
        Commands::VerifyPassword { hash } => {
            let password = passphrase(cli.key, &CipherOptions::default())?;
            if !PasswordHasher::new().verify(password.as_bytes(), &hash)? {
                bail!("password does not match");
            }
            println!("ok");
        }
    }

    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<CipherOptions> {
    match path {
        Some(path) => CipherOptions::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(CipherOptions::default()),
    }
}

/// `BlockCipher` 始终输出 base64，命令行只处理文本
fn block_cipher(options: &CipherOptions) -> Result<BlockCipher> {
    let options = CipherOptions {
        key: None,
        binary_output: Some(false),
        ..options.clone()
    };
    Ok(BlockCipher::factory("rustcrypto", &options)?)
}

/// 口令优先级：`--key` > 配置文件 > 交互输入
fn passphrase(flag: Option<String>, options: &CipherOptions) -> Result<Zeroizing<String>> {
    if let Some(key) = flag.or_else(|| options.key.clone()) {
        return Ok(Zeroizing::new(key));
    }

    let key = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    if key.is_empty() {
        bail!("The key cannot be empty");
    }
    Ok(Zeroizing::new(key))
}
