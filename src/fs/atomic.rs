//! 原子写入工具。
//!
//! 提供「先写临时文件，确认成功后再改名为目标文件」的写出语义：
//! - 写入失败或校验失败时，目标路径上不会出现任何文件
//! - 临时文件在所有失败路径上都会被删除

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 原子写文件。
///
/// 流程：
/// 1. 在目标目录创建临时文件；
/// 2. 调用 `write_fn` 写入完整内容；
/// 3. `write_fn` 返回 `Ok(true)` 时落盘并链接为目标文件（目标已存在则报错，不覆盖）；
///    返回 `Ok(false)` 或 `Err` 时删除临时文件。
pub fn write_atomic<F, E>(target: &Path, write_fn: F) -> Result<bool, E>
where
    F: FnOnce(&mut File) -> Result<bool, E>,
    E: From<io::Error>,
{
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp_path = build_tmp_path(parent, target.file_name());
    let mut tmp_file = File::create(&tmp_path)?;

    match write_fn(&mut tmp_file) {
        Ok(true) => {}
        Ok(false) => {
            drop(tmp_file);
            let _ = fs::remove_file(&tmp_path);
            return Ok(false);
        }
        Err(err) => {
            drop(tmp_file);
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
    }

    // hard_link 不会覆盖已存在的目标：目标在此期间出现时返回 AlreadyExists
    let committed = tmp_file
        .sync_all()
        .and_then(|()| fs::hard_link(&tmp_path, target));
    drop(tmp_file);
    let _ = fs::remove_file(&tmp_path);
    committed?;

    Ok(true)
}

fn build_tmp_path(parent: &Path, file_name: Option<&std::ffi::OsStr>) -> PathBuf {
    let base_name = file_name
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("sealcrypt-output");

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    parent.join(format!(
        ".{base_name}.tmp-{}-{timestamp}-{counter}",
        std::process::id()
    ))
}
