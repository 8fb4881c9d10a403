use crate::error::{HologramError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(HologramError::filesystem(path))?;
    }
    Ok(())
}

/// 在 `base` 底下建立一個全新的資料夾
///
/// 依序嘗試 `name`、`name_1`、`name_2`……，直到建立成功；
/// 已存在的資料夾一律跳過，不會覆寫。
pub fn allocate_unique_directory(base: &Path, name: &str) -> Result<PathBuf> {
    ensure_directory_exists(base)?;

    let mut counter = 0usize;
    loop {
        let candidate = if counter == 0 {
            base.join(name)
        } else {
            base.join(format!("{name}_{counter}"))
        };

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(HologramError::filesystem(&candidate)(e)),
        }
    }
}
