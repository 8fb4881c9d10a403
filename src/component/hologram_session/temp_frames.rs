use crate::error::{HologramError, Result};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 暫存影格資料夾
///
/// 每次匯入前清空重建；物件被 drop 時整個資料夾一併移除。
#[derive(Debug)]
pub struct TempFrameDir {
    path: PathBuf,
}

impl TempFrameDir {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 清空並重新建立資料夾
    pub fn recreate(&self) -> Result<&Path> {
        self.clear()?;
        fs::create_dir_all(&self.path).map_err(HologramError::filesystem(&self.path))?;
        Ok(&self.path)
    }

    /// 移除資料夾，不存在時視為成功
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!("已清除暫存資料夾 {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HologramError::filesystem(&self.path)(e)),
        }
    }
}

impl Drop for TempFrameDir {
    fn drop(&mut self) {
        if let Err(e) = self.clear() {
            warn!("無法清除暫存資料夾: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recreate_empties_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempFrameDir::new(dir.path().join("_tempFrames"));

        temp.recreate().unwrap();
        fs::write(temp.path().join("frame0.jpeg"), b"stale").unwrap();

        temp.recreate().unwrap();
        assert!(temp.path().is_dir());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_removes_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_tempFrames");
        {
            let temp = TempFrameDir::new(&path);
            temp.recreate().unwrap();
            fs::write(path.join("frame0.jpeg"), b"data").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempFrameDir::new(dir.path().join("never-created"));
        assert!(temp.clear().is_ok());
    }
}
