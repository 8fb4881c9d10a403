use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 核心流程（擷取、比對、匯出）的錯誤種類
///
/// 核心模組一律回傳此型別，不在內部吞掉任何錯誤；
/// 取消擷取屬於正常結束，不會產生錯誤。
#[derive(Debug, Error)]
pub enum HologramError {
    /// 影片無法開啟或格式不支援，整個擷取作業無法開始
    #[error("無法開啟影片 {}: {reason}", path.display())]
    VideoOpen { path: PathBuf, reason: String },

    /// 解碼器在串流途中失敗
    #[error("第 {index} 幀解碼失敗: {reason}")]
    FrameDecode { index: u64, reason: String },

    /// 影格圖檔無法讀取或解碼（感知雜湊比對時）
    #[error("無法解碼圖片 {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("檔案操作失敗 {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 範圍或方向設定無效，在任何磁碟寫入前就拒絕
    #[error("選取範圍無效: {0}")]
    InvalidSelection(String),
}

impl HologramError {
    /// 給 `map_err` 使用，把 `io::Error` 附上發生的路徑
    pub(crate) fn filesystem(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection(message.into())
    }

    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::FrameDecode { .. } | Self::ImageDecode { .. })
    }
}

pub type Result<T> = std::result::Result<T, HologramError>;
