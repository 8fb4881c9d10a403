use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::tools::{DEFAULT_DUPLICATE_CUTOFF, DEFAULT_HASH_SIZE};

/// 使用者設定檔名（位於目前工作目錄）
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeTable {
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
    #[serde(rename = "IMAGE_FILE")]
    pub image_file: Vec<String>,
}

impl FileTypeTable {
    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_file
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect()
    }

    /// 是否為可匯入的影片容器（mp4 / avi / mkv / mov）
    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&format!(".{}", ext.to_lowercase())))
    }

    /// 影格格式名稱（不含點）是否為支援的圖片格式
    #[must_use]
    pub fn is_image_format(&self, format: &str) -> bool {
        let wanted = format!(".{}", format.trim_start_matches('.').to_lowercase());
        self.image_file
            .iter()
            .any(|ext| ext.to_lowercase() == wanted)
    }
}

/// 旋轉方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    /// 環狀走訪的步進值
    #[must_use]
    pub const fn step(self) -> i64 {
        match self {
            Self::Clockwise => 1,
            Self::CounterClockwise => -1,
        }
    }
}

impl fmt::Display for RotationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clockwise => write!(f, "順時針"),
            Self::CounterClockwise => write!(f, "逆時針"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// 擷取影格的暫存資料夾，每次匯入都會清空
    pub temp_dir: PathBuf,
    /// 匯出的根目錄
    pub output_dir: PathBuf,
    /// 暫存影格格式（有損格式即可）
    pub frame_format: String,
    pub hash_size: u32,
    pub duplicate_cutoff: u32,
    pub default_padding: usize,
    pub default_direction: RotationDirection,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("_tempFrames"),
            output_dir: PathBuf::from("Converted Holograms"),
            frame_format: "jpeg".to_string(),
            hash_size: DEFAULT_HASH_SIZE,
            duplicate_cutoff: DEFAULT_DUPLICATE_CUTOFF,
            default_padding: 0,
            default_direction: RotationDirection::Clockwise,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file_type_table: FileTypeTable,
    pub settings: UserSettings,
}
