use crate::config::types::{Config, FileTypeTable, SETTINGS_FILE, UserSettings};
use crate::tools::MAX_HASH_SIZE;
use anyhow::{Context, Result, bail};
use log::warn;
use std::fs;
use std::path::Path;

/// 編譯時嵌入的檔案類型設定（不需要外部檔案）
const FILE_TYPE_TABLE_JSON: &str = include_str!("../data/file_type_table.json");

impl Config {
    pub fn new() -> Result<Self> {
        let settings = match Self::load_settings(Path::new(SETTINGS_FILE)) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("設定檔無法使用，改用預設值: {e:#}");
                UserSettings::default()
            }
        };
        Self::with_settings(settings)
    }

    /// 以指定設定建立，設定不合法時回傳錯誤
    pub fn with_settings(settings: UserSettings) -> Result<Self> {
        let file_type_table = Self::load_embedded_file_type_table()?;
        Self::validate_settings(&settings, &file_type_table)?;

        Ok(Self {
            file_type_table,
            settings,
        })
    }

    fn load_settings(path: &Path) -> Result<UserSettings> {
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    fn validate_settings(settings: &UserSettings, table: &FileTypeTable) -> Result<()> {
        if !table.is_image_format(&settings.frame_format) {
            bail!("不支援的影格格式: {}", settings.frame_format);
        }
        if !(1..=MAX_HASH_SIZE).contains(&settings.hash_size) {
            bail!("hash_size 必須介於 1 ~ {MAX_HASH_SIZE}: {}", settings.hash_size);
        }
        // 門檻為 0 時連完全相同的影格都不會被視為重複
        if settings.duplicate_cutoff == 0 {
            bail!("duplicate_cutoff 必須大於 0");
        }
        if settings.temp_dir.as_os_str().is_empty() || settings.output_dir.as_os_str().is_empty()
        {
            bail!("暫存與輸出資料夾不可為空");
        }
        Ok(())
    }

    /// 從編譯時嵌入的 JSON 載入檔案類型表
    fn load_embedded_file_type_table() -> Result<FileTypeTable> {
        serde_json::from_str(FILE_TYPE_TABLE_JSON).context("無法解析嵌入的檔案類型設定")
    }
}
