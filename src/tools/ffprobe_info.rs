use crate::error::{HologramError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 已開啟影片的唯讀資訊
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSource {
    pub path: PathBuf,
    pub frame_rate: f64,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoSource {
    /// 估計總幀數（幀率 × 長度，無條件捨去），至少為 1
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        let estimate = (self.frame_rate * self.duration_seconds).floor();
        if estimate.is_finite() && estimate >= 1.0 {
            estimate as u64
        } else {
            1
        }
    }

    /// 影格檔名補零的位數
    #[must_use]
    pub fn frame_number_width(&self) -> usize {
        digit_count(self.total_frames())
    }

    /// 不含副檔名的檔名，用來命名匯出資料夾
    #[must_use]
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string())
    }
}

/// 十進位位數
#[must_use]
pub fn digit_count(value: u64) -> usize {
    value.to_string().len()
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// 使用 ffprobe 取得影片資訊
pub fn probe_video(path: &Path) -> Result<VideoSource> {
    let open_error = |reason: String| HologramError::VideoOpen {
        path: path.to_path_buf(),
        reason,
    };

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| open_error(format!("無法執行 ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(open_error(format!("ffprobe 執行失敗: {}", stderr.trim())));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(path, &stdout)
}

fn parse_probe_output(path: &Path, json: &str) -> Result<VideoSource> {
    let open_error = |reason: &str| HologramError::VideoOpen {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|_| open_error("無法解析 ffprobe 輸出"))?;

    // 找到視訊串流
    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| open_error("找不到視訊串流"))?;

    let width = video_stream
        .width
        .filter(|&w| w > 0)
        .ok_or_else(|| open_error("無法取得影片寬度"))?;
    let height = video_stream
        .height
        .filter(|&h| h > 0)
        .ok_or_else(|| open_error("無法取得影片高度"))?;

    // 影片長度優先從 format 取得，其次從 stream
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| open_error("無法取得影片長度"))?;

    // 平均幀率較能反映實際解出的幀數，取不到再退回 r_frame_rate
    let frame_rate = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| open_error("無法取得影片幀率"))?;

    Ok(VideoSource {
        path: path.to_path_buf(),
        frame_rate,
        duration_seconds,
        width,
        height,
    })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        rate.parse().ok()?
    };
    (value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PROBE: &str = r#"{
        "streams": [
            { "codec_type": "audio", "duration": "4.10" },
            {
                "codec_type": "video",
                "width": 1280,
                "height": 720,
                "r_frame_rate": "30/1",
                "avg_frame_rate": "30000/1001",
                "duration": "4.000"
            }
        ],
        "format": { "duration": "4.100000" }
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let source = parse_probe_output(Path::new("/videos/spin.mp4"), SAMPLE_PROBE).unwrap();
        assert_eq!(source.width, 1280);
        assert_eq!(source.height, 720);
        assert!((source.frame_rate - 29.97).abs() < 0.01);
        assert!((source.duration_seconds - 4.1).abs() < 0.001);
        assert_eq!(source.total_frames(), 122);
        assert_eq!(source.frame_number_width(), 3);
        assert_eq!(source.base_name(), "spin");
    }

    #[test]
    fn test_parse_probe_without_video_stream() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ], "format": { "duration": "3.0" } }"#;
        let err = parse_probe_output(Path::new("/videos/song.mp4"), json).unwrap_err();
        assert!(matches!(err, HologramError::VideoOpen { .. }));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("60").unwrap() - 60.0).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("invalid").is_none());
    }

    #[test]
    fn test_total_frames_never_zero() {
        let source = VideoSource {
            path: PathBuf::from("a.mp4"),
            frame_rate: 30.0,
            duration_seconds: 0.0,
            width: 10,
            height: 10,
        };
        assert_eq!(source.total_frames(), 1);
        assert_eq!(source.frame_number_width(), 1);
    }

    #[test]
    fn test_digit_count() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(1000), 4);
    }
}
