use crate::error::{HologramError, Result};
use crate::tools::{VideoSource, probe_video};
use image::RgbImage;
use log::{debug, warn};
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

/// 逐幀解碼影片的外部協作者
///
/// 影格必須依原始順序回傳；串流結束時回傳 `Ok(None)`。
/// 實作在被 drop 時釋放影片資源。
pub trait FrameDecoder: Send {
    fn source(&self) -> &VideoSource;

    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// 透過 ffmpeg 子程序輸出 rgb24 原始影格
pub struct FfmpegDecoder {
    source: VideoSource,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_reader: Option<JoinHandle<String>>,
    frame_bytes: usize,
    decoded: u64,
    finished: bool,
}

impl FfmpegDecoder {
    /// 以 ffprobe 讀取影片資訊後啟動 ffmpeg
    pub fn open(path: &Path) -> Result<Self> {
        let source = probe_video(path)?;
        let open_error = |reason: String| HologramError::VideoOpen {
            path: path.to_path_buf(),
            reason,
        };

        let frame_bytes = source.width as usize * source.height as usize * 3;

        let mut child = build_command(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| open_error(format!("無法執行 ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| open_error("無法取得 ffmpeg 輸出".to_string()))?;
        let stderr_reader = child.stderr.take().map(spawn_stderr_reader);

        debug!(
            "開始解碼 {}: {}x{}, {:.3} fps, {:.2}s",
            path.display(),
            source.width,
            source.height,
            source.frame_rate,
            source.duration_seconds
        );

        Ok(Self {
            source,
            child,
            stdout: BufReader::with_capacity(frame_bytes.max(8192), stdout),
            stderr_reader,
            frame_bytes,
            decoded: 0,
            finished: false,
        })
    }

    fn read_frame_bytes(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.stdout.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// 串流結束：等待 ffmpeg 結束並確認結束狀態
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait().map_err(|e| HologramError::FrameDecode {
            index: self.decoded,
            reason: format!("等待 ffmpeg 結束失敗: {e}"),
        })?;
        let stderr = self
            .stderr_reader
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(HologramError::FrameDecode {
                index: self.decoded,
                reason: format!("ffmpeg 解碼失敗 ({status}): {}", stderr.trim()),
            });
        }
        Ok(())
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn source(&self) -> &VideoSource {
        &self.source
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.frame_bytes];
        let filled = self
            .read_frame_bytes(&mut buffer)
            .map_err(|e| HologramError::FrameDecode {
                index: self.decoded,
                reason: format!("讀取 ffmpeg 輸出失敗: {e}"),
            })?;

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < self.frame_bytes {
            return Err(HologramError::FrameDecode {
                index: self.decoded,
                reason: format!("影格資料不完整: {filled}/{} bytes", self.frame_bytes),
            });
        }

        let frame = RgbImage::from_raw(self.source.width, self.source.height, buffer).ok_or(
            HologramError::FrameDecode {
                index: self.decoded,
                reason: "影格尺寸與資料長度不符".to_string(),
            },
        )?;
        self.decoded += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // 提前停止（取消或錯誤）時結束 ffmpeg，避免留下殭屍程序
        if let Err(e) = self.child.kill() {
            warn!("無法結束 ffmpeg: {e}");
        }
        let _ = self.child.wait();
        if let Some(reader) = self.stderr_reader.take() {
            let _ = reader.join();
        }
    }
}

fn spawn_stderr_reader(mut stderr: impl Read + Send + 'static) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut output = String::new();
        let _ = stderr.read_to_string(&mut output);
        output
    })
}

/// 建立逐幀輸出原始 rgb24 的 ffmpeg 命令
#[must_use]
pub fn build_command(path: &Path) -> Command {
    let mut cmd = Command::new("ffmpeg");

    cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error"]);
    // 尺寸以 ffprobe 回報的編碼尺寸為準，不自動旋轉
    cmd.arg("-noautorotate");
    cmd.arg("-i").arg(path);
    cmd.args([
        "-map", "0:v:0",
        "-an", "-sn", "-dn",
        "-f", "rawvideo",
        "-pix_fmt", "rgb24",
        "pipe:1",
    ]);

    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_build_command_streams_raw_rgb() {
        let cmd = build_command(Path::new("/captures/spin.mp4"));
        let args: Vec<&OsStr> = cmd.get_args().collect();

        assert_eq!(cmd.get_program(), "ffmpeg");
        let input_pos = args.iter().position(|a| *a == "-i").unwrap();
        assert_eq!(args[input_pos + 1], "/captures/spin.mp4");
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "rgb24"));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "rawvideo"));
        assert_eq!(args.last().copied(), Some(OsStr::new("pipe:1")));
    }

    #[test]
    fn test_open_missing_file_is_video_open_error() {
        let err = FfmpegDecoder::open(Path::new("/definitely/not/here.mp4"))
            .err()
            .unwrap();
        assert!(matches!(err, HologramError::VideoOpen { .. }));
    }
}
