use super::decoder::FrameDecoder;
use super::events::{ExtractedFrame, ExtractionEvent};
use crate::error::{HologramError, Result};
use crate::tools::{PerceptualDeduplicator, PerceptualHash, ensure_directory_exists};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use image::{ImageError, ImageFormat, RgbImage};
use log::{debug, error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

/// 單次擷取的結果統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Completed { processed: u64, retained: u64 },
    Stopped { processed: u64, retained: u64 },
}

/// 影格擷取器
///
/// 逐幀寫出影格，並以感知雜湊和「上一個保留的影格」比較，
/// 幾乎相同的影格會被丟棄。
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    deduplicator: PerceptualDeduplicator,
    extension: String,
    format: ImageFormat,
}

impl FrameExtractor {
    #[must_use]
    pub fn new(deduplicator: PerceptualDeduplicator, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.').to_lowercase();
        let (extension, format) = match ImageFormat::from_extension(&extension) {
            Some(format) => (extension, format),
            None => {
                warn!("不支援的影格格式 {extension}，改用 jpeg");
                ("jpeg".to_string(), ImageFormat::Jpeg)
            }
        };

        Self {
            deduplicator,
            extension,
            format,
        }
    }

    /// 在目前執行緒上跑完整個擷取流程
    ///
    /// 每一幀開始前檢查 `stop`；已在處理中的影格不會被中斷。
    /// 事件送不出去（接收端已離開）時視同停止。
    /// 事件依幀序號遞增送出，最後一定是 `Completed` 或 `Stopped`；
    /// 錯誤則以 `Err` 回傳，由呼叫端決定如何呈現。
    pub fn run<D: FrameDecoder + ?Sized>(
        &self,
        decoder: &mut D,
        output_dir: &Path,
        stop: &AtomicBool,
        events: &Sender<ExtractionEvent>,
    ) -> Result<ExtractionOutcome> {
        let source = decoder.source().clone();
        let total_frames = source.total_frames();
        let width = source.frame_number_width();

        ensure_directory_exists(output_dir)?;

        info!(
            "開始擷取影格: {} (預估 {} 幀)",
            source.path.display(),
            total_frames
        );

        let mut last_retained: Option<PerceptualHash> = None;
        let mut processed: u64 = 0;
        let mut retained: u64 = 0;

        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(stopped(events, processed, retained));
            }

            let Some(frame) = decoder.next_frame()? else {
                break;
            };

            let index = processed;
            let path = output_dir.join(format!("frame{index:0width$}.{}", self.extension));
            self.write_frame(&frame, &path)?;

            // 以寫出後的檔案計算雜湊，與之後匯出的內容一致
            let hash = self.deduplicator.hash_file(&path)?;
            let keep = last_retained
                .as_ref()
                .is_none_or(|last| !self.deduplicator.is_similar(last, &hash));

            processed += 1;
            let delivered = if keep {
                last_retained = Some(hash);
                retained += 1;
                debug!("保留第 {index} 幀: {}", path.display());
                events
                    .send(ExtractionEvent::FrameRetained(ExtractedFrame {
                        original_index: index,
                        path,
                        extracted_at: SystemTime::now(),
                    }))
                    .is_ok()
            } else {
                debug!("第 {index} 幀與上一個保留影格重複，捨棄");
                fs::remove_file(&path).map_err(HologramError::filesystem(&path))?;
                true
            };

            let fraction = (processed as f64 / total_frames as f64).min(1.0) as f32;
            if !delivered || events.send(ExtractionEvent::Progress(fraction)).is_err() {
                return Ok(stopped(events, processed, retained));
            }
        }

        info!("擷取完成: 處理 {processed} 幀，保留 {retained} 幀");
        if events.send(ExtractionEvent::Completed).is_err() {
            debug!("接收端已離開，略過完成事件");
        }
        Ok(ExtractionOutcome::Completed {
            processed,
            retained,
        })
    }

    /// 在背景執行緒擷取，透過事件通道回報
    ///
    /// 錯誤會以 `Failed` 事件送出；影片資源在最後一個事件送出後釋放。
    #[must_use]
    pub fn spawn<D: FrameDecoder + 'static>(
        self,
        mut decoder: D,
        output_dir: PathBuf,
    ) -> ExtractionHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = crossbeam_channel::unbounded();
        let stop_flag = Arc::clone(&stop);

        let worker = thread::spawn(move || {
            match self.run(&mut decoder, &output_dir, &stop_flag, &sender) {
                Ok(outcome) => debug!("擷取工作結束: {outcome:?}"),
                Err(e) => {
                    error!("影格擷取失敗: {e}");
                    if sender.send(ExtractionEvent::Failed(e)).is_err() {
                        debug!("接收端已離開，略過失敗事件");
                    }
                }
            }
            drop(decoder);
        });

        ExtractionHandle {
            stop,
            events: receiver,
            worker: Some(worker),
        }
    }

    fn write_frame(&self, frame: &RgbImage, path: &Path) -> Result<()> {
        frame
            .save_with_format(path, self.format)
            .map_err(|e| HologramError::filesystem(path)(image_error_to_io(e)))
    }
}

/// 停止旗標被設定，或接收端已離開（視同取消）
fn stopped(
    events: &Sender<ExtractionEvent>,
    processed: u64,
    retained: u64,
) -> ExtractionOutcome {
    info!("擷取已停止: 處理 {processed} 幀，保留 {retained} 幀");
    if events.send(ExtractionEvent::Stopped).is_err() {
        debug!("接收端已離開，略過停止事件");
    }
    ExtractionOutcome::Stopped {
        processed,
        retained,
    }
}

fn image_error_to_io(error: ImageError) -> io::Error {
    match error {
        ImageError::IoError(e) => e,
        other => io::Error::other(other),
    }
}

/// 背景擷取工作的控制代碼
///
/// drop 時會要求停止並等待執行緒結束。
pub struct ExtractionHandle {
    stop: Arc<AtomicBool>,
    events: Receiver<ExtractionEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ExtractionHandle {
    /// 要求在下一幀開始前停止
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    #[must_use]
    pub const fn events(&self) -> &Receiver<ExtractionEvent> {
        &self.events
    }

    /// 阻塞等待下一個事件；工作結束且事件取完後回傳 `None`
    #[must_use]
    pub fn recv(&self) -> Option<ExtractionEvent> {
        self.events.recv().ok()
    }

    /// 等待最多 `timeout`；逾時回傳 `Ok(None)`，工作已結束回傳 `Err`
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Option<ExtractionEvent>, RecvTimeoutError> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 等待背景執行緒結束
    pub fn join(mut self) {
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("擷取執行緒異常結束");
            }
        }
    }
}

impl Drop for ExtractionHandle {
    fn drop(&mut self) {
        self.stop();
        self.join_worker();
    }
}
