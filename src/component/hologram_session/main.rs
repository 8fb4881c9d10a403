use super::temp_frames::TempFrameDir;
use crate::component::frame_extractor::{
    ExtractionEvent, ExtractionHandle, FfmpegDecoder, FrameCollection, FrameDecoder,
    FrameExtractor,
};
use crate::component::hologram_exporter::{
    ExportJob, HologramExporter, RangeHandle, RangeSelection,
};
use crate::config::{Config, FileTypeTable, RotationDirection};
use crate::error::{HologramError, Result};
use crate::tools::PerceptualDeduplicator;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 一次「匯入 → 選取 → 轉換」的工作階段
///
/// 同一時間只會有一個擷取工作；重新匯入會先停止前一個工作、
/// 丟棄已保留的影格並清空暫存資料夾。
/// 背景工作回報的事件只在呼叫 `next_event` 的執行緒上套用。
pub struct HologramSession {
    file_type_table: FileTypeTable,
    deduplicator: PerceptualDeduplicator,
    frame_format: String,
    exporter: HologramExporter,
    frames: FrameCollection,
    selection: RangeSelection,
    padding: usize,
    default_padding: usize,
    default_direction: RotationDirection,
    /// 下一次匯入使用的暫存資料夾
    next_temp_dir: PathBuf,
    // 欄位依宣告順序 drop：先停止並等待工作結束，再移除暫存資料夾
    import: Option<ExtractionHandle>,
    temp_frames: TempFrameDir,
}

impl HologramSession {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let settings = &config.settings;
        Self {
            file_type_table: config.file_type_table.clone(),
            deduplicator: PerceptualDeduplicator::with_settings(
                settings.hash_size,
                settings.duplicate_cutoff,
            ),
            frame_format: settings.frame_format.clone(),
            exporter: HologramExporter::new(&settings.output_dir),
            frames: FrameCollection::default(),
            selection: RangeSelection::new(0, 0, settings.default_direction),
            padding: settings.default_padding,
            default_padding: settings.default_padding,
            default_direction: settings.default_direction,
            next_temp_dir: settings.temp_dir.clone(),
            import: None,
            temp_frames: TempFrameDir::new(&settings.temp_dir),
        }
    }

    /// 套用新的設定，不影響已匯入的影格
    ///
    /// 去重門檻、影格格式與暫存資料夾從下一次匯入開始生效；
    /// 預設補幀與方向有變動時直接套用到目前的選取。
    pub fn apply_settings(&mut self, config: &Config) {
        let settings = &config.settings;
        self.file_type_table = config.file_type_table.clone();
        self.deduplicator =
            PerceptualDeduplicator::with_settings(settings.hash_size, settings.duplicate_cutoff);
        self.frame_format.clone_from(&settings.frame_format);
        self.exporter = HologramExporter::new(&settings.output_dir);
        self.next_temp_dir.clone_from(&settings.temp_dir);

        if settings.default_padding != self.default_padding {
            self.default_padding = settings.default_padding;
            self.padding = settings.default_padding;
        }
        if settings.default_direction != self.default_direction {
            self.default_direction = settings.default_direction;
            self.selection.direction = Some(settings.default_direction);
        }
        info!("已套用新設定");
    }

    /// 以 ffmpeg 開啟影片並開始擷取
    pub fn start_import(&mut self, path: &Path) -> Result<()> {
        self.reset()?;

        if !self.file_type_table.is_video_file(path) {
            return Err(HologramError::VideoOpen {
                path: path.to_path_buf(),
                reason: "不支援的影片格式".to_string(),
            });
        }

        let decoder = FfmpegDecoder::open(path)?;
        self.start_import_with(decoder)
    }

    /// 以指定的解碼器開始擷取
    pub fn start_import_with<D: FrameDecoder + 'static>(&mut self, decoder: D) -> Result<()> {
        self.reset()?;
        if self.temp_frames.path() != self.next_temp_dir.as_path() {
            self.temp_frames = TempFrameDir::new(&self.next_temp_dir);
        }

        let temp_dir = self.temp_frames.recreate()?.to_path_buf();
        let source_name = decoder.source().base_name();
        info!("匯入影片: {}", decoder.source().path.display());

        self.frames = FrameCollection::new(source_name);
        let extractor = FrameExtractor::new(self.deduplicator.clone(), &self.frame_format);
        self.import = Some(extractor.spawn(decoder, temp_dir));
        Ok(())
    }

    /// 要求停止擷取；之後仍需取出事件直到收到 `Stopped`
    pub fn stop_import(&self) {
        if let Some(handle) = &self.import {
            handle.stop();
        }
    }

    #[must_use]
    pub const fn is_importing(&self) -> bool {
        self.import.is_some()
    }

    /// 阻塞等待下一個擷取事件並套用到工作階段
    ///
    /// 沒有進行中的擷取時回傳 `None`。
    pub fn next_event(&mut self) -> Option<ExtractionEvent> {
        let event = self.import.as_ref()?.recv();
        self.apply(event)
    }

    /// 與 `next_event` 相同，但最多等待 `timeout`；逾時回傳 `None`
    pub fn next_event_timeout(&mut self, timeout: Duration) -> Option<ExtractionEvent> {
        let received = self.import.as_ref()?.recv_timeout(timeout);
        match received {
            Ok(None) => None,
            Ok(Some(event)) => self.apply(Some(event)),
            Err(_) => self.apply(None),
        }
    }

    /// 持續取出事件直到擷取結束，回傳結束事件
    pub fn wait_import(&mut self) -> Option<ExtractionEvent> {
        while self.is_importing() {
            if let Some(event) = self.next_event().filter(ExtractionEvent::is_terminal) {
                return Some(event);
            }
        }
        None
    }

    fn apply(&mut self, event: Option<ExtractionEvent>) -> Option<ExtractionEvent> {
        let Some(event) = event else {
            // 工作沒有送出結束事件就離開了
            warn!("擷取工作意外結束");
            self.import = None;
            return None;
        };

        match &event {
            ExtractionEvent::FrameRetained(frame) => {
                if let Err(e) = self.frames.push(frame.clone()) {
                    return Some(self.fail(e));
                }
            }
            ExtractionEvent::Progress(_) => {}
            ExtractionEvent::Completed | ExtractionEvent::Stopped => {
                self.import = None;
                let direction = self.selection.direction.unwrap_or_default();
                self.selection = RangeSelection {
                    loop_around: self.selection.loop_around,
                    ..RangeSelection::full(self.frames.len(), direction)
                };
                info!("已保留 {} 個影格", self.frames.len());
            }
            ExtractionEvent::Failed(_) => {
                self.import = None;
                self.discard_frames();
            }
        }
        Some(event)
    }

    /// 影格集合出錯時中止擷取並回報 `Failed`
    fn fail(&mut self, error: HologramError) -> ExtractionEvent {
        self.import = None;
        self.discard_frames();
        ExtractionEvent::Failed(error)
    }

    fn discard_frames(&mut self) {
        self.frames = FrameCollection::default();
        self.selection = RangeSelection {
            start: 0,
            end: 0,
            ..self.selection
        };
        if let Err(e) = self.temp_frames.clear() {
            warn!("{e}");
        }
    }

    /// 停止進行中的擷取並清除所有影格
    fn reset(&mut self) -> Result<()> {
        if let Some(handle) = self.import.take() {
            handle.stop();
            handle.join();
        }
        self.frames = FrameCollection::default();
        self.selection = RangeSelection {
            start: 0,
            end: 0,
            ..self.selection
        };
        self.temp_frames.clear()
    }

    pub fn set_range(&mut self, start: usize, end: usize) -> Result<()> {
        let count = self.frames.len();
        if count == 0 {
            return Err(HologramError::invalid_selection("尚未匯入任何影格"));
        }
        if start >= count || end >= count {
            return Err(HologramError::invalid_selection(format!(
                "範圍 {start}..={end} 超出 0..={}",
                count - 1
            )));
        }
        self.selection.start = start;
        self.selection.end = end;
        Ok(())
    }

    pub fn set_direction(&mut self, direction: RotationDirection) {
        self.selection.direction = Some(direction);
    }

    pub fn set_loop_around(&mut self, loop_around: bool) {
        self.selection.loop_around = loop_around;
    }

    pub fn set_padding(&mut self, padding: usize) {
        self.padding = padding;
    }

    /// 將起點或終點移動 `delta` 格（限制在影格範圍內），回傳新位置
    pub fn step_handle(&mut self, handle: RangeHandle, delta: i64) -> Result<usize> {
        let count = self.frames.len();
        if count == 0 {
            return Err(HologramError::invalid_selection("尚未匯入任何影格"));
        }

        let current = self.selection.index(handle) as i64;
        let max = (count - 1) as i64;
        let moved = current.saturating_add(delta).clamp(0, max) as usize;

        match handle {
            RangeHandle::Start => self.selection.start = moved,
            RangeHandle::End => self.selection.end = moved,
        }
        Ok(moved)
    }

    /// 依目前的選取匯出
    pub fn convert(&self) -> Result<ExportJob> {
        if self.is_importing() {
            return Err(HologramError::invalid_selection("影格擷取尚未結束"));
        }
        self.exporter
            .export(&self.frames, &self.selection, self.padding)
    }

    #[must_use]
    pub const fn selection(&self) -> &RangeSelection {
        &self.selection
    }

    #[must_use]
    pub const fn padding(&self) -> usize {
        self.padding
    }

    #[must_use]
    pub const fn frames(&self) -> &FrameCollection {
        &self.frames
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        self.temp_frames.path()
    }
}
