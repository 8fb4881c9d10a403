use crate::error::{HologramError, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// 經去重後保留的影格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFrame {
    /// 原始影片中的幀序號（從 0 開始）
    pub original_index: u64,
    pub path: PathBuf,
    pub extracted_at: SystemTime,
}

/// 擷取工作送出的事件，依原始幀序號遞增排序
///
/// 每次擷取都以 `Completed`、`Stopped`、`Failed` 其中之一結束。
#[derive(Debug)]
pub enum ExtractionEvent {
    FrameRetained(ExtractedFrame),
    /// 進度，介於 0.0 ~ 1.0
    Progress(f32),
    Completed,
    Stopped,
    Failed(HologramError),
}

impl ExtractionEvent {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed(_))
    }
}

/// 保留影格的集合，以保留順序編號 0..N-1
#[derive(Debug, Clone, Default)]
pub struct FrameCollection {
    source_name: String,
    frames: Vec<ExtractedFrame>,
}

impl FrameCollection {
    #[must_use]
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            frames: Vec::new(),
        }
    }

    /// 加入影格；原始幀序號必須嚴格遞增
    pub fn push(&mut self, frame: ExtractedFrame) -> Result<()> {
        if let Some(last) = self.frames.last().filter(|last| frame.original_index <= last.original_index) {
            return Err(HologramError::FrameDecode {
                index: frame.original_index,
                reason: format!("影格順序錯誤，上一個保留的是第 {} 幀", last.original_index),
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// 來源影片的檔名（不含副檔名）
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ExtractedFrame> {
        self.frames.get(index)
    }

    #[must_use]
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.frames.get(index).map(|f| f.path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedFrame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> ExtractedFrame {
        ExtractedFrame {
            original_index: index,
            path: PathBuf::from(format!("_tempFrames/frame{index:03}.jpeg")),
            extracted_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_push_keeps_retention_order() {
        let mut frames = FrameCollection::new("spin");
        frames.push(frame(0)).unwrap();
        frames.push(frame(4)).unwrap();
        frames.push(frame(9)).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames.source_name(), "spin");
        assert_eq!(frames.get(1).unwrap().original_index, 4);
        assert_eq!(
            frames.path(2).unwrap(),
            Path::new("_tempFrames/frame009.jpeg")
        );
        assert!(frames.get(3).is_none());
    }

    #[test]
    fn test_push_rejects_non_increasing_index() {
        let mut frames = FrameCollection::new("spin");
        frames.push(frame(5)).unwrap();
        assert!(frames.push(frame(5)).is_err());
        assert!(frames.push(frame(2)).is_err());
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_terminal_events() {
        assert!(ExtractionEvent::Completed.is_terminal());
        assert!(ExtractionEvent::Stopped.is_terminal());
        assert!(!ExtractionEvent::Progress(0.5).is_terminal());
        assert!(!ExtractionEvent::FrameRetained(frame(0)).is_terminal());
    }
}
