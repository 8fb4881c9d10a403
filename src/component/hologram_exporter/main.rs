use super::selection::RangeSelection;
use crate::component::frame_extractor::FrameCollection;
use crate::error::{HologramError, Result};
use crate::tools::{allocate_unique_directory, digit_count};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// 輸出資料夾名稱後綴
pub const HOLOGRAM_SUFFIX: &str = "_hologram";

const FALLBACK_EXTENSION: &str = "jpeg";

/// 單一檔案的複製任務
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    /// 輸出序號
    pub sequence: usize,
    /// 集合中的影格位置
    pub frame_index: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// 一次匯出的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub output_dir: PathBuf,
    pub padding: usize,
    /// 檔名序號的位數
    pub digits: usize,
    pub total_frames: usize,
}

/// 將選取的弧線匯出為依序編號的影格資料夾
#[derive(Debug, Clone)]
pub struct HologramExporter {
    output_base: PathBuf,
}

impl HologramExporter {
    #[must_use]
    pub fn new(output_base: impl Into<PathBuf>) -> Self {
        Self {
            output_base: output_base.into(),
        }
    }

    #[must_use]
    pub fn output_base(&self) -> &Path {
        &self.output_base
    }

    /// 匯出：前段補幀 → 弧線影格 → 後段補幀
    ///
    /// 選取不合法時在建立任何資料夾之前就回傳錯誤；
    /// 任何一個檔案複製失敗都會移除整個輸出資料夾。
    pub fn export(
        &self,
        frames: &FrameCollection,
        selection: &RangeSelection,
        padding: usize,
    ) -> Result<ExportJob> {
        let order = plan_order(frames.len(), selection, padding)?;
        let total_frames = order.len();
        let digits = digit_count(total_frames as u64);

        let folder_name = format!("{}{HOLOGRAM_SUFFIX}", frames.source_name());
        let output_dir = allocate_unique_directory(&self.output_base, &folder_name)?;

        info!(
            "匯出全像影格: {} 幀 (補幀 {padding}) → {}",
            total_frames,
            output_dir.display()
        );

        let tasks = match create_copy_tasks(frames, &order, &output_dir, digits) {
            Ok(tasks) => tasks,
            Err(e) => {
                discard_output(&output_dir);
                return Err(e);
            }
        };

        if let Err(e) = run_copy_tasks(&tasks) {
            discard_output(&output_dir);
            return Err(e);
        }

        Ok(ExportJob {
            output_dir,
            padding,
            digits,
            total_frames,
        })
    }
}

/// 計算輸出順序（集合中的影格位置）
///
/// `padding` 份起點影格、弧線走訪、`padding` 份終點影格；
/// 起點與終點已套用循環交換。
pub fn plan_order(
    frame_count: usize,
    selection: &RangeSelection,
    padding: usize,
) -> Result<Vec<usize>> {
    let traversal = selection.traversal(frame_count)?;
    let (start, end) = selection.endpoints();

    let mut order = Vec::with_capacity(padding * 2 + traversal.len());
    order.extend(std::iter::repeat_n(start, padding));
    order.extend(traversal.iter());
    order.extend(std::iter::repeat_n(end, padding));

    if order.is_empty() {
        return Err(HologramError::invalid_selection("選取範圍沒有任何影格"));
    }
    Ok(order)
}

/// 建立複製任務列表，副檔名沿用來源影格
pub fn create_copy_tasks(
    frames: &FrameCollection,
    order: &[usize],
    output_dir: &Path,
    digits: usize,
) -> Result<Vec<CopyTask>> {
    order
        .iter()
        .enumerate()
        .map(|(sequence, &frame_index)| {
            let source = frames.path(frame_index).ok_or_else(|| {
                HologramError::invalid_selection(format!("影格 {frame_index} 不存在"))
            })?;
            let extension = source
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or(FALLBACK_EXTENSION);

            Ok(CopyTask {
                sequence,
                frame_index,
                source: source.to_path_buf(),
                destination: output_dir.join(format!("frame{sequence:0digits$}.{extension}")),
            })
        })
        .collect()
}

/// 平行複製，回傳第一個遇到的錯誤
fn run_copy_tasks(tasks: &[CopyTask]) -> Result<()> {
    tasks.par_iter().try_for_each(|task| {
        fs::copy(&task.source, &task.destination)
            .map_err(HologramError::filesystem(&task.source))?;
        debug!(
            "[{}] 影格 {} → {}",
            task.sequence,
            task.frame_index,
            task.destination.display()
        );
        Ok(())
    })
}

fn discard_output(output_dir: &Path) {
    if let Err(e) = fs::remove_dir_all(output_dir) {
        warn!("無法移除未完成的輸出資料夾 {}: {e}", output_dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::frame_extractor::ExtractedFrame;
    use crate::config::RotationDirection;
    use std::time::SystemTime;

    fn collection_in(dir: &Path, count: usize) -> FrameCollection {
        let mut frames = FrameCollection::new("spin");
        for i in 0..count {
            let path = dir.join(format!("frame{i:02}.jpeg"));
            fs::write(&path, format!("frame-{i}")).unwrap();
            frames
                .push(ExtractedFrame {
                    original_index: i as u64 * 3,
                    path,
                    extracted_at: SystemTime::now(),
                })
                .unwrap();
        }
        frames
    }

    #[test]
    fn test_plan_order_with_padding() {
        let mut selection = RangeSelection::new(2, 4, RotationDirection::Clockwise);
        assert_eq!(
            plan_order(6, &selection, 2).unwrap(),
            vec![2, 2, 2, 3, 4, 4, 4]
        );

        selection.loop_around = true;
        // 交換後起點為 4、終點為 2
        assert_eq!(
            plan_order(6, &selection, 1).unwrap(),
            vec![4, 4, 5, 0, 1, 2, 2]
        );
    }

    #[test]
    fn test_plan_order_counter_clockwise() {
        let selection = RangeSelection::new(1, 3, RotationDirection::CounterClockwise);
        assert_eq!(plan_order(5, &selection, 1).unwrap(), vec![1, 3, 2, 1, 3]);
    }

    #[test]
    fn test_plan_order_rejects_empty_export() {
        // 終點緊接在起點之前時走訪為空
        let selection = RangeSelection::new(3, 2, RotationDirection::Clockwise);
        assert!(matches!(
            plan_order(6, &selection, 0),
            Err(HologramError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_export_numbers_files_sequentially() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let frames = collection_in(source.path(), 5);

        let exporter = HologramExporter::new(output.path());
        let selection = RangeSelection::new(1, 3, RotationDirection::Clockwise);
        let job = exporter.export(&frames, &selection, 2).unwrap();

        assert_eq!(job.output_dir, output.path().join("spin_hologram"));
        assert_eq!(job.total_frames, 7);
        assert_eq!(job.digits, 1);

        let expected = ["1", "1", "1", "2", "3", "3", "3"];
        for (seq, frame) in expected.iter().enumerate() {
            let content = fs::read_to_string(job.output_dir.join(format!("frame{seq}.jpeg")))
                .unwrap();
            assert_eq!(content, format!("frame-{frame}"));
        }
        assert_eq!(fs::read_dir(&job.output_dir).unwrap().count(), 7);
    }

    #[test]
    fn test_export_never_overwrites() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let frames = collection_in(source.path(), 3);
        let exporter = HologramExporter::new(output.path());
        let selection = RangeSelection::full(3, RotationDirection::Clockwise);

        let first = exporter.export(&frames, &selection, 0).unwrap();
        let second = exporter.export(&frames, &selection, 0).unwrap();

        assert_eq!(first.output_dir, output.path().join("spin_hologram"));
        assert_eq!(second.output_dir, output.path().join("spin_hologram_1"));
    }

    #[test]
    fn test_invalid_selection_creates_nothing() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let frames = collection_in(source.path(), 3);
        let exporter = HologramExporter::new(output.path().join("holograms"));

        let selection = RangeSelection::new(0, 7, RotationDirection::Clockwise);
        assert!(exporter.export(&frames, &selection, 1).is_err());
        assert!(!output.path().join("holograms").exists());
    }

    #[test]
    fn test_failed_copy_removes_output_dir() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let frames = collection_in(source.path(), 3);
        fs::remove_file(frames.path(1).unwrap()).unwrap();

        let exporter = HologramExporter::new(output.path());
        let selection = RangeSelection::full(3, RotationDirection::Clockwise);
        let err = exporter.export(&frames, &selection, 0).unwrap_err();

        assert!(matches!(err, HologramError::Filesystem { .. }));
        assert!(!output.path().join("spin_hologram").exists());
    }
}
