//! 全像影格匯出元件
//!
//! 環狀選取 → 補幀 → 依序編號複製到新的輸出資料夾

mod main;
mod selection;

pub use main::{
    CopyTask, ExportJob, HOLOGRAM_SUFFIX, HologramExporter, create_copy_tasks, plan_order,
};
pub use selection::{RangeHandle, RangeSelection};
