//! 影格擷取元件
//!
//! 解碼影片 → 逐幀寫入暫存資料夾 → 感知雜湊去重 → 以事件通道回報

mod decoder;
mod events;
mod main;

pub use decoder::{FfmpegDecoder, FrameDecoder, build_command};
pub use events::{ExtractedFrame, ExtractionEvent, FrameCollection};
pub use main::{ExtractionHandle, ExtractionOutcome, FrameExtractor};
