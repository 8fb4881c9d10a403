//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要邏輯和專用工具

pub mod frame_extractor;
pub mod hologram_exporter;
pub mod hologram_session;

pub use frame_extractor::{ExtractionEvent, FfmpegDecoder, FrameDecoder, FrameExtractor};
pub use hologram_exporter::{ExportJob, HologramExporter, RangeHandle, RangeSelection};
pub use hologram_session::HologramSession;
