//! 匯入、選取、轉換的工作階段

mod main;
mod temp_frames;

pub use main::HologramSession;
pub use temp_frames::TempFrameDir;
