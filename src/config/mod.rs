pub mod load;
pub mod save;
pub mod types;

pub use types::{Config, FileTypeTable, RotationDirection, SETTINGS_FILE, UserSettings};
