mod circular_range;
mod ffprobe_info;
mod path_validator;
mod perceptual_hash;

pub use circular_range::{CircularRange, CircularRangeIter};
pub use ffprobe_info::{VideoSource, digit_count, probe_video};
pub use path_validator::{allocate_unique_directory, ensure_directory_exists};
pub use perceptual_hash::{
    DEFAULT_DUPLICATE_CUTOFF, DEFAULT_HASH_SIZE, MAX_HASH_SIZE, PerceptualDeduplicator,
    PerceptualHash,
};
