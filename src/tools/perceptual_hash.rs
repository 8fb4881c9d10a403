use crate::error::{HologramError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use log::debug;
use rustdct::{DctPlanner, TransformType2And3};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// 預設雜湊邊長：32x32 = 1024 bits，解析度高以降低誤判
pub const DEFAULT_HASH_SIZE: u32 = 32;

/// 雜湊邊長上限（64x64 = 4096 bits，取樣 256x256）
pub const MAX_HASH_SIZE: u32 = 64;

/// 漢明距離小於此值視為重複影格
pub const DEFAULT_DUPLICATE_CUTOFF: u32 = 10;

/// DCT 前的縮放倍率（取樣邊長 = hash_size * 4）
const HIGHFREQ_FACTOR: u32 = 4;

/// DCT 感知雜湊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerceptualHash {
    bits: Vec<u64>,
    bit_len: usize,
}

impl PerceptualHash {
    fn from_bools(flags: impl ExactSizeIterator<Item = bool>) -> Self {
        let bit_len = flags.len();
        let mut bits = vec![0u64; bit_len.div_ceil(64)];
        for (i, flag) in flags.enumerate() {
            if flag {
                bits[i / 64] |= 1 << (i % 64);
            }
        }
        Self { bits, bit_len }
    }

    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// 漢明距離；長度不同的雜湊視為完全不同
    #[must_use]
    pub fn distance(&self, other: &Self) -> u32 {
        if self.bit_len != other.bit_len {
            return u32::try_from(self.bit_len.max(other.bit_len)).unwrap_or(u32::MAX);
        }
        self.bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// 以感知雜湊判斷兩張影格是否幾乎相同
///
/// DCT 在建立時規劃一次，之後每一幀共用；複製成本只有一個 `Arc`。
#[derive(Clone)]
pub struct PerceptualDeduplicator {
    hash_size: u32,
    cutoff: u32,
    dct: Arc<dyn TransformType2And3<f32>>,
}

impl fmt::Debug for PerceptualDeduplicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerceptualDeduplicator")
            .field("hash_size", &self.hash_size)
            .field("cutoff", &self.cutoff)
            .finish_non_exhaustive()
    }
}

impl PerceptualDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_HASH_SIZE, DEFAULT_DUPLICATE_CUTOFF)
    }

    #[must_use]
    pub fn with_settings(hash_size: u32, cutoff: u32) -> Self {
        let hash_size = hash_size.max(1);
        let sample_size = hash_size as usize * HIGHFREQ_FACTOR as usize;
        let dct = DctPlanner::new().plan_dct2(sample_size);
        Self {
            hash_size,
            cutoff,
            dct,
        }
    }

    #[must_use]
    pub const fn cutoff(&self) -> u32 {
        self.cutoff
    }

    /// 兩張圖片是否為重複影格
    ///
    /// 任一張無法讀取或解碼時回傳錯誤，不會當成「不重複」處理。
    pub fn is_duplicate(&self, path_a: &Path, path_b: &Path) -> Result<bool> {
        let hash_a = self.hash_file(path_a)?;
        let hash_b = self.hash_file(path_b)?;
        let duplicate = self.is_similar(&hash_a, &hash_b);

        debug!(
            "比對 {} / {}: 距離 {}, 重複={duplicate}",
            path_a.display(),
            path_b.display(),
            hash_a.distance(&hash_b)
        );

        Ok(duplicate)
    }

    #[must_use]
    pub fn is_similar(&self, a: &PerceptualHash, b: &PerceptualHash) -> bool {
        a.distance(b) < self.cutoff
    }

    pub fn hash_file(&self, path: &Path) -> Result<PerceptualHash> {
        let image = image::open(path).map_err(|source| HologramError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.hash_image(&image))
    }

    /// 灰階 → 縮放 → 2D DCT-II → 取左上低頻區塊，與中位數比較
    #[must_use]
    pub fn hash_image(&self, image: &DynamicImage) -> PerceptualHash {
        let hash_size = self.hash_size as usize;
        let sample_size = hash_size * HIGHFREQ_FACTOR as usize;

        let gray: GrayImage = image.to_luma8();
        let side = u32::try_from(sample_size).unwrap_or(u32::MAX);
        let resized = imageops::resize(&gray, side, side, FilterType::Lanczos3);

        let mut matrix: Vec<f32> = resized.pixels().map(|p| f32::from(p.0[0])).collect();
        dct_2d(self.dct.as_ref(), &mut matrix, sample_size);

        let low_freq: Vec<f32> = (0..hash_size)
            .flat_map(|row| {
                let offset = row * sample_size;
                matrix[offset..offset + hash_size].iter().copied()
            })
            .collect();
        let median = median(&low_freq);

        PerceptualHash::from_bools(low_freq.iter().map(|&value| value > median))
    }
}

impl Default for PerceptualDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

/// 對 `size x size` 的矩陣就地做二維 DCT-II（先列後行）
fn dct_2d(dct: &dyn TransformType2And3<f32>, matrix: &mut [f32], size: usize) {

    for row in matrix.chunks_exact_mut(size) {
        dct.process_dct2(row);
    }

    let mut column = vec![0f32; size];
    for x in 0..size {
        for (y, value) in column.iter_mut().enumerate() {
            *value = matrix[y * size + x];
        }
        dct.process_dct2(&mut column);
        for (y, value) in column.iter().enumerate() {
            matrix[y * size + x] = *value;
        }
    }
}

fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
