// SPDX-License-Identifier: MIT OR Apache-2.0

use image::imageops::FilterType;

/// Configuration parameters for image normalization.
#[derive(Clone, Debug)]
pub struct Config {
    /// Longest side of a resized image. Images are only resized when their pixel area exceeds
    /// `max_dimension * max_dimension`.
    pub max_dimension: u32,
    /// Maximum length in bytes of the resulting data URI before a stronger compression pass is
    /// attempted.
    pub max_encoded_len: usize,
    /// Encoding quality for images which kept their size.
    pub quality: f32,
    /// Encoding quality for images which were scaled down.
    pub resized_quality: f32,
    /// Encoding quality of the single extra pass for oversized results.
    pub fallback_quality: f32,
    /// Resampling filter used when scaling down.
    pub filter: FilterType,
}

impl Config {
    /// Pixel area above which images are scaled down.
    pub fn max_pixels(&self) -> u64 {
        u64::from(self.max_dimension) * u64::from(self.max_dimension)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            max_encoded_len: 5 * 1024 * 1024, // 5 MiB
            quality: 0.9,
            resized_quality: 0.8,
            fallback_quality: 0.6,
            filter: FilterType::Triangle,
        }
    }
}
