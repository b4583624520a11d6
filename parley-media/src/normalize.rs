// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Cow;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, GenericImageView};
use tokio::task;
use tracing::{debug, warn};

use crate::config::Config;
use crate::data_uri::{self, DataUri, OutputFormat, is_image_data_uri};
use crate::error::{ImageDecodeError, NormalizeError};

/// Dimensions an image of the given size is scaled down to, or `None` if its pixel area fits
/// into `max_dimension * max_dimension`.
///
/// The aspect ratio is kept: landscape and square images get `max_dimension` as width, portrait
/// images get it as height. The other side is rounded to the nearest integer (and never drops
/// below one pixel).
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let max_pixels = u64::from(max_dimension) * u64::from(max_dimension);
    if u64::from(width) * u64::from(height) <= max_pixels {
        return None;
    }

    let aspect_ratio = f64::from(width) / f64::from(height);
    let (width, height) = if aspect_ratio >= 1.0 {
        let height = (f64::from(max_dimension) / aspect_ratio).round() as u32;
        (max_dimension, height)
    } else {
        let width = (f64::from(max_dimension) * aspect_ratio).round() as u32;
        (width, max_dimension)
    };

    Some((width.max(1), height.max(1)))
}

/// Image after normalization together with what was done to it.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedImage {
    pub data_uri: String,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    /// Quality the image was last encoded with. Ignored by lossless formats.
    pub quality: f32,
    pub resized: bool,
    /// The first encoding exceeded the size limit and the image was encoded once more with
    /// stronger compression.
    pub recompressed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Normalization {
    /// Input was not an image data URI and is returned as-is.
    Unchanged(String),

    Normalized(NormalizedImage),
}

impl Normalization {
    pub fn as_data_uri(&self) -> &str {
        match self {
            Normalization::Unchanged(value) => value,
            Normalization::Normalized(image) => &image.data_uri,
        }
    }

    pub fn into_data_uri(self) -> String {
        match self {
            Normalization::Unchanged(value) => value,
            Normalization::Normalized(image) => image.data_uri,
        }
    }
}

/// Bounds pixel area and encoded size of base64 data URI images.
///
/// Every call works on its own decoded copy of the image, so concurrent normalizations don't
/// share any state. Decoding and encoding run on the runtime's blocking thread pool while the
/// calling task is suspended.
#[derive(Clone, Debug, Default)]
pub struct ImageNormalizer {
    config: Config,
}

impl ImageNormalizer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalize an image data URI. Anything which is not an image data URI is returned
    /// unchanged.
    pub async fn normalize(&self, base64_image: &str) -> Result<String, NormalizeError> {
        self.process(base64_image)
            .await
            .map(Normalization::into_data_uri)
    }

    /// Normalize an image and fall back to the original input if that fails.
    pub async fn normalize_or_original(&self, base64_image: &str) -> String {
        match self.normalize(base64_image).await {
            Ok(normalized) => normalized,
            Err(err) => {
                warn!("failed to normalize image, keeping original: {err}");
                base64_image.to_owned()
            }
        }
    }

    /// Same as [`ImageNormalizer::normalize`] but reporting the steps which were taken.
    pub async fn process(&self, base64_image: &str) -> Result<Normalization, NormalizeError> {
        if !is_image_data_uri(base64_image) {
            return Ok(Normalization::Unchanged(base64_image.to_owned()));
        }

        let source = base64_image.to_owned();
        let decoded = task::spawn_blocking(move || decode(&source)).await??;

        let config = self.config.clone();
        let (image, candidate) =
            task::spawn_blocking(move || first_pass(decoded, &config)).await??;

        let normalized = if needs_recompression(&candidate, &self.config) {
            let config = self.config.clone();
            task::spawn_blocking(move || recompress(&image, candidate, &config)).await??
        } else {
            candidate
        };

        log_result(base64_image, &normalized);
        Ok(Normalization::Normalized(normalized))
    }

    /// Blocking variant of [`ImageNormalizer::process`] for callers outside of an async runtime.
    pub fn process_blocking(&self, base64_image: &str) -> Result<Normalization, NormalizeError> {
        if !is_image_data_uri(base64_image) {
            return Ok(Normalization::Unchanged(base64_image.to_owned()));
        }

        let decoded = decode(base64_image)?;
        let (image, candidate) = first_pass(decoded, &self.config)?;

        let normalized = if needs_recompression(&candidate, &self.config) {
            recompress(&image, candidate, &self.config)?
        } else {
            candidate
        };

        log_result(base64_image, &normalized);
        Ok(Normalization::Normalized(normalized))
    }
}

struct Decoded {
    image: DynamicImage,
    format: OutputFormat,
}

fn decode(base64_image: &str) -> Result<Decoded, ImageDecodeError> {
    let data_uri = DataUri::parse(base64_image)?;
    let bytes = data_uri.decode()?;

    // The actual image format is detected from the payload, the declared MIME type only decides
    // the output format.
    let image = image::load_from_memory(&bytes)?;

    Ok(Decoded {
        image,
        format: OutputFormat::from_mime_type(data_uri.mime_type()),
    })
}

fn first_pass(
    decoded: Decoded,
    config: &Config,
) -> Result<(DynamicImage, NormalizedImage), NormalizeError> {
    let Decoded { image, format } = decoded;
    let (original_width, original_height) = image.dimensions();

    let (image, quality, resized) =
        match target_dimensions(original_width, original_height, config.max_dimension) {
            Some((width, height)) => (
                image.resize_exact(width, height, config.filter),
                config.resized_quality,
                true,
            ),
            None => (image, config.quality, false),
        };

    let data_uri = encode_image(&image, format, quality)?;
    let (width, height) = image.dimensions();

    let candidate = NormalizedImage {
        data_uri,
        format,
        width,
        height,
        original_width,
        original_height,
        quality,
        resized,
        recompressed: false,
    };

    Ok((image, candidate))
}

/// Lossless output would come out byte-identical at a lower quality, so only lossy formats get a
/// second pass.
fn needs_recompression(candidate: &NormalizedImage, config: &Config) -> bool {
    if candidate.data_uri.len() <= config.max_encoded_len {
        return false;
    }

    if !candidate.format.is_lossy() {
        debug!(
            limit = config.max_encoded_len,
            len = candidate.data_uri.len(),
            format = %candidate.format,
            "oversized image can't be compressed further"
        );
        return false;
    }

    true
}

fn recompress(
    image: &DynamicImage,
    candidate: NormalizedImage,
    config: &Config,
) -> Result<NormalizedImage, NormalizeError> {
    let data_uri = encode_image(image, candidate.format, config.fallback_quality)?;

    debug!(
        limit = config.max_encoded_len,
        before = candidate.data_uri.len(),
        after = data_uri.len(),
        "encoded oversized image again with stronger compression"
    );

    Ok(NormalizedImage {
        data_uri,
        quality: config.fallback_quality,
        recompressed: true,
        ..candidate
    })
}

/// Encode the image as data URI. `quality` ranges from 0.0 to 1.0 and only affects lossy
/// formats.
pub(crate) fn encode_image(
    image: &DynamicImage,
    format: OutputFormat,
    quality: f32,
) -> Result<String, NormalizeError> {
    let mut bytes = Vec::new();

    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality));
            opaque(image).write_with_encoder(encoder)
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut bytes);
            eight_bit(image).write_with_encoder(encoder)
        }
        OutputFormat::WebP => {
            let image = eight_bit(image);
            let encoder = webp::Encoder::from_image(&image)
                .map_err(|err| NormalizeError::WebPEncode(err.to_string()))?;
            bytes.extend_from_slice(&encoder.encode(lossy_quality(quality)));
            Ok(())
        }
    };
    result.map_err(NormalizeError::Encode)?;

    Ok(data_uri::encode(format.mime_type(), &bytes))
}

fn jpeg_quality(quality: f32) -> u8 {
    lossy_quality(quality).round().max(1.0) as u8
}

fn lossy_quality(quality: f32) -> f32 {
    quality.clamp(0.0, 1.0) * 100.0
}

/// JPEG has no alpha channel.
fn opaque(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => Cow::Borrowed(image),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

fn eight_bit(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
        _ if image.color().has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

fn log_result(original: &str, normalized: &NormalizedImage) {
    debug!(
        original_len = original.len(),
        normalized_len = normalized.data_uri.len(),
        original_size = ?(normalized.original_width, normalized.original_height),
        size = ?(normalized.width, normalized.height),
        format = %normalized.format,
        resized = normalized.resized,
        recompressed = normalized.recompressed,
        "image normalized"
    );
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, ImageFormat};

    use crate::config::Config;
    use crate::data_uri::OutputFormat;
    use crate::test_utils::{decode_data_uri, noise_image, solid_image, to_data_uri};

    use super::{
        Decoded, ImageNormalizer, Normalization, encode_image, first_pass, jpeg_quality,
        lossy_quality, target_dimensions,
    };

    #[test]
    fn dimensions_within_budget_are_kept() {
        assert_eq!(target_dimensions(2048, 2048, 2048), None);
        assert_eq!(target_dimensions(4096, 1024, 2048), None);
        assert_eq!(target_dimensions(100, 100, 2048), None);
        assert_eq!(target_dimensions(0, 0, 2048), None);
    }

    #[test]
    fn landscape_and_square_fix_width() {
        assert_eq!(target_dimensions(3000, 2000, 2048), Some((2048, 1365)));
        assert_eq!(target_dimensions(4096, 4096, 2048), Some((2048, 2048)));
        assert_eq!(target_dimensions(2049, 2049, 2048), Some((2048, 2048)));
    }

    #[test]
    fn portrait_fixes_height() {
        assert_eq!(target_dimensions(1500, 3000, 2048), Some((1024, 2048)));
        assert_eq!(target_dimensions(2000, 3000, 2048), Some((1365, 2048)));
    }

    #[test]
    fn extreme_aspect_ratio_keeps_one_pixel() {
        assert_eq!(target_dimensions(10_000_000, 1, 2048), Some((2048, 1)));
    }

    #[test]
    fn quality_mapping() {
        assert_eq!(jpeg_quality(0.9), 90);
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(0.6), 60);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(2.0), 100);
        assert_eq!(lossy_quality(0.6), 60.0);
    }

    #[test]
    fn second_pass_shrinks_oversized_jpeg() {
        let config = Config {
            max_encoded_len: 1024,
            ..Config::default()
        };
        let source = noise_image(96, 64);
        let input = to_data_uri(&source, ImageFormat::Jpeg);

        let decoded = Decoded {
            image: decode_data_uri(&input),
            format: OutputFormat::Jpeg,
        };
        let (_, first_candidate) = first_pass(decoded, &config).unwrap();
        assert!(first_candidate.data_uri.len() > config.max_encoded_len);
        assert_eq!(first_candidate.quality, 0.9);

        let normalizer = ImageNormalizer::new(config);
        let Normalization::Normalized(normalized) = normalizer.process_blocking(&input).unwrap()
        else {
            panic!("expected image to be normalized");
        };

        assert!(normalized.recompressed);
        assert_eq!(normalized.quality, 0.6);
        assert_ne!(normalized.data_uri, first_candidate.data_uri);
        assert!(normalized.data_uri.len() < first_candidate.data_uri.len());

        // No further attempts are made even though the result is still too large.
        assert!(normalized.data_uri.len() > 1024);
    }

    #[test]
    fn png_ignores_quality() {
        let image = noise_image(32, 32);
        let high = encode_image(&image, OutputFormat::Png, 0.9).unwrap();
        let low = encode_image(&image, OutputFormat::Png, 0.6).unwrap();
        assert_eq!(high, low);
        assert!(high.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn webp_honours_quality() {
        let image = noise_image(64, 64);
        let high = encode_image(&image, OutputFormat::WebP, 0.9).unwrap();
        let low = encode_image(&image, OutputFormat::WebP, 0.6).unwrap();

        assert!(high.starts_with("data:image/webp;base64,"));
        assert!(low.len() < high.len());
        assert_eq!(decode_data_uri(&low).dimensions(), (64, 64));

        let transparent = image::DynamicImage::ImageRgba8(image.to_rgba8());
        let webp = encode_image(&transparent, OutputFormat::WebP, 0.8).unwrap();
        assert_eq!(decode_data_uri(&webp).dimensions(), (64, 64));
    }

    #[test]
    fn lossless_output_is_not_compressed_again() {
        let config = Config {
            max_encoded_len: 1024,
            ..Config::default()
        };
        let input = to_data_uri(&noise_image(64, 64), ImageFormat::Png);

        let normalizer = ImageNormalizer::new(config);
        let Normalization::Normalized(normalized) = normalizer.process_blocking(&input).unwrap()
        else {
            panic!("expected image to be normalized");
        };

        assert_eq!(normalized.format, OutputFormat::Png);
        assert!(!normalized.recompressed);
        assert_eq!(normalized.quality, 0.9);
        assert!(normalized.data_uri.len() > 1024);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let image = image::DynamicImage::ImageRgba8(solid_image(8, 8).to_rgba8());
        let jpeg = encode_image(&image, OutputFormat::Jpeg, 0.9).unwrap();
        assert!(jpeg.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_data_uri(&jpeg).dimensions(), (8, 8));
    }
}
