// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::data_uri::DataUri;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Image filled with a single colour. Compresses extremely well.
pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 120, 40])))
}

/// Image of deterministic pseudo-random pixels. Compresses badly.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9e37_79b9;
    let image = RgbImage::from_fn(width, height, |_, _| {
        let mut channel = || {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        Rgb([channel(), channel(), channel()])
    });
    DynamicImage::ImageRgb8(image)
}

/// Encode the image in the given format and wrap it in a base64 data URI.
pub fn to_data_uri(image: &DynamicImage, format: ImageFormat) -> String {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, format)
        .expect("encoding test image");

    format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        general_purpose::STANDARD.encode(bytes.into_inner())
    )
}

/// Decode a data URI produced by the normalizer.
pub fn decode_data_uri(data_uri: &str) -> DynamicImage {
    let bytes = DataUri::parse(data_uri)
        .and_then(|uri| uri.decode())
        .expect("valid data uri");
    image::load_from_memory(&bytes).expect("valid image")
}
