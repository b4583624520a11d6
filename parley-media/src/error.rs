// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// The input could not be read as an image. Callers are expected to keep using the original
/// data URI in this case.
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("data uri is missing the ',' separating header and payload")]
    InvalidDataUri,

    #[error("only base64 encoded data uris are supported")]
    UnsupportedEncoding,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Decode(#[from] ImageDecodeError),

    /// Re-encoding failed. This only affects the current attempt.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to encode webp image: {0}")]
    WebPEncode(String),

    #[error("normalization task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl NormalizeError {
    pub fn is_decode_error(&self) -> bool {
        matches!(self, NormalizeError::Decode(_))
    }
}
