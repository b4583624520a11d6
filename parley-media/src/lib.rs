// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image normalization for multimodal chat input.
//!
//! Images picked by users arrive as base64 data URIs of arbitrary size. Before they are sent to a
//! vision-capable model they are scaled down to a bounded pixel area and re-encoded until the
//! data URI fits the request size limit, see [`ImageNormalizer`].
//!
//! ```no_run
//! # async fn run(data_uri: &str) -> Result<(), parley_media::NormalizeError> {
//! use parley_media::ImageNormalizer;
//!
//! let normalizer = ImageNormalizer::default();
//! let normalized = normalizer.normalize(data_uri).await?;
//! # Ok(())
//! # }
//! ```
mod config;
mod data_uri;
mod error;
mod input;
mod normalize;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use config::Config;
pub use data_uri::{DEFAULT_MIME_TYPE, DataUri, OutputFormat, is_image_data_uri};
pub use error::{ImageDecodeError, NormalizeError};
pub use input::{ImageInput, UploadTicket, upload};
pub use normalize::{ImageNormalizer, Normalization, NormalizedImage, target_dimensions};
