// SPDX-License-Identifier: MIT OR Apache-2.0

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::normalize::ImageNormalizer;

/// Handed out for every upload, identifies which normalization result belongs to which upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct UploadTicket(u64);

impl UploadTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Image attached to the chat input.
///
/// The original image is shown and kept as fallback right away while normalization runs in the
/// background. Uploads are numbered so that the result of a normalization which was superseded
/// by a newer upload (or by removing the image) is discarded instead of overwriting newer state.
#[derive(Clone, Debug, Default)]
pub struct ImageInput {
    base64_image: Option<String>,
    preview: Option<String>,
    latest: u64,
    pending: Option<UploadTicket>,
}

impl ImageInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new image. Any normalization still running for a previous image becomes stale.
    pub fn begin(&mut self, original: String) -> UploadTicket {
        self.latest += 1;
        let ticket = UploadTicket(self.latest);

        self.preview = Some(original.clone());
        self.base64_image = Some(original);
        self.pending = Some(ticket);

        ticket
    }

    /// Apply the result of a normalization.
    ///
    /// Returns `true` if the normalized image replaced the original one. Stale results are
    /// ignored and failed normalizations keep the original image.
    pub fn complete(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, NormalizeError>,
    ) -> bool {
        if self.pending != Some(ticket) {
            debug!(
                sequence = ticket.sequence(),
                latest = self.latest,
                "discarding stale image normalization"
            );
            return false;
        }
        self.pending = None;

        match result {
            Ok(normalized) => {
                self.base64_image = Some(normalized);
                true
            }
            Err(err) => {
                warn!("error normalizing image, keeping original: {err}");
                false
            }
        }
    }

    /// Remove the image from the input.
    pub fn reset(&mut self) {
        self.latest += 1;
        self.base64_image = None;
        self.preview = None;
        self.pending = None;
    }

    /// Image data submitted with the chat message.
    pub fn base64_image(&self) -> Option<&str> {
        self.base64_image.as_deref()
    }

    /// Image shown to the user, always the original upload.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }
}

/// Attach an image to the shared input and normalize it.
///
/// The lock is not held while the image is normalized, so newer uploads or a reset can happen in
/// the meantime. Returns `true` if the normalized image was applied.
pub async fn upload(
    input: &Mutex<ImageInput>,
    normalizer: &ImageNormalizer,
    original: String,
) -> bool {
    debug!(len = original.len(), "image attached to chat input");
    let ticket = input.lock().await.begin(original.clone());
    let result = normalizer.normalize(&original).await;
    input.lock().await.complete(ticket, result)
}
