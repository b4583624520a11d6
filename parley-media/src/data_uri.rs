// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Cow;
use std::fmt::Display;

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose};
use base64::{Engine as _, alphabet};

use crate::error::ImageDecodeError;

const IMAGE_PREFIX: &str = "data:image/";

/// Browsers load data URIs with or without trailing `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// MIME type assumed when the data URI header doesn't name one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Returns `true` if the string looks like an image data URI. Anything else is not touched by
/// normalization.
pub fn is_image_data_uri(value: &str) -> bool {
    value.starts_with(IMAGE_PREFIX)
}

/// Parsed `data:<mime>;base64,<payload>` string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri<'a> {
    mime_type: &'a str,
    is_base64: bool,
    payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(value: &'a str) -> Result<Self, ImageDecodeError> {
        let (header, payload) = value
            .split_once(',')
            .ok_or(ImageDecodeError::InvalidDataUri)?;

        let params = header.strip_prefix("data:").unwrap_or(header);
        let mime_type = match params.split_once(';') {
            Some((mime_type, _)) if !mime_type.is_empty() => mime_type,
            _ => DEFAULT_MIME_TYPE,
        };
        let is_base64 = params.split(';').skip(1).any(|param| param == "base64");

        Ok(Self {
            mime_type,
            is_base64,
            payload,
        })
    }

    pub fn mime_type(&self) -> &'a str {
        self.mime_type
    }

    /// Decode the base64 payload. ASCII whitespace inside the payload is ignored.
    pub fn decode(&self) -> Result<Vec<u8>, ImageDecodeError> {
        if !self.is_base64 {
            return Err(ImageDecodeError::UnsupportedEncoding);
        }

        let payload: Cow<'_, str> = if self.payload.contains(|c: char| c.is_ascii_whitespace()) {
            Cow::Owned(
                self.payload
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect(),
            )
        } else {
            Cow::Borrowed(self.payload)
        };

        Ok(PAYLOAD_ENGINE.decode(payload.as_bytes())?)
    }
}

/// Encode bytes as base64 data URI of the given MIME type.
pub(crate) fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Formats normalized images can be written in.
///
/// Mirrors what browsers do when asked for a data URL of a canvas: JPEG and WebP honour the
/// quality setting, PNG is lossless and unknown types are written as PNG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn from_mime_type(mime_type: &str) -> Self {
        match mime_type.to_ascii_lowercase().as_str() {
            "image/jpeg" => OutputFormat::Jpeg,
            "image/webp" => OutputFormat::WebP,
            _ => OutputFormat::Png,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::WebP)
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::error::ImageDecodeError;

    use super::{DEFAULT_MIME_TYPE, DataUri, OutputFormat, encode, is_image_data_uri};

    #[test]
    fn image_prefix() {
        assert!(is_image_data_uri("data:image/png;base64,AAAA"));
        assert!(!is_image_data_uri("data:text/plain;base64,AAAA"));
        assert!(!is_image_data_uri("https://example.com/cat.png"));
        assert!(!is_image_data_uri(""));
    }

    #[test]
    fn parse_header() {
        let uri = DataUri::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type(), "image/png");
        assert_eq!(uri.decode().unwrap(), b"hello");

        // No parameters separated by ';', so no MIME type can be read.
        let uri = DataUri::parse("data:image/png,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type(), DEFAULT_MIME_TYPE);
        assert_matches!(uri.decode(), Err(ImageDecodeError::UnsupportedEncoding));

        let uri = DataUri::parse("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type(), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn invalid_payloads() {
        assert_matches!(
            DataUri::parse("data:image/png;base64"),
            Err(ImageDecodeError::InvalidDataUri)
        );

        let uri = DataUri::parse("data:image/png;base64,***").unwrap();
        assert_matches!(uri.decode(), Err(ImageDecodeError::Base64(_)));
    }

    #[test]
    fn whitespace_in_payload() {
        let uri = DataUri::parse("data:image/png;base64,aGVs\nbG8=").unwrap();
        assert_eq!(uri.decode().unwrap(), b"hello");
    }

    #[test]
    fn unpadded_payload() {
        let uri = DataUri::parse("data:image/png;base64,aGVsbG8").unwrap();
        assert_eq!(uri.decode().unwrap(), b"hello");

        let uri = DataUri::parse("data:image/png;base64,aGk").unwrap();
        assert_eq!(uri.decode().unwrap(), b"hi");
    }

    #[test]
    fn encode_data_uri() {
        assert_eq!(encode("image/png", b"hello"), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn output_formats() {
        assert_eq!(OutputFormat::from_mime_type("image/jpeg"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_mime_type("IMAGE/JPEG"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_mime_type("image/webp"), OutputFormat::WebP);
        assert_eq!(OutputFormat::from_mime_type("image/png"), OutputFormat::Png);
        assert_eq!(OutputFormat::from_mime_type("image/gif"), OutputFormat::Png);
        assert!(OutputFormat::Jpeg.is_lossy());
        assert!(OutputFormat::WebP.is_lossy());
        assert!(!OutputFormat::Png.is_lossy());
    }
}
