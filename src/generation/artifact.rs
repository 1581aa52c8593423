//! Generated artifacts and their `data:` URL form.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};

use crate::error::{Result, StudioError};
use crate::history::ContentRef;

/// MIME type assumed when a payload carries no header.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Raw bytes produced by a generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn png(data: Vec<u8>) -> Self {
        Self::new(DEFAULT_MIME_TYPE, data)
    }

    /// Payload as standard base64, no header.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Encode as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Decode a `data:` URL or a bare base64 payload.
    pub fn from_data_url(input: &str) -> Result<Self> {
        let input = input.trim();
        let (mime_type, payload) = match input.split_once(',') {
            Some((header, payload)) => (parse_header(header)?, payload),
            None => (DEFAULT_MIME_TYPE.to_string(), input),
        };

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| StudioError::InvalidArtifact {
                reason: format!("bad base64 payload: {}", e),
            })?;
        if data.is_empty() {
            return Err(StudioError::InvalidArtifact {
                reason: "empty payload".to_string(),
            });
        }

        Ok(Self { mime_type, data })
    }

    /// SHA-256 of the payload, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        format!("{:x}", hasher.finalize())
    }

    /// Decode the image and re-encode it as an RGBA PNG.
    pub fn into_rgba_png(self) -> Result<Self> {
        let decoded = image::load_from_memory(&self.data).map_err(|e| StudioError::InvalidArtifact {
            reason: format!("cannot decode {} image: {}", self.mime_type, e),
        })?;

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(decoded.to_rgba8())
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| StudioError::InvalidArtifact {
                reason: format!("cannot encode PNG: {}", e),
            })?;
        Ok(Self::png(png.into_inner()))
    }

    pub fn to_content_ref(&self) -> ContentRef {
        ContentRef::new(self.to_data_url())
    }

    pub fn from_content_ref(content_ref: &ContentRef) -> Result<Self> {
        Self::from_data_url(content_ref.as_str())
    }
}

fn parse_header(header: &str) -> Result<String> {
    let spec = header
        .strip_prefix("data:")
        .ok_or_else(|| StudioError::InvalidArtifact {
            reason: format!("expected data: URL, got '{}'", header),
        })?;
    let mime = spec
        .strip_suffix(";base64")
        .ok_or_else(|| StudioError::InvalidArtifact {
            reason: "only base64 data URLs are supported".to_string(),
        })?;

    if mime.is_empty() {
        Ok(DEFAULT_MIME_TYPE.to_string())
    } else {
        Ok(mime.to_string())
    }
}
