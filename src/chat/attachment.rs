//! Image attachments and the base64 codec used to carry them.
use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::content::ImageSource;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AttachmentError {
    #[error("unsupported image type \"{0}\", use PNG, JPEG, GIF or WebP")]
    UnsupportedMediaType(String),
    #[error("image data is not valid base64: {0}")]
    InvalidData(String),
}

/// Image formats accepted by the model API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
}

impl MediaType {
    pub fn parse(media_type: &str) -> Result<Self, AttachmentError> {
        match media_type {
            "image/png" => Ok(Self::Png),
            "image/jpeg" => Ok(Self::Jpeg),
            "image/gif" => Ok(Self::Gif),
            "image/webp" => Ok(Self::Webp),
            other => Err(AttachmentError::UnsupportedMediaType(other.to_string())),
        }
    }

    pub fn from_extension(ext: &str) -> Result<Self, AttachmentError> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            other => Err(AttachmentError::UnsupportedMediaType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `media_type` is one of the supported image formats.
pub fn validate(media_type: &str) -> bool {
    MediaType::parse(media_type).is_ok()
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(data: &str) -> Result<Vec<u8>, AttachmentError> {
    STANDARD
        .decode(data)
        .map_err(|e| AttachmentError::InvalidData(e.to_string()))
}

/// An image sent along with a user message. The media type is kept as
/// the raw string the client sent so that a bad value can be rejected
/// per attachment instead of failing the whole request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub data: String,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ImageAttachment {
    pub fn from_bytes(bytes: &[u8], media_type: MediaType, name: Option<&str>) -> Self {
        Self {
            data: encode(bytes),
            media_type: media_type.as_str().to_string(),
            name: name.map(String::from),
        }
    }

    /// Read an image file, inferring the media type from its extension.
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let media_type = MediaType::from_extension(ext)?;
        let bytes = tokio::fs::read(path).await?;
        let name = path.file_name().and_then(|n| n.to_str());
        Ok(Self::from_bytes(&bytes, media_type, name))
    }

    /// Check the media type and payload, returning the block source
    /// the model API expects.
    pub fn validate(&self) -> Result<ImageSource, AttachmentError> {
        let media_type = MediaType::parse(&self.media_type)?;
        decode(&self.data)?;
        Ok(ImageSource::Base64 {
            media_type,
            data: self.data.clone(),
        })
    }
}
