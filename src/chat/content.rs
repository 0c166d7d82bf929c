//! Message content as the model API sees it.
use serde::{Deserialize, Serialize};

use super::attachment::MediaType;

/// Either a plain string or an ordered list of typed blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Plain(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageSource {
    Base64 { media_type: MediaType, data: String },
}

impl Content {
    /// Concatenated text of the content, ignoring images.
    pub fn text(&self) -> String {
        match self {
            Content::Plain(text) => text.clone(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_images(&self) -> bool {
        match self {
            Content::Plain(_) => false,
            Content::Blocks(blocks) => blocks
                .iter()
                .any(|b| matches!(b, ContentBlock::Image { .. })),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Plain(text.to_string())
    }
}

/// Build the content for a user message. Images always come first and
/// a text block is only added when there is non-blank text since the
/// API rejects empty text blocks.
pub fn build(text: &str, images: &[ImageSource]) -> Content {
    if images.is_empty() {
        return Content::Plain(text.to_string());
    }

    let mut blocks: Vec<ContentBlock> = images
        .iter()
        .map(|source| ContentBlock::Image {
            source: source.clone(),
        })
        .collect();

    if !text.trim().is_empty() {
        blocks.push(ContentBlock::Text {
            text: text.to_string(),
        });
    }

    Content::Blocks(blocks)
}
