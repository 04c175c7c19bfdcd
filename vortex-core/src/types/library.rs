//! HURAII Image Library Types

use super::common::{lenient, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Engine label stamped on every generated image
pub const HURAII_ENGINE: &str = "HURAII";

/// Default title when no prompt is given
pub const DEFAULT_IMAGE_TITLE: &str = "HURAII Generated Image";

/// Transformation history length kept per user
pub const HISTORY_LIMIT: usize = 20;

/// Generation parameters recorded alongside an image
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationMeta {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub technique: String,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub source_url: String,
}

impl ImageGenerationMeta {
    /// Post title: first 50 chars of the prompt plus an ellipsis, or a default
    pub fn title(&self) -> String {
        if self.prompt.is_empty() {
            return DEFAULT_IMAGE_TITLE.to_string();
        }
        let head: String = self.prompt.chars().take(50).collect();
        format!("{head}...")
    }
}

/// NFT preparation metadata attached to a library image
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NftFromImage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_image_royalty", deserialize_with = "lenient::decimal")]
    pub royalty: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    #[serde(default = "default_quantity", deserialize_with = "lenient::u64")]
    pub quantity: u64,
}

fn default_image_royalty() -> Decimal {
    Decimal::new(10, 0)
}

fn default_quantity() -> u64 {
    1
}

impl Default for NftFromImage {
    fn default() -> Self {
        Self {
            name: None,
            description: String::new(),
            royalty: default_image_royalty(),
            price: Decimal::ZERO,
            quantity: default_quantity(),
        }
    }
}

/// Stored library image
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryImage {
    pub id: i64,
    pub user_id: UserId,
    pub title: String,
    pub image_url: String,
    pub meta: ImageGenerationMeta,
    pub engine: String,
    pub ai_generated: bool,
    pub blockchain_verified: bool,
    pub nft_ready: bool,
    pub nft_metadata: Option<NftFromImage>,
    pub created_at: DateTime<Utc>,
}

/// Image to insert; the store assigns the id
#[derive(Clone, Debug, PartialEq)]
pub struct NewLibraryImage {
    pub user_id: UserId,
    pub title: String,
    pub image_url: String,
    pub meta: ImageGenerationMeta,
    pub created_at: DateTime<Utc>,
}

/// Paged library listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryPage {
    pub images: Vec<LibraryImage>,
    pub total: u64,
    pub pages: u64,
}

/// Entry of the per-user transformation history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub url: String,
    pub description: String,
    pub mode: String,
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_prompt() {
        let meta = ImageGenerationMeta {
            prompt: "a".repeat(80),
            ..Default::default()
        };
        let title = meta.title();
        assert_eq!(title.len(), 53);
        assert!(title.ends_with("..."));

        assert_eq!(ImageGenerationMeta::default().title(), DEFAULT_IMAGE_TITLE);
    }

    #[test]
    fn test_nft_from_image_defaults() {
        let parsed: NftFromImage = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.royalty, Decimal::new(10, 0));
        assert_eq!(parsed.price, Decimal::ZERO);
        assert_eq!(parsed.quantity, 1);
    }
}
