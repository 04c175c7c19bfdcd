//! HURAII Image Library
//!
//! Saved AI images per user, the capped transformation history, and the
//! "prepare as NFT" step. Preparing an NFT only marks the image; minting is
//! a separate [`BlockchainFacade`](crate::services::BlockchainFacade) call.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use url::Url;
use vortex_core::{
    EventBus, HistoryItem, ImageGenerationMeta, LibraryImage, LibraryPage, MarketEvent,
    NewLibraryImage, NftFromImage, UserId, VortexError, HISTORY_LIMIT, HURAII_ENGINE,
};
use vortex_store::{ImageRepository, StoreError, TIMESTAMP_FORMAT};

use crate::error::EngineResult;

/// Page size when the caller does not give one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: usize = 100;

/// Highest page served; later pages are served as this one
pub const MAX_PAGE: usize = 1_000_000;

/// Fields posted by the image generator when saving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveImageRequest {
    #[serde(default)]
    pub image_url: String,
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

/// Image prepared for minting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftDraft {
    pub image_id: i64,
    pub title: String,
    pub image_url: String,
    pub metadata: NftFromImage,
    /// Always `pending`: nothing has been minted yet
    pub blockchain_status: String,
}

/// Only absolute http(s) URLs with a host are accepted
pub fn validate_image_url(raw: &str) -> Result<Url, VortexError> {
    let unsafe_url = || VortexError::UnsafeUrl {
        url: raw.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|_| unsafe_url())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(unsafe_url()),
    }
}

/// HURAII image library
pub struct ImageLibrary {
    images: Arc<dyn ImageRepository>,
    events: Arc<EventBus>,
}

impl ImageLibrary {
    pub fn new(images: Arc<dyn ImageRepository>, events: Arc<EventBus>) -> Self {
        Self { images, events }
    }

    pub async fn save_image(
        &self,
        user_id: UserId,
        request: SaveImageRequest,
    ) -> EngineResult<LibraryImage> {
        if user_id.is_anonymous() {
            return Err(VortexError::not_logged_in("save images").into());
        }
        if request.image_url.trim().is_empty() {
            return Err(VortexError::missing("image_url").into());
        }
        let image_url = validate_image_url(&request.image_url)?;
        let source_url = if request.source_url.trim().is_empty() {
            String::new()
        } else {
            validate_image_url(&request.source_url)?.to_string()
        };

        let settings = match request.settings {
            serde_json::Value::Object(_) => request.settings,
            _ => serde_json::json!({}),
        };
        let meta = ImageGenerationMeta {
            prompt: request.prompt.trim().to_string(),
            mode: request.mode.trim().to_string(),
            style: request.style.trim().to_string(),
            technique: request.technique.trim().to_string(),
            settings,
            source_url,
        };

        let now = Utc::now();
        let image = self
            .images
            .insert(NewLibraryImage {
                user_id,
                title: meta.title(),
                image_url: image_url.to_string(),
                meta,
                created_at: now,
            })
            .await?;

        self.images
            .push_history(
                user_id,
                HistoryItem {
                    id: image.id,
                    url: image.image_url.clone(),
                    description: image.meta.prompt.clone(),
                    mode: image.meta.mode.clone(),
                    date: now.format(TIMESTAMP_FORMAT).to_string(),
                },
                HISTORY_LIMIT,
            )
            .await?;

        info!(user_id = %user_id, image_id = image.id, "HURAII image saved");
        self.events.publish(&MarketEvent::ImageSaved {
            user_id,
            image_id: image.id,
            agent: HURAII_ENGINE.to_string(),
            timestamp: now,
        });
        Ok(image)
    }

    /// Newest-first page of the user's AI images; `page` starts at 1
    pub async fn get_user_library(
        &self,
        user_id: UserId,
        page: usize,
        limit: usize,
    ) -> EngineResult<LibraryPage> {
        if user_id.is_anonymous() {
            return Err(VortexError::not_logged_in("view your library").into());
        }
        let page = page.clamp(1, MAX_PAGE);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).checked_mul(limit).unwrap_or(usize::MAX);
        let (images, total) = self.images.list_for_user(user_id, offset, limit).await?;
        Ok(LibraryPage {
            images,
            total,
            pages: total.div_ceil(limit as u64),
        })
    }

    /// Mark one of the user's images as ready for minting
    pub async fn create_nft_from_image(
        &self,
        user_id: UserId,
        image_id: i64,
        mut metadata: NftFromImage,
    ) -> EngineResult<NftDraft> {
        if user_id.is_anonymous() {
            return Err(VortexError::not_logged_in("create NFTs").into());
        }
        let image = match self.images.get(image_id).await? {
            Some(image) if image.ai_generated && image.user_id == user_id => image,
            _ => return Err(VortexError::InvalidImage { image_id }.into()),
        };

        if metadata.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            metadata.name = Some(image.title.clone());
        }
        if metadata.quantity == 0 {
            return Err(VortexError::invalid("quantity", "must be at least 1").into());
        }

        match self.images.mark_nft_ready(image_id, &metadata).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                return Err(VortexError::InvalidImage { image_id }.into())
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user_id, image_id, "image prepared for NFT");
        Ok(NftDraft {
            image_id,
            title: image.title,
            image_url: image.image_url,
            metadata,
            blockchain_status: "pending".to_string(),
        })
    }

    /// Transformation history, newest first
    pub async fn history(&self, user_id: UserId) -> EngineResult<Vec<HistoryItem>> {
        Ok(self.images.history(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use vortex_core::DEFAULT_IMAGE_TITLE;
    use vortex_store::VortexDatabase;

    async fn library() -> ImageLibrary {
        let db = VortexDatabase::in_memory().unwrap();
        db.init_schema().await.unwrap();
        ImageLibrary::new(db.images.clone(), Arc::new(EventBus::new()))
    }

    fn request(prompt: &str) -> SaveImageRequest {
        SaveImageRequest {
            image_url: "https://cdn.example.com/huraii/out-1.png".into(),
            prompt: prompt.into(),
            mode: "img2img".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_image_url() {
        assert!(validate_image_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_image_url("http://localhost:8080/a.png").is_ok());
        for bad in ["javascript:alert(1)", "ftp://example.com/a.png", "/uploads/a.png", "data:,x"] {
            assert_eq!(validate_image_url(bad).unwrap_err().code(), "security_error", "{bad}");
        }
    }

    #[tokio::test]
    async fn test_save_image_titles_and_history() {
        let library = library().await;
        let long_prompt = "a".repeat(80);
        let saved = library.save_image(UserId(4), request(&long_prompt)).await.unwrap();
        assert_eq!(saved.title, format!("{}...", "a".repeat(50)));
        assert!(saved.ai_generated);
        assert!(!saved.blockchain_verified);
        assert_eq!(saved.engine, HURAII_ENGINE);

        let untitled = library.save_image(UserId(4), request("")).await.unwrap();
        assert_eq!(untitled.title, DEFAULT_IMAGE_TITLE);

        let history = library.history(UserId(4)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, untitled.id);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let library = library().await;
        for i in 0..(HISTORY_LIMIT + 3) {
            library
                .save_image(UserId(4), request(&format!("prompt {i}")))
                .await
                .unwrap();
        }
        let history = library.history(UserId(4)).await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].description, format!("prompt {}", HISTORY_LIMIT + 2));
    }

    #[tokio::test]
    async fn test_save_image_rejects_unsafe_url() {
        let library = library().await;
        let mut bad = request("x");
        bad.image_url = "javascript:alert(1)".into();
        assert_eq!(
            library.save_image(UserId(4), bad).await.unwrap_err().code(),
            "security_error"
        );
        assert_eq!(
            library.save_image(UserId::ANONYMOUS, request("x")).await.unwrap_err().code(),
            "auth_error"
        );
    }

    #[tokio::test]
    async fn test_library_pagination() {
        let library = library().await;
        for i in 0..5 {
            library.save_image(UserId(4), request(&format!("p{i}"))).await.unwrap();
        }
        library.save_image(UserId(5), request("other")).await.unwrap();

        let page = library.get_user_library(UserId(4), 1, 2).await.unwrap();
        assert_eq!((page.total, page.pages, page.images.len()), (5, 3, 2));
        assert_eq!(page.images[0].meta.prompt, "p4");

        let last = library.get_user_library(UserId(4), 3, 2).await.unwrap();
        assert_eq!(last.images.len(), 1);

        let clamped = library.get_user_library(UserId(4), 0, 0).await.unwrap();
        assert_eq!(clamped.images.len(), 1);
    }

    #[tokio::test]
    async fn test_library_huge_page_is_empty() {
        let library = library().await;
        library.save_image(UserId(4), request("only")).await.unwrap();

        let page = library
            .get_user_library(UserId(4), usize::MAX, MAX_PAGE_SIZE)
            .await
            .unwrap();
        assert!(page.images.is_empty());
        assert_eq!((page.total, page.pages), (1, 1));
    }

    #[tokio::test]
    async fn test_create_nft_from_image() {
        let library = library().await;
        let saved = library.save_image(UserId(4), request("river at dusk")).await.unwrap();

        let draft = library
            .create_nft_from_image(UserId(4), saved.id, NftFromImage::default())
            .await
            .unwrap();
        assert_eq!(draft.blockchain_status, "pending");
        assert_eq!(draft.metadata.name.as_deref(), Some(saved.title.as_str()));
        assert_eq!(draft.metadata.royalty, Decimal::new(10, 0));

        let other_user = library
            .create_nft_from_image(UserId(5), saved.id, NftFromImage::default())
            .await
            .unwrap_err();
        assert_eq!(other_user.code(), "invalid_image");

        let missing = library
            .create_nft_from_image(UserId(4), 9999, NftFromImage::default())
            .await
            .unwrap_err();
        assert_eq!(missing.code(), "invalid_image");
    }
}
