/// Image galleries, one per element and per forbidden element
///
/// Images are stored inline as base64 data URIs in a JSON array under the
/// gallery's key. This layer does not look at roles; callers gate access.
use crate::{
    element::ElementRef,
    error::{AppError, AppResult},
    store::Store,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

/// Gallery entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Creation time in epoch milliseconds, bumped to stay unique
    pub id: i64,
    /// `data:<mime>;base64,<payload>`
    pub url: String,
    pub description: String,
}

/// Gallery store service
pub struct GalleryStore {
    store: Store,
    write_lock: Mutex<()>,
    max_image_bytes: usize,
    last_id: AtomicI64,
}

impl GalleryStore {
    pub fn new(store: Store, max_image_bytes: usize) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            max_image_bytes,
            last_id: AtomicI64::new(0),
        }
    }

    /// Images in insertion order
    pub async fn list(&self, target: ElementRef) -> AppResult<Vec<Image>> {
        Ok(self
            .store
            .get_json::<Vec<Image>>(&target.gallery_key())
            .await?
            .unwrap_or_default())
    }

    /// Validate, encode and append an uploaded image
    ///
    /// The format is sniffed from the bytes. A declared content type is only
    /// checked for being an image type at all.
    pub async fn add(
        &self,
        target: ElementRef,
        description: &str,
        bytes: &[u8],
        declared_type: Option<&str>,
    ) -> AppResult<Image> {
        let description = require_description(description)?;

        if bytes.is_empty() {
            return Err(AppError::Validation("Image file is required".to_string()));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(AppError::Validation(format!(
                "Image exceeds the {} byte limit",
                self.max_image_bytes
            )));
        }
        if let Some(declared) = declared_type {
            if !declared.starts_with("image/") && declared != "application/octet-stream" {
                return Err(AppError::Validation(format!(
                    "Unsupported content type: {}",
                    declared
                )));
            }
        }

        let format = image::guess_format(bytes)
            .map_err(|_| AppError::Validation("File is not a supported image".to_string()))?;
        let url = format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(bytes)
        );

        let _guard = self.write_lock.lock().await;
        let mut images = self.list(target).await?;
        let image = Image {
            id: self.next_id(),
            url,
            description,
        };
        images.push(image.clone());
        self.save(target, &images).await?;

        crate::metrics::record_gallery_mutation(tier(target), "add");
        tracing::info!("added image {} to {}", image.id, target);
        Ok(image)
    }

    /// Replace an image's caption in place
    pub async fn update(
        &self,
        target: ElementRef,
        image_id: i64,
        description: &str,
    ) -> AppResult<Image> {
        let description = require_description(description)?;

        let _guard = self.write_lock.lock().await;
        let mut images = self.list(target).await?;
        let image = images
            .iter_mut()
            .find(|i| i.id == image_id)
            .ok_or_else(|| image_not_found(target, image_id))?;
        image.description = description;
        let updated = image.clone();
        self.save(target, &images).await?;

        crate::metrics::record_gallery_mutation(tier(target), "update");
        Ok(updated)
    }

    pub async fn delete(&self, target: ElementRef, image_id: i64) -> AppResult<Image> {
        let _guard = self.write_lock.lock().await;
        let mut images = self.list(target).await?;
        let position = images
            .iter()
            .position(|i| i.id == image_id)
            .ok_or_else(|| image_not_found(target, image_id))?;
        let removed = images.remove(position);
        self.save(target, &images).await?;

        crate::metrics::record_gallery_mutation(tier(target), "delete");
        tracing::info!("deleted image {} from {}", image_id, target);
        Ok(removed)
    }

    async fn save(&self, target: ElementRef, images: &[Image]) -> AppResult<()> {
        self.store.set_json(&target.gallery_key(), images).await
    }

    /// Current time in milliseconds, or one past the last id if the clock
    /// has not moved
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

fn require_description(description: &str) -> AppResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Image description is required".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn image_not_found(target: ElementRef, image_id: i64) -> AppError {
    AppError::NotFound(format!("Image {} not found in {}", image_id, target))
}

fn tier(target: ElementRef) -> &'static str {
    if target.is_forbidden() {
        "forbidden"
    } else {
        "element"
    }
}
