use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::Storage;

pub const IMAGES_KEY: &str = "images";

/// Stock photo shown for words without a curated picture of their own.
const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?w=400&h=300&fit=crop";

/// Where a picture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    System,
    UserUpload,
    UserAi,
    UserUrl,
}

impl ImageKind {
    pub fn label(&self) -> &'static str {
        match self {
            ImageKind::System => "system",
            ImageKind::UserUpload => "upload",
            ImageKind::UserAi => "ai",
            ImageKind::UserUrl => "url",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ImageMetadata {
    /// Overlays the fields of `other` that are set onto `self`.
    pub fn merge(&mut self, other: ImageMetadata) {
        if other.original_name.is_some() {
            self.original_name = other.original_name;
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.ai_prompt.is_some() {
            self.ai_prompt = other.ai_prompt;
        }
        if other.source.is_some() {
            self.source = other.source;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.original_name.is_none()
            && self.size.is_none()
            && self.ai_prompt.is_none()
            && self.source.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub word_id: i64,
    #[serde(rename = "type")]
    pub kind: ImageKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "ImageMetadata::is_empty")]
    pub metadata: ImageMetadata,
}

/// Everything attached to one word, plus which picture it currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordImages {
    pub word_id: i64,
    pub images: Vec<ImageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_image_id: Option<String>,
}

impl WordImages {
    /// The picture the detail page should show right now. A dangling active id
    /// falls back to the first picture.
    pub fn active(&self) -> Option<&ImageRecord> {
        self.active_image_id
            .as_deref()
            .and_then(|id| self.images.iter().find(|image| image.id == id))
            .or_else(|| self.images.first())
    }
}

type ImageCollections = BTreeMap<i64, WordImages>;

#[derive(Clone)]
pub struct ImageStore {
    storage: Storage,
}

impl ImageStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// All pictures attached to a word. The first access seeds the system
    /// default picture as the active one.
    pub async fn images_for(&self, word_id: i64) -> anyhow::Result<WordImages> {
        let mut collections = self.load().await?;
        if let Some(existing) = collections.get(&word_id) {
            return Ok(existing.clone());
        }
        let seeded = system_default(word_id);
        collections.insert(word_id, seeded.clone());
        self.save(&collections).await?;
        Ok(seeded)
    }

    pub async fn active_image(&self, word_id: i64) -> anyhow::Result<Option<ImageRecord>> {
        Ok(self.images_for(word_id).await?.active().cloned())
    }

    /// Attaches a new picture. It arrives inactive; call [`set_active`] to
    /// make it the display image.
    ///
    /// [`set_active`]: ImageStore::set_active
    pub async fn add_image(
        &self,
        word_id: i64,
        kind: ImageKind,
        url: impl Into<String>,
        description: Option<String>,
        metadata: ImageMetadata,
    ) -> anyhow::Result<ImageRecord> {
        let record = ImageRecord {
            id: generate_image_id(),
            word_id,
            kind,
            url: url.into(),
            description,
            created_at: Utc::now(),
            is_active: false,
            metadata,
        };
        let stored = record.clone();
        self.change(word_id, move |collection| collection.images.push(stored))
            .await?;
        Ok(record)
    }

    /// Makes one picture the word's display image. Returns false for ids the
    /// word does not have.
    pub async fn set_active(&self, word_id: i64, image_id: &str) -> anyhow::Result<bool> {
        self.change(word_id, |collection| {
            if !collection.images.iter().any(|image| image.id == image_id) {
                return false;
            }
            for image in &mut collection.images {
                image.is_active = image.id == image_id;
            }
            collection.active_image_id = Some(image_id.to_owned());
            true
        })
        .await
    }

    /// Removes a user picture. System defaults cannot be deleted. Deleting the
    /// active picture hands the slot back to the system default, or to the
    /// first remaining picture.
    pub async fn delete_image(&self, word_id: i64, image_id: &str) -> anyhow::Result<bool> {
        self.change(word_id, |collection| {
            let Some(position) = collection
                .images
                .iter()
                .position(|image| image.id == image_id)
            else {
                return false;
            };
            if collection.images[position].kind == ImageKind::System {
                return false;
            }
            collection.images.remove(position);
            if collection.active_image_id.as_deref() == Some(image_id) {
                reassign_active(collection);
            }
            true
        })
        .await
    }

    /// Edits a picture's caption and merges in new metadata fields.
    pub async fn update_image(
        &self,
        word_id: i64,
        image_id: &str,
        description: Option<String>,
        metadata: Option<ImageMetadata>,
    ) -> anyhow::Result<bool> {
        self.change(word_id, |collection| {
            let Some(image) = collection
                .images
                .iter_mut()
                .find(|image| image.id == image_id)
            else {
                return false;
            };
            if description.is_some() {
                image.description = description;
            }
            if let Some(extra) = metadata {
                image.metadata.merge(extra);
            }
            true
        })
        .await
    }

    /// Drops user pictures older than a week. System defaults are kept
    /// forever. Returns how many pictures were removed.
    pub async fn cleanup_temporary(&self) -> anyhow::Result<usize> {
        let mut collections = self.load().await?;
        let cutoff = Utc::now() - Duration::days(7);
        let mut removed = 0;
        for collection in collections.values_mut() {
            let before = collection.images.len();
            collection
                .images
                .retain(|image| image.kind == ImageKind::System || image.created_at > cutoff);
            removed += before - collection.images.len();
            let still_active = collection.active_image_id.as_deref().map_or(false, |id| {
                collection.images.iter().any(|image| image.id == id)
            });
            if !still_active {
                reassign_active(collection);
            }
        }
        if removed > 0 {
            self.save(&collections).await?;
            debug!(removed, "cleaned up temporary images");
        }
        Ok(removed)
    }

    async fn change<R>(
        &self,
        word_id: i64,
        action: impl FnOnce(&mut WordImages) -> R,
    ) -> anyhow::Result<R> {
        let mut collections = self.load().await?;
        let collection = collections
            .entry(word_id)
            .or_insert_with(|| system_default(word_id));
        let result = action(collection);
        self.save(&collections).await?;
        Ok(result)
    }

    async fn load(&self) -> anyhow::Result<ImageCollections> {
        Ok(self.storage.read_json(IMAGES_KEY).await?.unwrap_or_default())
    }

    async fn save(&self, collections: &ImageCollections) -> anyhow::Result<()> {
        self.storage.write_json(IMAGES_KEY, collections).await
    }
}

fn reassign_active(collection: &mut WordImages) {
    collection.active_image_id = collection
        .images
        .iter()
        .find(|image| image.kind == ImageKind::System)
        .or_else(|| collection.images.first())
        .map(|image| image.id.clone());
    let next_active = collection.active_image_id.clone();
    for image in &mut collection.images {
        image.is_active = next_active.as_deref() == Some(image.id.as_str());
    }
}

fn system_default(word_id: i64) -> WordImages {
    let id = format!("system_{word_id}");
    let record = ImageRecord {
        id: id.clone(),
        word_id,
        kind: ImageKind::System,
        url: system_image_url(word_id).to_owned(),
        description: Some(String::from("系统默认图片")),
        created_at: system_image_date(),
        is_active: true,
        metadata: ImageMetadata::default(),
    };
    WordImages {
        word_id,
        images: vec![record],
        active_image_id: Some(id),
    }
}

/// Curated stock photos for the starter words.
fn system_image_url(word_id: i64) -> &'static str {
    match word_id {
        1 => "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400&h=300&fit=crop",
        2 => "https://images.unsplash.com/photo-1518837695005-2083093ee35b?w=400&h=300&fit=crop",
        3 => "https://images.unsplash.com/photo-1475924156734-496f6cac6ec1?w=400&h=300&fit=crop",
        4 => "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=400&h=300&fit=crop",
        5 => "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=400&h=300&fit=crop",
        _ => FALLBACK_IMAGE_URL,
    }
}

fn system_image_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn generate_image_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .collect();
    format!("img_{}_{}", Utc::now().timestamp_millis(), suffix)
}
