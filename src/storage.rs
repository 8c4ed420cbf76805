//! Wardrobe record storage
//!
//! The pipeline never writes records itself. Callers persist the
//! segmentation results they keep through a [`ClothingStore`].

use crate::error::{Result, SegmentationError};
use crate::types::{ClothingItem, SegmentedClothingItem};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Key-value persistence for clothing items
#[async_trait]
pub trait ClothingStore: Send + Sync {
    /// Insert a record, or replace the record with the same id in place
    async fn save(&self, item: ClothingItem) -> Result<()>;

    /// All records in insertion order
    async fn get_all(&self) -> Result<Vec<ClothingItem>>;

    /// Remove a record; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Store backed by a single JSON array file, read and written whole.
///
/// A missing file is an empty store. Writes go through a temporary file
/// and a rename so a crash never leaves a half-written array behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ClothingItem>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SegmentationError::file_io_error("read wardrobe", &self.path, &e)),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&raw).map_err(|e| {
            SegmentationError::storage(format!("'{}' is not a valid wardrobe: {}", self.path.display(), e))
        })
    }

    async fn write_all(&self, items: &[ClothingItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SegmentationError::file_io_error("create wardrobe directory", parent, &e))?;
        }

        let encoded = serde_json::to_vec_pretty(items)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &encoded)
            .await
            .map_err(|e| SegmentationError::file_io_error("write wardrobe", &temp_path, &e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| SegmentationError::file_io_error("replace wardrobe", &self.path, &e))?;
        Ok(())
    }
}

#[async_trait]
impl ClothingStore for JsonFileStore {
    async fn save(&self, item: ClothingItem) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_all().await?;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        self.write_all(&items).await
    }

    async fn get_all(&self) -> Result<Vec<ClothingItem>> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_all().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write_all(&items).await?;
        Ok(true)
    }
}

/// Persist the segmentation results a user chose to keep.
///
/// Every item receives the same tags. Returns the stored records.
pub async fn save_segmented_items(
    store: &dyn ClothingStore,
    items: &[SegmentedClothingItem],
    tags: &[String],
) -> Result<Vec<ClothingItem>> {
    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        let record = ClothingItem::from_segmented(item, tags.to_vec());
        store.save(record.clone()).await?;
        saved.push(record);
    }
    tracing::info!(count = saved.len(), "saved segmented items to wardrobe");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClothingCategory, ImageRef, PixelRect};
    use tempfile::TempDir;

    fn segmented(category: ClothingCategory, uri: &str) -> SegmentedClothingItem {
        SegmentedClothingItem {
            category,
            crop_uri: ImageRef::from(uri),
            transparent_image_uri: None,
            bounding_box: PixelRect::new(0, 0, 10, 10),
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("wardrobe.json"));
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(!store.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_replaces_by_id_and_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("wardrobe.json"));

        let first = ClothingItem::from_segmented(&segmented(ClothingCategory::Top, "/a.png"), vec![]);
        let second = ClothingItem::from_segmented(&segmented(ClothingCategory::Bottom, "/b.png"), vec![]);
        store.save(first.clone()).await.unwrap();
        store.save(second.clone()).await.unwrap();

        let mut favorite = first.clone();
        favorite.is_favorite = true;
        store.save(favorite).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert!(all[0].is_favorite);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("wardrobe.json"));
        let item = ClothingItem::from_segmented(&segmented(ClothingCategory::Shoes, "/s.png"), vec![]);
        store.save(item.clone()).await.unwrap();

        assert!(store.delete(&item.id).await.unwrap());
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wardrobe.json");
        std::fs::write(&path, b"[{\"id\": \"half").unwrap();

        let store = JsonFileStore::new(&path);
        let err = store.get_all().await.unwrap_err();
        assert!(err.is_storage_error());
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_save_segmented_items() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("nested").join("wardrobe.json"));
        let items = vec![
            segmented(ClothingCategory::Top, "/top.png"),
            segmented(ClothingCategory::Bottom, "/bottom.png"),
        ];

        let saved = save_segmented_items(&store, &items, &["ootd".to_string()]).await.unwrap();
        assert_eq!(saved.len(), 2);

        let all = store.get_all().await.unwrap();
        assert_eq!(all, saved);
        assert!(all.iter().all(|item| item.tags == vec!["ootd".to_string()]));
    }
}
