//! Shared value types for the segmentation pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Closed set of wardrobe categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClothingCategory {
    Top,
    Bottom,
    Dress,
    Outerwear,
    Shoes,
    Accessories,
}

impl ClothingCategory {
    /// All categories in canonical order
    pub const ALL: [ClothingCategory; 6] = [
        Self::Top,
        Self::Bottom,
        Self::Dress,
        Self::Outerwear,
        Self::Shoes,
        Self::Accessories,
    ];

    /// Lower-case identifier used in persisted records
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Dress => "dress",
            Self::Outerwear => "outerwear",
            Self::Shoes => "shoes",
            Self::Accessories => "accessories",
        }
    }
}

impl fmt::Display for ClothingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a local image artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// String form of the reference, as shown to and stored by callers
    #[must_use]
    pub fn as_uri(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for ImageRef {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

/// A point in normalized image coordinates (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding quadrilateral in the order top-left, top-right, bottom-right, bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuad(pub [NormalizedPoint; 4]);

impl NormalizedQuad {
    /// Axis-aligned quad spanning two corners
    #[must_use]
    pub const fn from_corners(top_left: NormalizedPoint, bottom_right: NormalizedPoint) -> Self {
        Self([
            top_left,
            NormalizedPoint::new(bottom_right.x, top_left.y),
            bottom_right,
            NormalizedPoint::new(top_left.x, bottom_right.y),
        ])
    }

    #[must_use]
    pub const fn top_left(&self) -> NormalizedPoint {
        self.0[0]
    }

    #[must_use]
    pub const fn bottom_right(&self) -> NormalizedPoint {
        self.0[2]
    }
}

/// One localized object as returned by the annotation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    /// Raw service label
    pub label: String,
    /// Detection score in [0, 1]
    pub score: f32,
    pub normalized_box: NormalizedQuad,
}

/// Integer pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A category guess for a whole image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: ClothingCategory,
    pub confidence: f32,
}

/// One garment extracted from an outfit photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedClothingItem {
    pub category: ClothingCategory,
    /// Plain cropped artifact
    pub crop_uri: ImageRef,
    /// Background-removed artifact, when removal actually ran and succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_image_uri: Option<ImageRef>,
    pub bounding_box: PixelRect,
    pub confidence: f32,
}

impl SegmentedClothingItem {
    /// Image to display: the transparent version if there is one, else the crop
    #[must_use]
    pub fn image_uri(&self) -> &ImageRef {
        self.transparent_image_uri.as_ref().unwrap_or(&self.crop_uri)
    }

    #[must_use]
    pub fn background_removed(&self) -> bool {
        self.transparent_image_uri.is_some()
    }
}

/// Wardrobe record owned by the storage collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: String,
    pub image_uri: ImageRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_image_uri: Option<ImageRef>,
    pub category: ClothingCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl ClothingItem {
    /// Build a new wardrobe record from a segmentation result
    #[must_use]
    pub fn from_segmented(item: &SegmentedClothingItem, tags: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            image_uri: item.crop_uri.clone(),
            transparent_image_uri: item.transparent_image_uri.clone(),
            category: item.category,
            tags,
            created_at: Utc::now(),
            is_favorite: false,
        }
    }
}
