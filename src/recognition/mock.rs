//! Deterministic offline recognizer
//!
//! Results are a pure function of the image reference string, so the same
//! photo always gets the same suggestions within and across sessions.

use super::Recognizer;
use crate::error::Result;
use crate::types::{CategorySuggestion, ClothingCategory, ImageRef};
use async_trait::async_trait;

const FIRST_CONFIDENCE: f32 = 0.95;
const CONFIDENCE_STEP: f32 = 0.15;
const MIN_CONFIDENCE: f32 = 0.5;

/// Tag bundles handed out by the mock
pub const TAG_BUNDLES: &[&[&str]] = &[
    &["casual", "everyday", "comfortable"],
    &["formal", "elegant", "office"],
    &["sporty", "active", "breathable"],
    &["summer", "light", "bright"],
    &["winter", "warm", "layered"],
    &["vintage", "classic"],
];

/// Sum of the UTF-16 code units of the reference string
#[must_use]
pub fn reference_hash(image: &ImageRef) -> usize {
    image
        .as_uri()
        .encode_utf16()
        .fold(0usize, |acc, unit| acc.wrapping_add(usize::from(unit)))
}

/// One to three category guesses with descending confidence
#[must_use]
pub fn mock_suggestions(image: &ImageRef) -> Vec<CategorySuggestion> {
    let hash = reference_hash(image);
    let count = hash % 3 + 1;
    let categories = ClothingCategory::ALL;

    (0..count)
        .map(|i| CategorySuggestion {
            category: categories[(hash + i) % categories.len()],
            confidence: (FIRST_CONFIDENCE - CONFIDENCE_STEP * i as f32).max(MIN_CONFIDENCE),
        })
        .collect()
}

/// Tag bundle selected by the reference hash
#[must_use]
pub fn mock_tags(image: &ImageRef) -> Vec<String> {
    let bundle = TAG_BUNDLES[reference_hash(image) % TAG_BUNDLES.len()];
    bundle.iter().map(|tag| (*tag).to_string()).collect()
}

/// Recognizer used when no vision credential is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRecognizer;

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(&self, image: &ImageRef) -> Result<Vec<CategorySuggestion>> {
        Ok(mock_suggestions(image))
    }

    async fn suggest_tags(&self, image: &ImageRef) -> Result<Vec<String>> {
        Ok(mock_tags(image))
    }
}
