//! Category and tag suggestion through the recognizer factory and fakes

mod common;

use common::{write_outfit_photo, FakeAnnotationService, FakeBehavior};
use std::sync::Arc;
use tempfile::TempDir;
use wardrobe_segment::{
    create_recognizer, ClothingCategory, ClothingRecognizer, ImageRef, MockRecognizer,
    PipelineConfig, Recognizer,
};

#[tokio::test]
async fn test_factory_without_credential_is_deterministic_mock() {
    let recognizer = create_recognizer(&PipelineConfig::default());
    let photo = ImageRef::from("/wardrobe/inbox/IMG_0042.jpg");

    let first = recognizer.recognize(&photo).await.unwrap();
    let second = recognizer.recognize(&photo).await.unwrap();
    assert_eq!(first, second);
    assert!((1..=3).contains(&first.len()));
    assert!((first[0].confidence - 0.95).abs() < f32::EPSILON);
    assert!(first.windows(2).all(|pair| pair[0].confidence >= pair[1].confidence));
    assert!(first.iter().all(|s| s.confidence >= 0.5));

    let tags = recognizer.suggest_tags(&photo).await.unwrap();
    assert!(!tags.is_empty());
    assert_eq!(tags, MockRecognizer.suggest_tags(&photo).await.unwrap());
}

#[tokio::test]
async fn test_labels_become_suggestions_and_tags() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_outfit_photo(temp_dir.path(), 64, 64);
    let service = Arc::new(FakeAnnotationService::with_labels(&[
        ("T-shirt", 0.92),
        ("Sleeve", 0.88),
        ("Person", 0.8),
        ("Casual wear", 0.7),
        ("Jeans", 0.6),
    ]));
    let recognizer = ClothingRecognizer::new(service.clone(), &PipelineConfig::default());

    let suggestions = recognizer.recognize(&photo).await.unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].category, ClothingCategory::Top);
    assert!((suggestions[0].confidence - 0.92).abs() < f32::EPSILON);
    assert_eq!(suggestions[1].category, ClothingCategory::Bottom);

    let tags = recognizer.suggest_tags(&photo).await.unwrap();
    assert_eq!(tags, vec!["t-shirt", "sleeve", "casual wear", "jeans"]);
    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn test_service_failure_answers_with_mock() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_outfit_photo(temp_dir.path(), 64, 64);
    let service = Arc::new(FakeAnnotationService::new(FakeBehavior::Rejected(429)));
    let recognizer = ClothingRecognizer::new(service, &PipelineConfig::default());

    assert_eq!(
        recognizer.recognize(&photo).await.unwrap(),
        MockRecognizer.recognize(&photo).await.unwrap()
    );
    assert_eq!(
        recognizer.suggest_tags(&photo).await.unwrap(),
        MockRecognizer.suggest_tags(&photo).await.unwrap()
    );
}

#[tokio::test]
async fn test_people_only_labels_fall_back_to_mock_tags() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_outfit_photo(temp_dir.path(), 64, 64);
    let service = Arc::new(FakeAnnotationService::with_labels(&[("Person", 0.99), ("Face", 0.9)]));
    let recognizer = ClothingRecognizer::new(service, &PipelineConfig::default());

    assert!(recognizer.recognize(&photo).await.unwrap().is_empty());
    assert_eq!(
        recognizer.suggest_tags(&photo).await.unwrap(),
        MockRecognizer.suggest_tags(&photo).await.unwrap()
    );
}
