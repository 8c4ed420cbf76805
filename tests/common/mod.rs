//! Fake collaborators and image fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wardrobe_segment::{
    recognition::{AnnotationService, Feature, ImageAnnotations, LabelAnnotation},
    BackgroundRemover, DetectionCandidate, ImageRef, NormalizedPoint,
    NormalizedQuad, Result, SegmentationError, UsageDecision, UsageLimiter,
};

/// How the fake annotation service answers
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    Respond(ImageAnnotations),
    NetworkFailure,
    Rejected(u16),
    Malformed,
    /// Never answers
    Hang,
}

/// Annotation service returning canned answers and recording requests
#[derive(Debug, Clone)]
pub struct FakeAnnotationService {
    behavior: FakeBehavior,
    call_history: Arc<Mutex<Vec<Vec<Feature>>>>,
}

impl FakeAnnotationService {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_objects(objects: Vec<DetectionCandidate>) -> Self {
        Self::new(FakeBehavior::Respond(ImageAnnotations {
            labels: Vec::new(),
            objects,
        }))
    }

    pub fn with_labels(labels: &[(&str, f32)]) -> Self {
        Self::new(FakeBehavior::Respond(ImageAnnotations {
            labels: labels
                .iter()
                .map(|(description, score)| LabelAnnotation {
                    description: (*description).to_string(),
                    score: *score,
                })
                .collect(),
            objects: Vec::new(),
        }))
    }

    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    pub fn call_history(&self) -> Vec<Vec<Feature>> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnnotationService for FakeAnnotationService {
    async fn annotate(&self, image: &[u8], features: &[Feature]) -> Result<ImageAnnotations> {
        assert!(!image.is_empty(), "annotation request without image bytes");
        self.call_history.lock().unwrap().push(features.to_vec());

        match &self.behavior {
            FakeBehavior::Respond(annotations) => Ok(annotations.clone()),
            FakeBehavior::NetworkFailure => {
                Err(SegmentationError::Network("connection refused".to_string()))
            },
            FakeBehavior::Rejected(status) => Err(SegmentationError::rejected(
                "vision",
                *status,
                "API key not valid",
            )),
            FakeBehavior::Malformed => Err(SegmentationError::malformed("unexpected end of input")),
            FakeBehavior::Hang => futures::future::pending().await,
        }
    }
}

/// Background remover that always fails
#[derive(Debug, Default)]
pub struct FailingRemover {
    pub calls: AtomicUsize,
}

#[async_trait]
impl BackgroundRemover for FailingRemover {
    async fn remove_background(&self, _image: &ImageRef) -> Result<ImageRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SegmentationError::rejected("remove.bg", 402, "Insufficient credits"))
    }

    fn removes_background(&self) -> bool {
        true
    }
}

/// Background remover that copies its input next to it with a `-nobg` suffix
#[derive(Debug, Default)]
pub struct CopyingRemover {
    pub processed: Mutex<Vec<ImageRef>>,
}

#[async_trait]
impl BackgroundRemover for CopyingRemover {
    async fn remove_background(&self, image: &ImageRef) -> Result<ImageRef> {
        let source = image.as_path();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = source.with_file_name(format!("{}-nobg.png", stem));
        tokio::fs::copy(source, &target).await?;
        self.processed.lock().unwrap().push(image.clone());
        Ok(ImageRef::new(target))
    }

    fn removes_background(&self) -> bool {
        true
    }
}

/// Usage collaborator with a fixed answer that counts increments
#[derive(Debug)]
pub struct CountingLimiter {
    allowed: bool,
    pub checks: AtomicUsize,
    pub increments: AtomicUsize,
}

impl CountingLimiter {
    pub fn allowing() -> Self {
        Self {
            allowed: true,
            checks: AtomicUsize::new(0),
            increments: AtomicUsize::new(0),
        }
    }

    pub fn denying() -> Self {
        Self {
            allowed: false,
            ..Self::allowing()
        }
    }

    pub fn increments(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageLimiter for CountingLimiter {
    async fn can_use_segmentation(&self) -> UsageDecision {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.allowed {
            UsageDecision::allow()
        } else {
            UsageDecision::deny("Monthly segmentation limit reached")
        }
    }

    async fn increment_segmentation_count(&self) {
        self.increments.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn candidate(label: &str, score: f32, x1: f64, y1: f64, x2: f64, y2: f64) -> DetectionCandidate {
    DetectionCandidate {
        label: label.to_string(),
        score,
        normalized_box: NormalizedQuad::from_corners(
            NormalizedPoint::new(x1, y1),
            NormalizedPoint::new(x2, y2),
        ),
    }
}

/// Write a gradient JPEG photo and return a reference to it
pub fn write_outfit_photo(dir: &Path, width: u32, height: u32) -> ImageRef {
    let mut image = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let intensity = ((x + y) % 200) as u8;
        *pixel = image::Rgb([intensity, 96, 255 - intensity]);
    }

    let path = dir.join("outfit.jpg");
    DynamicImage::ImageRgb8(image)
        .save_with_format(&path, ImageFormat::Jpeg)
        .unwrap();
    ImageRef::new(path)
}
