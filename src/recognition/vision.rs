//! HTTP client for the `images:annotate` endpoint

use super::{AnnotationService, Feature, ImageAnnotations, LabelAnnotation};
use crate::config::PipelineConfig;
use crate::error::{Result, SegmentationError};
use crate::types::{DetectionCandidate, NormalizedPoint, NormalizedQuad};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE_NAME: &str = "vision";

// Request wire types

#[derive(Debug, Serialize)]
struct AnnotateRequestBody<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: &'a [Feature],
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

// Response wire types. Zero-valued fields are omitted by the service, so
// everything defaults.

#[derive(Debug, Deserialize)]
struct AnnotateResponseBody {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    localized_object_annotations: Vec<LocalizedObjectAnnotation>,
    #[serde(default)]
    label_annotations: Vec<WireLabel>,
    #[serde(default)]
    error: Option<WireStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalizedObjectAnnotation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    bounding_poly: BoundingPoly,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingPoly {
    #[serde(default)]
    normalized_vertices: Vec<WireVertex>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct WireVertex {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct WireLabel {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireStatus,
}

impl LocalizedObjectAnnotation {
    fn into_candidate(self) -> Option<DetectionCandidate> {
        let vertices: [WireVertex; 4] = match self.bounding_poly.normalized_vertices.try_into() {
            Ok(vertices) => vertices,
            Err(other) => {
                tracing::debug!(
                    label = %self.name,
                    vertices = other.len(),
                    "dropping annotation without a four-vertex polygon"
                );
                return None;
            },
        };

        Some(DetectionCandidate {
            label: self.name,
            score: self.score,
            normalized_box: NormalizedQuad(vertices.map(|v| NormalizedPoint::new(v.x, v.y))),
        })
    }
}

/// Encode the annotate request body for one image
pub fn encode_request(image: &[u8], features: &[Feature]) -> Result<String> {
    let body = AnnotateRequestBody {
        requests: [AnnotateImageRequest {
            image: ImageContent {
                content: base64::engine::general_purpose::STANDARD.encode(image),
            },
            features,
        }],
    };
    Ok(serde_json::to_string(&body)?)
}

/// Parse a successful annotate response body
///
/// # Errors
/// - [`SegmentationError::MalformedResponse`] for undecodable JSON
/// - [`SegmentationError::ServiceRejected`] for a per-image error status
pub fn parse_response(body: &str) -> Result<ImageAnnotations> {
    let parsed: AnnotateResponseBody = serde_json::from_str(body)
        .map_err(|e| SegmentationError::malformed(format!("annotate response: {}", e)))?;

    let response = parsed.responses.into_iter().next().unwrap_or_default();

    if let Some(status) = response.error {
        return Err(SegmentationError::rejected(
            SERVICE_NAME,
            u16::try_from(status.code).unwrap_or(0),
            status.message,
        ));
    }

    Ok(ImageAnnotations {
        labels: response
            .label_annotations
            .into_iter()
            .map(|label| LabelAnnotation {
                description: label.description,
                score: label.score,
            })
            .collect(),
        objects: response
            .localized_object_annotations
            .into_iter()
            .filter_map(LocalizedObjectAnnotation::into_candidate)
            .collect(),
    })
}

/// Human-readable message from an error response body, when present
#[must_use]
pub fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<WireErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error.message)
        .filter(|message| !message.is_empty())
}

/// Client for the remote label and object annotation service
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl VisionClient {
    /// Create a client from the pipeline configuration
    ///
    /// # Errors
    /// - [`SegmentationError::Configuration`] when the credential is missing or a placeholder
    /// - Failed to create HTTP client
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let api_key = config.vision.credential().ok_or_else(|| {
            SegmentationError::configuration("vision API key is missing or a placeholder")
        })?;

        let client = Client::builder()
            .timeout(config.recognition_timeout())
            .build()
            .map_err(|e| SegmentationError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.vision.endpoint.clone(),
            api_key: api_key.to_string(),
            timeout_secs: config.recognition_timeout_secs,
        })
    }
}

#[async_trait]
impl AnnotationService for VisionClient {
    #[tracing::instrument(skip(self, image), fields(bytes = image.len()))]
    async fn annotate(&self, image: &[u8], features: &[Feature]) -> Result<ImageAnnotations> {
        let body = encode_request(image, features)?;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SegmentationError::network_error("annotate request", &e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SegmentationError::network_error("annotate response", &e, self.timeout_secs))?;

        if !status.is_success() {
            let message = parse_error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            return Err(SegmentationError::rejected(SERVICE_NAME, status.as_u16(), message));
        }

        let annotations = parse_response(&text)?;
        tracing::debug!(
            objects = annotations.objects.len(),
            labels = annotations.labels.len(),
            "annotate call succeeded"
        );
        Ok(annotations)
    }
}
