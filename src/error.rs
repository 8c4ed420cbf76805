//! Error types for the clothing segmentation pipeline

use thiserror::Error;

/// Result type alias for segmentation pipeline operations
pub type Result<T> = std::result::Result<T, SegmentationError>;

/// Error taxonomy for recognition, segmentation and background removal
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or placeholder service credential
    #[error("Service not configured: {0}")]
    Configuration(String),

    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure talking to a remote service
    #[error("Network error: {0}")]
    Network(String),

    /// Client-side timeout expired before the remote service answered
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// Remote service answered with a non-success status
    #[error("{service} rejected the request ({status}): {message}")]
    ServiceRejected {
        service: String,
        status: u16,
        message: String,
    },

    /// Response body could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Degenerate bounding geometry
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// Region extraction failure
    #[error("Crop failed: {0}")]
    Crop(String),

    /// The service was reached but nothing in the photo maps to clothing
    #[error("no clothing items detected")]
    NoClothingDetected,

    /// A written artifact is missing or empty
    #[error("Artifact integrity check failed: {0}")]
    ArtifactIntegrity(String),

    /// Persisted wardrobe records could not be read back
    #[error("Storage integrity error: {0}")]
    StorageIntegrity(String),

    /// The usage collaborator refused segmentation
    #[error("Segmentation not allowed: {0}")]
    UsageDenied(String),

    /// The caller cancelled the pipeline
    #[error("Segmentation cancelled")]
    Cancelled,
}

impl SegmentationError {
    /// Create a new configuration (credential) error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a new geometry error
    pub fn geometry<S: Into<String>>(msg: S) -> Self {
        Self::Geometry(msg.into())
    }

    /// Create a new crop error
    pub fn crop<S: Into<String>>(msg: S) -> Self {
        Self::Crop(msg.into())
    }

    /// Create a new storage integrity error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::StorageIntegrity(msg.into())
    }

    /// Create a timeout error for the named operation
    pub fn timeout<S: Into<String>>(operation: S, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Create a service rejection error
    pub fn rejected<S: Into<String>, M: Into<String>>(service: S, status: u16, message: M) -> Self {
        Self::ServiceRejected {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    // Contextual error creators

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Map a transport error, keeping timeouts distinguishable
    pub fn network_error(operation: &str, error: &reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            return Self::timeout(operation, timeout_secs);
        }
        Self::Network(format!("{}: {}", operation, error))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Whether the orchestrator may mask this error with its mock fallback
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Image(_)
                | Self::Json(_)
                | Self::Configuration(_)
                | Self::Network(_)
                | Self::Timeout { .. }
                | Self::ServiceRejected { .. }
                | Self::MalformedResponse(_)
                | Self::Crop(_)
                | Self::ArtifactIntegrity(_)
        )
    }

    /// Whether this error originates at the storage collaborator boundary
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::StorageIntegrity(_))
    }
}
