//! Tumor classifier client
//!
//! The classifier itself is an external collaborator (an inference
//! service holding the trained model); this module defines the call
//! contract the pipeline consumes and the HTTP implementation of it.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("NeuroScan/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Classifier call errors.
///
/// These are infrastructure failures and are never mapped to a
/// diagnostic result; only an explicit no-detection answer from the
/// classifier is.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Classifier API error {0}: {1}")]
    Api(u16, String),

    #[error("Classifier response parse error: {0}")]
    Parse(String),

    #[error("IO error reading staged image: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one classifier invocation.
///
/// `NoDetection` is the classifier's explicit "no probability
/// distribution available" answer; mapping it to a displayable result
/// is the pipeline's job, performed in exactly one place.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Classified { label: String, confidence: f64 },
    NoDetection,
}

/// Call contract for the external tumor classifier
#[async_trait]
pub trait TumorClassifier: Send + Sync {
    async fn classify(&self, image: &Path) -> Result<Classification, ClassifierError>;
}

/// Wire format of the inference endpoint: a null label means the
/// classifier produced no detection.
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: Option<String>,
    confidence: Option<f64>,
}

/// HTTP client for a classifier inference endpoint
pub struct HttpClassifier {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: String) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl TumorClassifier for HttpClassifier {
    async fn classify(&self, image: &Path) -> Result<Classification, ClassifierError> {
        let bytes = tokio::fs::read(image).await?;
        let filename = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("image/jpeg")
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), body));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        match parsed.label {
            Some(label) => Ok(Classification::Classified {
                label,
                confidence: parsed.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            }),
            None => Ok(Classification::NoDetection),
        }
    }
}
