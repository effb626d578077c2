//! Analysis pipeline
//!
//! Orchestrates one upload end to end: input validation, staging,
//! the MRI-plausibility gate, classification, result shaping, and
//! (on the API path) history persistence. Steps run in a fixed order
//! and short-circuit on the first failure.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use neuroscan_common::config::ServiceConfig;
use neuroscan_common::db::{HistoryStore, NewAnalysis};
use neuroscan_common::disease::{DiseaseCatalog, DiseaseInfo};

use crate::analysis::plausibility::is_plausible_mri;
use crate::analysis::staged::StagedUpload;
use crate::services::classifier::{Classification, ClassifierError, TumorClassifier};

/// Label substituted when the classifier reports no detection
pub const NO_TUMOR_LABEL: &str = "No Tumor";

/// Patient metadata accompanying an API-path analysis request.
/// Fields arrive as form strings; absent fields are empty.
#[derive(Debug, Default, Clone)]
pub struct PatientForm {
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_number: String,
    pub medical_history: String,
}

impl PatientForm {
    /// Names of required fields that are absent or empty, using the API
    /// field names the caller submitted them under.
    pub fn missing_required(&self) -> Vec<String> {
        let required = [
            ("name", &self.name),
            ("dateOfBirth", &self.date_of_birth),
            ("gender", &self.gender),
            ("contactNumber", &self.contact_number),
        ];
        required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field.to_string())
            .collect()
    }
}

/// Shaped analysis result, ready for JSON or template rendering
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub tumor_type: String,
    /// Percentage in [0, 100], rounded to 2 decimal places
    pub confidence: f64,
    pub disease_info: DiseaseInfo,
}

/// Pipeline failures.
///
/// The first four variants are client input / content problems and map
/// to 4xx responses; classifier and storage failures are infrastructure
/// errors and must never be silently converted into a valid-looking
/// result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No image provided")]
    MissingImage,

    #[error("Invalid file type. Please upload a valid image file (PNG, JPG, JPEG, DCM)")]
    InvalidFileType,

    #[error("Missing required fields")]
    MissingFields(Vec<String>),

    #[error("The uploaded image does not appear to be a valid MRI scan. Please upload a proper MRI image.")]
    NotAnMriScan,

    #[error("Classifier failure: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Storage failure: {0}")]
    Storage(#[from] neuroscan_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Whether the failure was caused by the request rather than the
    /// service or its collaborators
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingImage
                | AnalysisError::InvalidFileType
                | AnalysisError::MissingFields(_)
                | AnalysisError::NotAnMriScan
        )
    }
}

/// The one component with cross-cutting business logic: everything the
/// HTTP layer does is mapped onto these two entry points.
pub struct AnalysisPipeline {
    config: ServiceConfig,
    classifier: Arc<dyn TumorClassifier>,
    diseases: DiseaseCatalog,
    store: HistoryStore,
}

impl AnalysisPipeline {
    pub fn new(
        config: ServiceConfig,
        classifier: Arc<dyn TumorClassifier>,
        diseases: DiseaseCatalog,
        store: HistoryStore,
    ) -> Self {
        Self {
            config,
            classifier,
            diseases,
            store,
        }
    }

    /// Display path: validate, gate, classify, and shape. Nothing is
    /// persisted.
    pub async fn analyze_for_display(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<AnalysisReport, AnalysisError> {
        let (report, _) = self.run(bytes, filename, None).await?;
        Ok(report)
    }

    /// API path: same core steps plus required-field validation and a
    /// history insert. Returns the shaped report and the assigned
    /// record id.
    pub async fn analyze_for_api(
        &self,
        bytes: &[u8],
        filename: &str,
        patient: &PatientForm,
    ) -> Result<(AnalysisReport, i64), AnalysisError> {
        let (report, id) = self.run(bytes, filename, Some(patient)).await?;
        // id is always assigned on the API path
        Ok((report, id.unwrap_or_default()))
    }

    async fn run(
        &self,
        bytes: &[u8],
        filename: &str,
        patient: Option<&PatientForm>,
    ) -> Result<(AnalysisReport, Option<i64>), AnalysisError> {
        // 1. Presence
        if bytes.is_empty() || filename.is_empty() {
            return Err(AnalysisError::MissingImage);
        }

        // 2. Extension allow-list
        if !self.config.extension_allowed(filename) {
            return Err(AnalysisError::InvalidFileType);
        }

        // 3. Required patient fields (API path only)
        if let Some(patient) = patient {
            let missing = patient.missing_required();
            if !missing.is_empty() {
                return Err(AnalysisError::MissingFields(missing));
            }
        }

        // 4. Stage to disk; the guard removes the file on every exit
        //    path from here on
        let staged = StagedUpload::create(&self.config.upload_dir, bytes)?;
        debug!("staged upload at {}", staged.path().display());

        // 5. Decode + plausibility gate. A file that cannot be decoded
        //    is not a scan; that is a verdict, not a fault. Format is
        //    sniffed from content, since staged names always end in .jpg.
        let decoded = image::ImageReader::open(staged.path())
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode());
        let plausible = match decoded {
            Ok(decoded) => is_plausible_mri(&decoded.to_luma8()),
            Err(e) => {
                debug!("decode failed for {}: {}", staged.path().display(), e);
                false
            }
        };
        if !plausible {
            return Err(AnalysisError::NotAnMriScan);
        }

        // 6. Classify; the no-detection mapping happens here and only here
        let (label, confidence) = match self.classifier.classify(staged.path()).await? {
            Classification::Classified { label, confidence } => (label, confidence),
            Classification::NoDetection => (NO_TUMOR_LABEL.to_string(), 0.0),
        };

        // 7. Shape
        let report = AnalysisReport {
            disease_info: self.diseases.lookup(&label),
            confidence: confidence_percent(confidence),
            tumor_type: label,
        };

        // 8. Persist (API path only)
        let id = match patient {
            Some(patient) => {
                let id = self
                    .store
                    .insert(&NewAnalysis {
                        patient_name: patient.name.clone(),
                        date_of_birth: patient.date_of_birth.clone(),
                        gender: patient.gender.clone(),
                        contact_number: patient.contact_number.clone(),
                        medical_history: patient.medical_history.clone(),
                        tumor_type: report.tumor_type.clone(),
                        confidence: report.confidence,
                        image_path: staged.path_string(),
                    })
                    .await?;
                info!(
                    "recorded analysis {} ({} at {:.2}%)",
                    id, report.tumor_type, report.confidence
                );
                Some(id)
            }
            None => None,
        };

        Ok((report, id))
    }
}

/// Scale a [0, 1] confidence to a percentage rounded to 2 decimals
fn confidence_percent(confidence: f64) -> f64 {
    (confidence * 100.0 * 100.0).round() / 100.0
}
