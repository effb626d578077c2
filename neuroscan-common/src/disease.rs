//! Static disease reference information
//!
//! Descriptive metadata keyed by classifier label, independent of any
//! single request. Built once at startup and shared read-only; a lookup
//! miss yields an empty record, never an error.

use serde::Serialize;
use std::collections::HashMap;

/// Descriptive metadata for one tumor category.
///
/// All fields empty means "no information" and serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DiseaseInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub causes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub treatment: String,
}

impl DiseaseInfo {
    fn new(description: &str, causes: &str, treatment: &str) -> Self {
        Self {
            description: description.to_string(),
            causes: causes.to_string(),
            treatment: treatment.to_string(),
        }
    }
}

/// Immutable catalog of disease information for the classifier label set
#[derive(Debug, Clone)]
pub struct DiseaseCatalog {
    entries: HashMap<String, DiseaseInfo>,
}

impl DiseaseCatalog {
    /// Catalog covering the closed label set the classifier can emit
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();

        entries.insert(
            "Glioma".to_string(),
            DiseaseInfo::new(
                "A type of brain tumor that starts in the glial cells.",
                "Genetic mutations, exposure to radiation.",
                "Surgery, radiation therapy, chemotherapy.",
            ),
        );
        entries.insert(
            "Meningioma".to_string(),
            DiseaseInfo::new(
                "A tumor that forms on the meninges, the protective layers of the brain and spinal cord.",
                "Genetic factors, hormonal factors.",
                "Surgery, radiation therapy, observation if slow-growing.",
            ),
        );
        entries.insert(
            "Pituitary".to_string(),
            DiseaseInfo::new(
                "Tumors that form in the pituitary gland, which controls hormones.",
                "Genetic factors, hormonal imbalances.",
                "Surgery, radiation therapy, hormone replacement therapy.",
            ),
        );
        entries.insert(
            "No Tumor".to_string(),
            DiseaseInfo::new("No abnormal tumor detected.", "N/A", "N/A"),
        );

        Self { entries }
    }

    /// Look up the record for a label; unknown labels yield an empty record
    pub fn lookup(&self, label: &str) -> DiseaseInfo {
        self.entries.get(label).cloned().unwrap_or_default()
    }
}
