//! Core analysis logic: plausibility gate, staged-upload lifecycle,
//! and the validation → inference → persistence pipeline.

pub mod pipeline;
pub mod plausibility;
pub mod staged;

pub use pipeline::{AnalysisError, AnalysisPipeline, AnalysisReport, PatientForm};
