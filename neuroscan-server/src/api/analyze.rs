//! Analysis endpoints
//!
//! `POST /predict` is the display path (HTML in, HTML out);
//! `POST /predict_api` is the JSON path that also persists a history
//! record. Both accept a multipart form with an `image` part; the API
//! path additionally carries the patient fields as text parts.

use std::collections::HashMap;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde_json::json;

use crate::analysis::{AnalysisReport, PatientForm};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Decoded multipart upload: the image part plus any text fields
struct UploadForm {
    filename: String,
    image: Vec<u8>,
    fields: HashMap<String, String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut filename = String::new();
    let mut image = Vec::new();
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            filename = field.file_name().unwrap_or_default().to_string();
            image = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
                .to_vec();
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
    }

    Ok(UploadForm {
        filename,
        image,
        fields,
    })
}

impl UploadForm {
    fn patient(&self) -> PatientForm {
        let get = |key: &str| self.fields.get(key).cloned().unwrap_or_default();
        PatientForm {
            name: get("name"),
            date_of_birth: get("dateOfBirth"),
            gender: get("gender"),
            contact_number: get("contactNumber"),
            medical_history: get("medicalHistory"),
        }
    }
}

/// POST /predict
///
/// Display path: runs the pipeline without persistence and renders the
/// outcome as HTML. Validation failures render an error page rather
/// than an error status, matching form-post ergonomics.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let form = match read_upload(multipart).await {
        Ok(form) => form,
        Err(e) => {
            return Ok(Html(render_error_page(&e.to_string())));
        }
    };

    match state
        .pipeline
        .analyze_for_display(&form.image, &form.filename)
        .await
    {
        Ok(report) => Ok(Html(render_result_page(&report))),
        Err(err) if err.is_client_error() => Ok(Html(render_error_page(&err.to_string()))),
        Err(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(render_error_page("Internal server error")),
        )),
    }
}

/// POST /predict_api
///
/// JSON path: validates patient fields, runs the pipeline, persists a
/// history record, and returns the shaped result.
pub async fn predict_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let form = read_upload(multipart).await?;
    let patient = form.patient();

    let (report, _id) = state
        .pipeline
        .analyze_for_api(&form.image, &form.filename, &patient)
        .await?;

    Ok(Json(json!({
        "tumor_type": report.tumor_type,
        "confidence": report.confidence,
        "disease_info": report.disease_info,
    })))
}

fn render_result_page(report: &AnalysisReport) -> String {
    let info = &report.disease_info;
    let details = if info.description.is_empty() {
        String::new()
    } else {
        format!(
            "<dl>\
             <dt>Description</dt><dd>{}</dd>\
             <dt>Causes</dt><dd>{}</dd>\
             <dt>Treatment</dt><dd>{}</dd>\
             </dl>",
            info.description, info.causes, info.treatment
        )
    };

    format!(
        "<!DOCTYPE html><html><head><title>Analysis Result</title></head><body>\
         <h1>Analysis Result</h1>\
         <p><strong>Prediction:</strong> {}</p>\
         <p><strong>Confidence:</strong> {:.2}%</p>\
         {}\
         <p><a href=\"/\">Analyze another scan</a></p>\
         </body></html>",
        report.tumor_type, report.confidence, details
    )
}

fn render_error_page(message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Analysis Result</title></head><body>\
         <h1>Analysis Result</h1>\
         <p class=\"error\">{}</p>\
         <p><a href=\"/\">Try again</a></p>\
         </body></html>",
        message
    )
}
