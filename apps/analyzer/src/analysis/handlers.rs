//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{AnalysisResult, ResumeCategory};
use crate::analysis::orchestrator::truncate_chars;
use crate::errors::AppError;
use crate::extraction::{self, DocumentFormat};
use crate::state::AppState;

/// Characters of extracted text returned as a preview.
const PREVIEW_CHARS: usize = 3000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub format: DocumentFormat,
    pub characters: usize,
    pub text: String,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub configured: Vec<String>,
    pub installed: Vec<String>,
}

/// The parts of a multipart upload the handlers care about.
#[derive(Debug)]
struct Upload {
    file_name: String,
    bytes: Bytes,
    category: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/extract
///
/// Extracts text from an uploaded PDF / DOCX without analyzing it.
pub async fn handle_extract(multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let format = upload_format(&upload.file_name)?;
    let text = extract_blocking(upload.bytes, format).await?;

    Ok(Json(ExtractResponse {
        format,
        characters: text.chars().count(),
        preview: truncate_chars(&text, PREVIEW_CHARS).to_string(),
        text,
    }))
}

/// POST /api/v1/resumes/analyze
///
/// Multipart `file` + `category`. Extraction failures are the only error
/// response; everything after extraction comes back as an `AnalysisResult`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let upload = read_upload(multipart).await?;
    let category = parse_category(upload.category.as_deref().unwrap_or_default())?;
    let format = upload_format(&upload.file_name)?;

    info!(
        "Analyzing upload {} ({}, {} bytes) as {}",
        upload.file_name,
        format,
        upload.bytes.len(),
        category
    );
    let text = extract_blocking(upload.bytes, format).await?;

    let result = state.analyzer.analyze(&text, category).await;
    log_outcome(&result);
    Ok(Json(result))
}

/// POST /api/v1/resumes/analyze-text
///
/// Analyzes résumé text that was extracted earlier.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let category = parse_category(&request.category)?;
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let result = state.analyzer.analyze(&request.text, category).await;
    log_outcome(&result);
    Ok(Json(result))
}

/// GET /api/v1/models
///
/// Configured fallback order next to what the backend actually has installed.
pub async fn handle_list_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let installed = state.analyzer.backend().list_models().await?;
    Ok(Json(ModelsResponse {
        configured: state.analyzer.policy().models.clone(),
        installed,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut category = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((file_name, bytes));
            }
            Some("category") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read category: {e}")))?;
                category = Some(value);
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("a 'file' field is required".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    Ok(Upload {
        file_name,
        bytes,
        category,
    })
}

fn log_outcome(result: &AnalysisResult) {
    if let Some(record) = result.as_record() {
        if record.is_sample() {
            warn!("Responding with {} sample data", record.category);
        } else {
            info!(
                "Responding with {} record from {}",
                record.category,
                record.model.as_deref().unwrap_or("unknown model")
            );
        }
    } else if let Some(error) = result.as_error() {
        warn!("Responding with error record: {}", error.error);
    }
}

fn upload_format(file_name: &str) -> Result<DocumentFormat, AppError> {
    DocumentFormat::from_filename(file_name).ok_or_else(|| {
        AppError::Validation(format!(
            "unsupported file '{file_name}': only .pdf and .docx resumes are accepted"
        ))
    })
}

fn parse_category(raw: &str) -> Result<ResumeCategory, AppError> {
    raw.parse::<ResumeCategory>().map_err(AppError::Validation)
}

/// Document parsing is CPU-bound, so it runs off the async workers.
async fn extract_blocking(bytes: Bytes, format: DocumentFormat) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extraction::extract(&bytes, format))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))??;
    Ok(text)
}
