// Document Extractor
// Turns uploaded PDF / DOCX bytes into one whitespace-normalized string.
// Parsing is CPU-bound; async callers must run `extract` inside tokio::task::spawn_blocking.

pub mod docx;
pub mod pdf;

use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("No text could be extracted from the {0} document")]
    NoText(DocumentFormat),
}

/// Upload formats the extractor understands, derived from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Returns `None` for anything other than a `.pdf` or `.docx` name (case-insensitive).
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => f.write_str("PDF"),
            DocumentFormat::Docx => f.write_str("DOCX"),
        }
    }
}

/// Extracts and cleans the text of a document held in memory.
///
/// Never returns an empty string: a document with no extractable text is
/// an `ExtractionError::NoText`.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    let raw = match format {
        DocumentFormat::Pdf => pdf::extract_pdf(bytes)?,
        DocumentFormat::Docx => docx::extract_docx(bytes)?,
    };

    let text = collapse_whitespace(&raw);
    if text.is_empty() {
        return Err(ExtractionError::NoText(format));
    }

    tracing::debug!(
        "Extracted {} characters from {} ({} bytes)",
        text.chars().count(),
        format,
        bytes.len()
    );
    Ok(text)
}

/// Collapses every whitespace run (newlines included) into a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
