use std::panic::{self, AssertUnwindSafe};

use super::ExtractionError;

/// Extracts PDF text page by page. A page with no text layer contributes an
/// empty string; only an unreadable document fails.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|payload| ExtractionError::Pdf(panic_message(payload.as_ref())))?
    .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let empty = pages.iter().filter(|p| p.trim().is_empty()).count();
    if empty > 0 {
        tracing::debug!("{} of {} PDF pages had no text", empty, pages.len());
    }

    Ok(pages.join(" "))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("parser aborted: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("parser aborted: {s}")
    } else {
        "parser aborted on malformed document".to_string()
    }
}
