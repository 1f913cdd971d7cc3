//! Analysis Orchestrator: résumé text in, `AnalysisResult` out.
//!
//! Flow: truncate → build prompt → for each configured model:
//!       chat_complete (bounded wait) → normalize → first success wins.
//! Exhausted: fallback sample data → otherwise an `ErrorRecord`.
//!
//! `analyze` never returns an error to its caller. Every failure past
//! extraction resolves into a value the presentation layer can render.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analysis::mock::{FallbackProvider, MockDataGenerator};
use crate::analysis::models::{
    AnalysisResult, AnalyzedRecord, ErrorRecord, ResumeCategory, StructuredRecord,
};
use crate::analysis::normalizer::{normalize, NormalizationError};
use crate::analysis::prompts::{schema_for, ANALYSIS_PROMPT_TEMPLATE};
use crate::config::Config;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, MISSING_DATA_INSTRUCTION};
use crate::llm_client::{ChatBackend, ChatMessage, DecodingOptions, LlmError};

// ────────────────────────────────────────────────────────────────────────────
// Policy
// ────────────────────────────────────────────────────────────────────────────

/// Static analysis policy: which models to try, in what order, and how.
#[derive(Debug, Clone)]
pub struct AnalysisPolicy {
    /// Ordered fallback list; each entry gets exactly one attempt.
    pub models: Vec<String>,
    /// Résumé text is cut to this many characters before prompting.
    pub max_resume_chars: usize,
    pub temperature: f32,
    /// Bounded wait per attempt. An expired wait counts as a backend failure.
    pub attempt_timeout: Option<Duration>,
}

impl AnalysisPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            models: config.models.clone(),
            max_resume_chars: config.max_resume_chars,
            temperature: config.temperature,
            attempt_timeout: config.model_timeout,
        }
    }
}

/// Why a single model attempt did not produce a record.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("backend error: {0}")]
    Backend(#[from] LlmError),

    #[error("no reply within {}s", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("unusable reply: {error}")]
    Unparsable {
        error: NormalizationError,
        raw: String,
    },
}

struct FailedAttempt {
    model: String,
    failure: AttemptFailure,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

/// Runs analyses against a model backend. Holds no per-request state, so one
/// instance is shared by every request.
#[derive(Clone)]
pub struct Analyzer {
    backend: Arc<dyn ChatBackend>,
    policy: Arc<AnalysisPolicy>,
    fallback: Option<Arc<dyn FallbackProvider>>,
}

impl Analyzer {
    /// Creates an analyzer that falls back to `MockDataGenerator` samples.
    pub fn new(backend: Arc<dyn ChatBackend>, policy: AnalysisPolicy) -> Self {
        let fallback: Arc<dyn FallbackProvider> = Arc::new(MockDataGenerator);
        Self {
            backend,
            policy: Arc::new(policy),
            fallback: Some(fallback),
        }
    }

    /// Replaces the fallback. `None` turns exhaustion into an `ErrorRecord`.
    pub fn with_fallback(mut self, fallback: Option<Arc<dyn FallbackProvider>>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn policy(&self) -> &AnalysisPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    /// Analyzes résumé text for `category`.
    pub async fn analyze(&self, text: &str, category: ResumeCategory) -> AnalysisResult {
        if text.trim().is_empty() {
            return AnalysisResult::Error(ErrorRecord {
                error: "Analysis failed: no resume text".to_string(),
                details: "The extracted resume text is empty.".to_string(),
                raw_response: None,
                suggestion: "Upload a PDF or DOCX resume that contains selectable text."
                    .to_string(),
                available_models: None,
            });
        }

        let prompt = build_prompt(text, category, self.policy.max_resume_chars);
        let messages = [ChatMessage::user(prompt)];
        let options = DecodingOptions {
            temperature: self.policy.temperature,
        };
        info!(
            "Analyzing {} resume ({} chars) with models {:?}",
            category,
            text.chars().count(),
            self.policy.models
        );

        let mut failures: Vec<FailedAttempt> = Vec::new();

        for model in &self.policy.models {
            let started = Instant::now();
            match self.attempt(model, &messages, &options, category).await {
                Ok(record) => {
                    let elapsed = started.elapsed();
                    info!(
                        "Model {} produced a {} record in {:.2}s",
                        model,
                        category,
                        elapsed.as_secs_f64()
                    );
                    let profile = record.profile();
                    debug!(
                        "Record for '{}': {} education, {} skills, email {}",
                        profile.name(),
                        profile.education().len(),
                        profile.skills().len(),
                        if profile.contact().email.is_empty() { "missing" } else { "present" }
                    );
                    return AnalysisResult::Record(AnalyzedRecord::from_model(
                        record, model, elapsed,
                    ));
                }
                Err(failure) => {
                    warn!("Model {} failed: {}", model, failure);
                    failures.push(FailedAttempt {
                        model: model.clone(),
                        failure,
                    });
                }
            }
        }

        self.exhausted(category, failures).await
    }

    /// One independent model attempt: same prompt, no state carried between attempts.
    async fn attempt(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &DecodingOptions,
        category: ResumeCategory,
    ) -> Result<StructuredRecord, AttemptFailure> {
        let call = self.backend.chat_complete(model, messages, options);
        let raw = match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AttemptFailure::TimedOut(limit))??,
            None => call.await?,
        };
        debug!("Model {} replied with {} chars", model, raw.len());

        normalize(&raw, category).map_err(|error| AttemptFailure::Unparsable { error, raw })
    }

    /// Every model failed: sample data if possible, otherwise a diagnostic record.
    async fn exhausted(
        &self,
        category: ResumeCategory,
        failures: Vec<FailedAttempt>,
    ) -> AnalysisResult {
        let mut details = summarize(&failures);

        if let Some(fallback) = &self.fallback {
            match fallback.generate(category) {
                Ok(record) => {
                    warn!(
                        "All {} model attempts failed; returning {} sample data",
                        failures.len(),
                        category
                    );
                    return AnalysisResult::Record(AnalyzedRecord::sample(record));
                }
                Err(e) => {
                    error!("Sample data fallback failed: {e}");
                    details = format!("{e}. {details}");
                }
            }
        }

        let raw_response = failures.iter().rev().find_map(|f| match &f.failure {
            AttemptFailure::Unparsable { raw, .. } => Some(raw.clone()),
            _ => None,
        });

        let available_models = self.available_models().await;
        let first_model = self
            .policy
            .models
            .first()
            .map(String::as_str)
            .unwrap_or("llama3");

        error!("Analysis exhausted all fallbacks for {} resume", category);
        AnalysisResult::Error(ErrorRecord {
            error: "Analysis failed: all models failed".to_string(),
            details,
            raw_response,
            suggestion: format!(
                "Verify the Ollama backend is running and the model is installed: ollama pull {first_model}"
            ),
            available_models,
        })
    }

    /// Best-effort model listing for diagnostics.
    async fn available_models(&self) -> Option<Vec<String>> {
        let listing = self.backend.list_models();
        let result = match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, listing).await.ok()?,
            None => listing.await,
        };
        match result {
            Ok(models) => Some(models),
            Err(e) => {
                debug!("Could not list backend models: {e}");
                None
            }
        }
    }
}

fn summarize(failures: &[FailedAttempt]) -> String {
    if failures.is_empty() {
        return "No models are configured.".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.model, f.failure))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds the analysis prompt for `category` over at most `max_chars` characters of text.
pub fn build_prompt(text: &str, category: ResumeCategory, max_chars: usize) -> String {
    let schema = serde_json::to_string_pretty(&schema_for(category)).unwrap_or_default();
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{category}", &category.as_str().to_lowercase())
        .replace("{schema_json}", &schema)
        .replace("{json_only_instruction}", JSON_ONLY_INSTRUCTION)
        .replace("{missing_data_instruction}", MISSING_DATA_INSTRUCTION)
        .replace("{resume_text}", truncate_chars(text, max_chars))
}

/// Returns the first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
