// Résumé analysis
// Implements: record models, response normalization, sample-data fallback,
// prompt construction, multi-model orchestration.
// All backend calls go through llm_client; nothing here speaks HTTP to the model.

pub mod handlers;
pub mod mock;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;

pub use models::{AnalysisResult, ResumeCategory};
pub use orchestrator::{AnalysisPolicy, Analyzer};
