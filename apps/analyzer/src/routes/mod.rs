pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/models", get(handlers::handle_list_models))
        .route("/api/v1/resumes/extract", post(handlers::handle_extract))
        .route("/api/v1/resumes/analyze", post(handlers::handle_analyze))
        .route(
            "/api/v1/resumes/analyze-text",
            post(handlers::handle_analyze_text),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::{AnalysisPolicy, Analyzer};
    use crate::config::Config;
    use crate::llm_client::{ChatBackend, ChatMessage, DecodingOptions, LlmError};

    /// Backend that answers every chat with the same reply.
    struct FixedBackend(&'static str);

    #[async_trait]
    impl ChatBackend for FixedBackend {
        async fn chat_complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _options: &DecodingOptions,
        ) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        async fn list_models(&self) -> Result<Vec<String>, LlmError> {
            Ok(vec!["llama3:latest".to_string()])
        }
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            rust_log: "info".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            models: vec!["llama3".to_string(), "mistral".to_string()],
            max_resume_chars: 5000,
            temperature: 0.3,
            model_timeout: Some(Duration::from_secs(5)),
            sample_fallback: true,
            max_upload_bytes: 1024 * 1024,
        }
    }

    fn app(reply: &'static str) -> Router {
        let config = test_config();
        let analyzer = Analyzer::new(
            Arc::new(FixedBackend(reply)),
            AnalysisPolicy::from_config(&config),
        );
        build_router(AppState { analyzer, config })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_request(file_name: &str, contents: &str, category: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"category\"\r\n\r\n\
             {category}\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {contents}\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/resumes/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("{}")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_text_returns_structured_record() {
        let request = Request::post("/api/v1/resumes/analyze-text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"text": "Jane Doe. Skills: Go", "category": "Fresher"}"#,
            ))
            .unwrap();
        let response = app(r#"{"Name": "Jane Doe", "Skills": ["Go"]}"#)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["Name"], "Jane Doe");
        assert_eq!(body["Model"], "llama3");
        assert_eq!(body["Projects"], serde_json::json!([]));
        assert!(body["Analysis Seconds"].is_number());
    }

    #[tokio::test]
    async fn test_analyze_text_rejects_unknown_category() {
        let request = Request::post("/api/v1/resumes/analyze-text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "Jane", "category": "Intern"}"#))
            .unwrap();
        let response = app("{}").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_analyze_upload_rejects_unsupported_extension() {
        let response = app("{}")
            .oneshot(multipart_request("resume.txt", "Jane Doe", "Fresher"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_upload_with_corrupt_pdf_is_extraction_error() {
        let response = app("{}")
            .oneshot(multipart_request("resume.pdf", "definitely not a pdf", "Experienced"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_models_lists_configured_and_installed() {
        let response = app("{}")
            .oneshot(Request::get("/api/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["configured"][0], "llama3");
        assert_eq!(body["installed"][0], "llama3:latest");
    }
}
