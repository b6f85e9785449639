use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Request},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info, warn};
use uuid::Uuid;

use crate::{
    chat::Chatbot,
    config::AppConfig,
    error::{ConsultError, Result},
    extract::{ReportExtractor, ReportFormat},
    llm::OpenRouterVision,
    models::{ChatRequest, ChatResponse, DiagnosisResponse, SpecialistRole},
    pipeline::{ConsultationPipeline, latest_diagnosis},
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const REPORT_FIELD: &str = "report";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ConsultationPipeline>,
    pub extractor: Arc<ReportExtractor>,
    pub chatbot: Chatbot,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let vision = OpenRouterVision::new(
            &config.openrouter_api_key,
            &config.ocr_model,
            config.http_timeout,
        )?;

        Ok(Self {
            pipeline: Arc::new(ConsultationPipeline::from_config(config)),
            extractor: Arc::new(ReportExtractor::new(vision)),
            chatbot: Chatbot::openrouter(&config.openrouter_api_key, &config.chat_model),
            upload_dir: config.upload_dir.clone(),
        })
    }
}

pub fn create_app(config: &AppConfig) -> Result<Router> {
    let app_state = AppState::from_config(config)?;
    Ok(build_router(app_state))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/reports", post(upload_report))
        .route("/reports/latest", get(get_latest_diagnosis))
        .route("/chat", post(chat))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn correlation_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "SevaKendra Consultation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Medical report review by a cardiologist, psychologist and pulmonologist panel with a combined multidisciplinary opinion",
        "endpoints": {
            "POST /reports": "Upload a .txt or .pdf report (multipart field 'report') and receive the final diagnosis",
            "GET /reports/latest": "Most recent final diagnosis",
            "POST /chat": "Ask the health assistant a question",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn upload_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DiagnosisResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ConsultError::Validation(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(REPORT_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ConsultError::Validation("Uploaded report has no file name".to_string()))?;
        let file_name = sanitize_file_name(&file_name)?;

        // Reject before reading the body or doing any model work.
        ReportFormat::from_path(Path::new(&file_name))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ConsultError::Validation(format!("Failed to read upload: {}", e)))?;

        let report_id = Uuid::new_v4().to_string();
        let stored_path = store_upload(&state.upload_dir, &report_id, &file_name, &bytes).await?;
        info!(report_id = %report_id, path = %stored_path.display(), "Report uploaded");

        let extracted = state.extractor.extract(&stored_path).await;
        discard_upload(&stored_path).await;
        let report = extracted?;
        let outcome = state.pipeline.run(&report).await;

        let missing = outcome.findings.absent_roles();
        let answered = SpecialistRole::ALL
            .into_iter()
            .filter(|role| !missing.contains(role))
            .collect();

        return Ok(Json(DiagnosisResponse {
            report_id,
            diagnosis: outcome.diagnosis,
            answered,
            missing,
        }));
    }

    Err(ConsultError::Validation(
        "Please upload a report file in the 'report' field".to_string(),
    ))
}

fn sanitize_file_name(raw: &str) -> Result<String> {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ConsultError::Validation(format!("Invalid file name: {}", raw)))
}

async fn store_upload(dir: &Path, report_id: &str, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}-{}", report_id, file_name));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Uploaded files are only needed until their text is extracted.
async fn discard_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove uploaded report");
    }
}

async fn get_latest_diagnosis(State(state): State<AppState>) -> Result<Json<Value>> {
    let path = state.pipeline.result_path();
    match latest_diagnosis(path).await? {
        Some(diagnosis) => Ok(Json(json!({ "diagnosis": diagnosis }))),
        None => Err(ConsultError::NotFound(
            "No diagnosis has been generated yet".to_string(),
        )),
    }
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let reply = state.chatbot.reply(&request.message).await?;
    Ok(Json(ChatResponse { reply }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{FanOutCoordinator, SpecialistInvoker, SynthesisInvoker};
    use crate::llm::TextGenerator;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "sevakendra-test-boundary";

    struct Counting {
        reply: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextGenerator for Counting {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reply.is_empty() {
                Ok(prompt.to_string())
            } else {
                Ok(self.reply.to_string())
            }
        }
    }

    struct TestApp {
        router: Router,
        calls: Arc<AtomicUsize>,
        upload_dir: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = |reply: &'static str| -> Arc<dyn TextGenerator> {
            Arc::new(Counting {
                reply,
                calls: calls.clone(),
            })
        };

        let specialists = vec![
            SpecialistInvoker::new(SpecialistRole::Cardiologist, generator("CARD_OK")),
            SpecialistInvoker::new(SpecialistRole::Psychologist, generator("PSY_OK")),
            SpecialistInvoker::new(SpecialistRole::Pulmonologist, generator("PULM_OK")),
        ];
        let pipeline = ConsultationPipeline::new(
            specialists,
            SynthesisInvoker::new(generator("")),
            FanOutCoordinator::new(3),
            dir.path().join("results").join("final_diagnosis.txt"),
        );
        let vision =
            OpenRouterVision::new("test-key", "test/model", Duration::from_secs(1)).unwrap();

        let state = AppState {
            pipeline: Arc::new(pipeline),
            extractor: Arc::new(ReportExtractor::new(vision)),
            chatbot: Chatbot::new(generator("Drink water.")),
            upload_dir: dir.path().join("uploads"),
        };

        TestApp {
            router: build_router(state),
            calls,
            upload_dir: dir.path().join("uploads"),
            _dir: dir,
        }
    }

    fn upload_request(file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"report\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {contents}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/reports")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_upload_text_report_runs_pipeline() {
        let app = test_app();
        let response = app
            .router
            .clone()
            .oneshot(upload_request("labs.txt", "Hemoglobin 10 g/dL"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let diagnosis = body["diagnosis"].as_str().unwrap();
        assert!(diagnosis.starts_with("### Final Diagnosis:\n\n"));
        for marker in ["CARD_OK", "PSY_OK", "PULM_OK"] {
            assert!(diagnosis.contains(marker), "missing {marker}");
        }
        assert_eq!(body["missing"], json!([]));
        assert_eq!(app.calls.load(Ordering::SeqCst), 4);

        let latest = app
            .router
            .oneshot(Request::get("/reports/latest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(latest.status(), StatusCode::OK);
        assert_eq!(body_json(latest).await["diagnosis"], diagnosis);
    }

    fn stored_uploads(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_uploaded_report_is_not_retained() {
        let app = test_app();
        let response = app
            .router
            .clone()
            .oneshot(upload_request("labs.txt", "Hemoglobin 10 g/dL"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(stored_uploads(&app.upload_dir), 0);

        let response = app
            .router
            .oneshot(upload_request("blank.txt", "   "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(stored_uploads(&app.upload_dir), 0);
    }

    #[tokio::test]
    async fn test_unsupported_upload_rejected_before_model_calls() {
        let app = test_app();
        let response = app
            .router
            .oneshot(upload_request("labs.docx", "Hemoglobin 10 g/dL"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(app.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_latest_before_any_run_is_not_found() {
        let app = test_app();
        let response = app
            .router
            .oneshot(Request::get("/reports/latest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat() {
        let app = test_app();
        let request = Request::post("/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message":"I feel dizzy"}"#))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["reply"], "Drink water.");
    }

    #[tokio::test]
    async fn test_chat_blank_message_is_bad_request() {
        let app = test_app();
        let request = Request::post("/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message":"   "}"#))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_sanitize_file_name_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/labs.txt").unwrap(), "labs.txt");
        assert!(sanitize_file_name("..").is_err());
    }
}
