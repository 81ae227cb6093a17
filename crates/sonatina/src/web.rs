//! Web endpoints for sonatina.
//!
//! One route does the real work: a MIDI upload is spooled to a temp file,
//! decoded, and run through the analysis pipeline. The rest is discovery
//! and liveness. The spool file is released on every exit path.

use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use music_theory::HeuristicTheory;
use sonata_analysis::{AnalysisPipeline, AnalysisResult};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub started: Instant,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            pipeline: Arc::new(AnalysisPipeline::with_provider(Arc::new(HeuristicTheory))),
            started: Instant::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/analyze", post(analyze_upload))
        .route("/health", get(health))
        .route("/", get(serve_root))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve root discovery endpoint
async fn serve_root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "sonatina",
        "version": env!("CARGO_PKG_VERSION"),
        "links": {
            "analyze": "/analyze",
            "health": "/health",
        }
    }))
}

/// Liveness endpoint
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sonatina",
        "uptimeSecs": state.started.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Analyze an uploaded MIDI file for sonata-form structure.
///
/// Accepts multipart/form-data with one file field; the field name does
/// not matter, the filename extension does.
#[tracing::instrument(name = "http.analyze", skip_all)]
async fn analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResult>> {
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(format!("Malformed multipart body: {e}")))?
    {
        if field.file_name().is_none() {
            continue;
        }
        filename = field.file_name().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidUpload(format!("Failed to read file data: {e}")))?;
        data = Some(bytes.to_vec());
    }

    let filename = filename.ok_or_else(|| ApiError::InvalidUpload("No file provided".to_string()))?;
    if !is_midi_filename(&filename) {
        return Err(ApiError::InvalidUpload("File must be a MIDI file".to_string()));
    }

    let data = match data {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ApiError::InvalidUpload("Empty file received".to_string())),
    };

    tracing::debug!("Analyzing upload: {} ({} bytes)", filename, data.len());

    let pipeline = state.pipeline.clone();
    let analysis = tokio::task::spawn_blocking(move || -> ApiResult<AnalysisResult> {
        let mut spool = tempfile::Builder::new().suffix(".mid").tempfile()?;
        spool.write_all(&data)?;
        spool.flush()?;

        let score = midi_score::decode_file(spool.path()).map_err(|e| match e {
            midi_score::Error::MidiParse(message) => {
                ApiError::InvalidUpload(format!("Failed to parse MIDI file: {message}"))
            }
            midi_score::Error::Io(io) => ApiError::Io(io),
        })?;

        Ok(pipeline.analyze(&score))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Analysis failed: {e}")))??;

    tracing::info!(
        "Analyzed {}: {} sections, {:.0}% confidence",
        filename,
        analysis.sections.len(),
        analysis.overall_confidence * 100.0
    );

    Ok(Json(analysis))
}

fn is_midi_filename(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".mid") || lower.ends_with(".midi")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const TEST_BODY_LIMIT: usize = 1024 * 1024;

    fn test_router() -> Router {
        router(AppState::new(), TEST_BODY_LIMIT)
    }

    fn multipart_request(filename: &str, data: &[u8]) -> Request<Body> {
        let boundary = "sonatina-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: audio/midi\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn midi_filenames_match_case_insensitively() {
        assert!(is_midi_filename("sonata.mid"));
        assert!(is_midi_filename("sonata.midi"));
        assert!(is_midi_filename("SONATA.MID"));
        assert!(is_midi_filename("Sonata.Midi"));
        assert!(!is_midi_filename("sonata.wav"));
        assert!(!is_midi_filename("sonata.mid.txt"));
        assert!(!is_midi_filename("sonata"));
    }

    #[tokio::test]
    async fn root_lists_the_endpoints() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["name"], "sonatina");
        assert_eq!(json["links"]["analyze"], "/analyze");
        assert_eq!(json["links"]["health"], "/health");
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "sonatina");
        assert!(json["uptimeSecs"].is_u64());
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn non_midi_filename_is_rejected() {
        let response = test_router()
            .oneshot(multipart_request("sonata.wav", b"RIFF"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_UPLOAD");
        assert_eq!(json["error"]["message"], "File must be a MIDI file");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let response = test_router()
            .oneshot(multipart_request("sonata.mid", b""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "Empty file received");
    }

    #[tokio::test]
    async fn form_without_a_file_is_rejected() {
        let boundary = "sonatina-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "No file provided");
    }
}
