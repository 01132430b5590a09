//! HTTP server with the chat UI and the question endpoint.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

const INDEX_HTML: &str = include_str!("../../../static/index.html");

const QUESTION_REQUIRED: &str = "Question is required";
const PROCESSING_FAILED: &str = "Failed to process question";

/// Run the HTTP server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'consulta doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Arc::new(Orchestrator::new(&settings)?);

    if settings.server.warm_up {
        let spinner = Output::spinner("Building index...");
        let result = orchestrator.warm_up().await;
        spinner.finish_and_clear();
        result?;
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Consulta");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Chat UI", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, router(orchestrator)).await?;

    Ok(())
}

/// Build the application router around a shared orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(orchestrator)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// === Handlers ===

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(orchestrator): State<Arc<Orchestrator>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "index": orchestrator.status(),
    }))
}

async fn ask(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let question = match payload {
        Ok(Json(req)) => req.question.unwrap_or_default(),
        Err(rejection) => {
            debug!("Rejected /ask body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, QUESTION_REQUIRED);
        }
    };

    match orchestrator.ask(&question).await {
        Ok(answer) => Json(AskResponse { answer: answer.text }).into_response(),
        Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, QUESTION_REQUIRED),
        Err(e) => {
            error!("Failed to process question: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::orchestrator::OrchestratorOptions;
    use crate::retry::RetryPolicy;
    use crate::testing::{passages, StubCompleter, StubEmbedder, StubSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::time::Duration;
    use tower::ServiceExt;

    fn orchestrator(source: StubSource, answer: &str) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::with_components(
            Arc::new(source),
            Arc::new(StubEmbedder::new()),
            Arc::new(StubCompleter::new(answer)),
            Prompts::default(),
            OrchestratorOptions {
                retry: RetryPolicy::no_retry(Duration::from_secs(1)),
                ..OrchestratorOptions::default()
            },
        ))
    }

    fn plan() -> StubSource {
        StubSource::new(passages(&["Propuesta de empleo", "Propuesta de salud"]))
    }

    fn post_ask(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = tokio_test::assert_ok!(app.oneshot(request).await);
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let app = router(orchestrator(plan(), "Se propone crear empleo."));

        let (status, body) = send(app, post_ask(r#"{"question":"¿Qué hay de empleo?"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "answer": "Se propone crear empleo." }));
    }

    #[tokio::test]
    async fn test_empty_question_is_bad_request() {
        for payload in [r#"{"question":""}"#, r#"{"question":"   "}"#, r#"{}"#, r#"{"question":42}"#, "not json"] {
            let app = router(orchestrator(plan(), "unused"));
            let (status, body) = send(app, post_ask(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
            assert_eq!(body, serde_json::json!({ "error": "Question is required" }));
        }
    }

    #[tokio::test]
    async fn test_build_failure_is_generic_server_error() {
        let app = router(orchestrator(plan().failing(1), "unused"));

        let (status, body) = send(app, post_ask(r#"{"question":"empleo"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Failed to process question" }));
    }

    #[tokio::test]
    async fn test_health_reports_index_state() {
        let orchestrator = orchestrator(plan(), "ok");

        let health = || Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(router(orchestrator.clone()), health()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["index"]["state"], "uninitialized");

        send(router(orchestrator.clone()), post_ask(r#"{"question":"salud"}"#)).await;

        let (_, body) = send(router(orchestrator), health()).await;
        assert_eq!(body["index"]["state"], "ready");
        assert_eq!(body["index"]["passages"], 2);
        assert_eq!(body["index"]["embedding_model"], "stub/bag-of-words");
    }

    #[tokio::test]
    async fn test_index_page_is_served() {
        let app = router(orchestrator(plan(), "ok"));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = tokio_test::assert_ok!(app.oneshot(request).await);
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("/ask"));
    }
}
