use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::config::RagConfig;
use crate::ingestion::Ingestor;
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};
use crate::quiz::parser::{parse_quiz, QuizQuestion};
use crate::rag::pipeline::{AnswerPipeline, Citation, QuizPipeline};
use crate::session::{ChatMode, ChatTurn, Session};

/// Everything one HTTP session mutates. Requests against the same session
/// are serialized through the write lock, matching the one-interaction-at-a-
/// time model of the CLI.
struct ApiInner {
    session: Session,
    ingestor: Ingestor,
    answer_pipeline: AnswerPipeline,
    quiz_pipeline: QuizPipeline,
    config: RagConfig,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<RwLock<ApiInner>>,
}

#[derive(Deserialize)]
pub struct IngestRequest {
    paths: Vec<String>,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pages: usize,
    chunks: usize,
    failures: Vec<String>,
}

#[derive(Deserialize)]
pub struct AskRequest {
    question: String,
    #[serde(default)]
    citations: bool,
}

#[derive(Serialize)]
pub struct AskResponse {
    answer: String,
    context: Vec<String>,
    citations: Vec<CitationView>,
}

#[derive(Serialize)]
pub struct CitationView {
    source_id: String,
    page_number: Option<u32>,
    preview: String,
}

impl From<&Citation> for CitationView {
    fn from(citation: &Citation) -> Self {
        Self {
            source_id: citation.source_id.clone(),
            page_number: citation.page_number,
            preview: citation.preview.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    topic: String,
    count: Option<usize>,
}

#[derive(Serialize)]
pub struct QuizResponse {
    questions: Vec<QuizQuestion>,
    /// Raw generator output, the fallback display when parsing found nothing.
    raw: String,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    turns: Vec<ChatTurn>,
}

#[derive(Serialize)]
struct ApiMessage {
    status: String,
}

/// Create and configure the API router
pub fn create_api(
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn CompletionProvider>,
    config: RagConfig,
) -> anyhow::Result<Router> {
    let ingestor = Ingestor::new(embedder.clone(), &config)?;
    let inner = ApiInner {
        session: Session::default(),
        ingestor,
        answer_pipeline: AnswerPipeline::new(embedder.clone(), generator.clone(), config.clone()),
        quiz_pipeline: QuizPipeline::new(embedder, generator, config.clone()),
        config,
    };

    let state = AppState {
        inner: Arc::new(RwLock::new(inner)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/ingest", post(ingest_handler))
        .route("/ask", post(ask_handler))
        .route("/quiz", post(quiz_handler))
        .route("/history", get(history_handler))
        .route("/reset", post(reset_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state))
}

async fn ingest_handler(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Response {
    let mut inner = state.inner.write().await;
    let (index, report) = match inner.ingestor.build_index(&request.paths).await {
        Ok(result) => result,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage {
                    status: format!("Ingestion failed: {}", e),
                }),
            )
                .into_response();
        }
    };

    let failures = report.failures.iter().map(|f| f.to_string()).collect();
    inner
        .session
        .load(Box::new(index), report.pages, report.chunks);

    Json(IngestResponse {
        pages: report.pages,
        chunks: report.chunks,
        failures,
    })
    .into_response()
}

async fn ask_handler(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let mut inner = state.inner.write().await;
    let (answer, context, citations, kind) = {
        let ApiInner {
            session,
            answer_pipeline,
            ..
        } = &mut *inner;
        let index = match session.index.as_deref() {
            Some(index) => index,
            None => return no_documents_response(),
        };

        if request.citations {
            let cited = answer_pipeline
                .answer_with_citations(index, &request.question)
                .await;
            let citations = cited.citations.iter().map(CitationView::from).collect();
            (cited.text, cited.context, citations, ChatMode::QaCitations)
        } else {
            let outcome = answer_pipeline.answer(index, &request.question).await;
            (outcome.text, outcome.context, Vec::new(), ChatMode::Qa)
        }
    };

    inner.session.record_turn(ChatTurn::new(
        request.question,
        answer.clone(),
        context.clone(),
        kind,
    ));

    Json(AskResponse {
        answer,
        context,
        citations,
    })
    .into_response()
}

async fn quiz_handler(State(state): State<AppState>, Json(request): Json<QuizRequest>) -> Response {
    let mut inner = state.inner.write().await;
    let count = request.count.unwrap_or(inner.config.quiz_question_count);

    let raw = {
        let ApiInner {
            session,
            quiz_pipeline,
            ..
        } = &mut *inner;
        let index = match session.index.as_deref() {
            Some(index) => index,
            None => return no_documents_response(),
        };
        quiz_pipeline
            .generate_quiz(index, &request.topic, count)
            .await
    };

    let questions = parse_quiz(&raw);
    inner.session.record_turn(ChatTurn::new(
        format!(
            "quiz on {}",
            if request.topic.is_empty() {
                "(general)"
            } else {
                request.topic.as_str()
            }
        ),
        raw.clone(),
        Vec::new(),
        ChatMode::Quiz,
    ));

    Json(QuizResponse { questions, raw }).into_response()
}

async fn history_handler(State(state): State<AppState>) -> Json<HistoryResponse> {
    let inner = state.inner.read().await;
    // Displayed reverse-chronologically.
    let turns = inner.session.history.iter().rev().cloned().collect();
    Json(HistoryResponse { turns })
}

async fn reset_handler(State(state): State<AppState>) -> Json<ApiMessage> {
    let mut inner = state.inner.write().await;
    inner.session.reset();
    Json(ApiMessage {
        status: "Session reset! Upload new documents.".to_string(),
    })
}

async fn health_handler() -> Json<ApiMessage> {
    Json(ApiMessage {
        status: "ok".to_string(),
    })
}

fn no_documents_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiMessage {
            status: "No documents loaded. POST /ingest first.".to_string(),
        }),
    )
        .into_response()
}
