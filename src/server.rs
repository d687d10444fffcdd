//! HTTP server wiring the store, embedding provider, and quiz API client
//! into axum handlers under `/quiz`.
//!
//! Handlers run store and engine work through `spawn_blocking` over a shared
//! `Arc<Mutex<Connection>>`; the recommendation scope is always an explicit
//! query parameter, never inferred from recent activity.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::config::QuizrecConfig;
use crate::db;
use crate::embedding::{self, EmbeddingProvider};
use crate::quiz::store;
use crate::quiz::types::{AnswerRecord, QuestionId};
use crate::quizapi::QuizApiClient;
use crate::recommend::{self, RecommendError, RecommendOptions, RecommendScope};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<rusqlite::Connection>>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub quiz_api: QuizApiClient,
    pub config: Arc<QuizrecConfig>,
}

/// Open the DB, create the embedding provider, check model version.
fn setup_shared_state(config: QuizrecConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    // Warn on embedding model mismatch — stored vectors never exist, but
    // recommendations across a model change are not comparable run-to-run
    if let Ok(Some(stored_model)) = db::migrations::get_embedding_model(&conn) {
        if stored_model != config.embedding.model {
            tracing::warn!(
                stored = %stored_model,
                configured = %config.embedding.model,
                "embedding model changed since this database was created"
            );
        }
    }

    let provider = embedding::create_provider(&config.embedding)?;
    tracing::info!("embedding provider ready");

    Ok(AppState {
        db: Arc::new(Mutex::new(conn)),
        embedder: Arc::from(provider),
        quiz_api: QuizApiClient::new(&config.quiz_api),
        config: Arc::new(config),
    })
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/quiz/questions", get(fetch_questions))
        .route("/quiz/recommended-questions", get(recommended_questions))
        .route("/quiz/sessions/{session_id}", post(update_session))
        .route("/quiz/save-answer", post(save_answer))
        .route("/quiz/history", get(history))
        .route("/quiz/session-detail", get(session_detail))
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: QuizrecConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting quiz service");

    let state = setup_shared_state(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/quiz");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

// ── Errors ────────────────────────────────────────────────────────────────────

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// External quiz API failure.
    Upstream(anyhow::Error),
    /// Store or engine failure; both surface as a server error.
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Upstream(e) => {
                tracing::error!(error = %e, "quiz API failure");
                (StatusCode::BAD_GATEWAY, format!("{e:#}"))
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<RecommendError> for ApiError {
    fn from(e: RecommendError) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

/// Run a store/engine closure on the blocking pool with the connection locked.
async fn run_blocking<T, F>(db: Arc<Mutex<rusqlite::Connection>>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("database lock poisoned")))?;
        f(&mut conn)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}")))?
}

// ── Handlers ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FetchParams {
    user_id: Option<String>,
}

/// GET /quiz/questions — fetch a batch from the provider, open a session,
/// ingest the questions.
async fn fetch_questions(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Response, ApiError> {
    let questions = state
        .quiz_api
        .fetch_questions()
        .await
        .map_err(ApiError::Upstream)?;

    let count = questions.len() as u32;
    let user_id = params.user_id;
    let (session, questions) = run_blocking(state.db.clone(), move |conn| {
        let session = store::create_session(conn, user_id.as_deref(), count)
            .map_err(ApiError::Internal)?;
        store::ingest_questions(conn, &questions).map_err(ApiError::Internal)?;
        Ok((session, questions))
    })
    .await?;

    Ok(Json(json!({ "sessionId": session.id, "questions": questions })).into_response())
}

#[derive(Deserialize)]
struct RecommendParams {
    session_id: Option<String>,
    user_id: Option<String>,
    limit: Option<usize>,
}

/// GET /quiz/recommended-questions — ranked unseen questions for an explicit
/// session or user scope.
async fn recommended_questions(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Response, ApiError> {
    let scope = match (params.session_id, params.user_id) {
        (Some(session_id), _) => RecommendScope::Session(session_id),
        (None, Some(user_id)) => RecommendScope::User(user_id),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "session_id or user_id is required".into(),
            ))
        }
    };

    let options = RecommendOptions {
        history_window: state.config.recommend.history_window,
        candidate_cap: state.config.recommend.candidate_cap,
        limit: params.limit.unwrap_or(state.config.recommend.default_limit),
    };

    let embedder = state.embedder.clone();
    let questions = run_blocking(state.db.clone(), move |conn| {
        recommend::recommend(conn, embedder.as_ref(), &scope, &options).map_err(ApiError::from)
    })
    .await?;

    Ok(Json(questions).into_response())
}

#[derive(Deserialize)]
struct UpdateSessionBody {
    score: Option<i64>,
    #[serde(default)]
    completed: bool,
}

/// POST /quiz/sessions/{session_id} — update score and/or completion status.
async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<UpdateSessionBody>,
) -> Result<Response, ApiError> {
    let session = run_blocking(state.db.clone(), move |conn| {
        store::update_session(conn, &session_id, body.score, body.completed)
            .map_err(ApiError::Internal)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("session not found".into()))?;

    Ok(Json(json!({ "status": "success", "session": session })).into_response())
}

#[derive(Deserialize)]
struct SaveAnswerBody {
    session_id: String,
    question_id: QuestionId,
    selected_answer: String,
    is_correct: bool,
    answered_at: Option<String>,
}

/// POST /quiz/save-answer — append one answer record.
async fn save_answer(
    State(state): State<AppState>,
    Json(body): Json<SaveAnswerBody>,
) -> Result<Response, ApiError> {
    let record = AnswerRecord {
        session_id: body.session_id,
        question_id: body.question_id,
        selected_answer: body.selected_answer,
        is_correct: body.is_correct,
        answered_at: body
            .answered_at
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
    };

    run_blocking(state.db.clone(), move |conn| {
        store::save_answer(conn, &record).map_err(ApiError::Internal)
    })
    .await?;

    Ok(Json(json!({ "status": "success" })).into_response())
}

#[derive(Deserialize)]
struct HistoryParams {
    user_id: String,
}

/// GET /quiz/history — a user's sessions, newest first.
async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Response, ApiError> {
    let sessions = run_blocking(state.db.clone(), move |conn| {
        store::sessions_for_user(conn, &params.user_id).map_err(ApiError::Internal)
    })
    .await?;

    Ok(Json(json!({ "sessions": sessions })).into_response())
}

#[derive(Deserialize)]
struct SessionDetailParams {
    session_id: String,
}

/// GET /quiz/session-detail — one session with all its answers, each
/// annotated with its question text.
async fn session_detail(
    State(state): State<AppState>,
    Query(params): Query<SessionDetailParams>,
) -> Result<Response, ApiError> {
    let (session, answers) = run_blocking(state.db.clone(), move |conn| {
        let session = store::session_by_id(conn, &params.session_id).map_err(ApiError::Internal)?;
        let answers =
            store::session_answers_with_text(conn, &params.session_id).map_err(ApiError::Internal)?;
        Ok((session, answers))
    })
    .await?;

    let session = session.ok_or_else(|| ApiError::NotFound("session not found".into()))?;

    let answers: Vec<serde_json::Value> = answers
        .into_iter()
        .map(|mut a| {
            a.question_text.get_or_insert_with(|| "question unavailable".into());
            json!(a)
        })
        .collect();

    Ok(Json(json!({ "session": session, "answers": answers })).into_response())
}
