//! Web UI and JSON API.
//!
//! Every browser tab creates its own session; sessions are independent and
//! each is locked only while one of its own requests runs. Sessions left
//! unused for longer than the configured idle timeout are dropped.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::TubeQaError;
use crate::rag::ConversationTurn;
use crate::session::{LoadSummary, SessionBuilder, SessionContext, SessionStatus, TROUBLESHOOTING_TIPS};
use crate::transcript::TranscriptFetcher;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// Upper bound on the time between idle-session sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct SessionEntry {
    context: Arc<Mutex<SessionContext>>,
    last_access: Instant,
}

/// Shared application state.
struct AppState {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    fetcher: TranscriptFetcher,
    builder: SessionBuilder,
    idle_timeout: Option<Duration>,
}

impl AppState {
    fn new(
        fetcher: TranscriptFetcher,
        builder: SessionBuilder,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            fetcher,
            builder,
            idle_timeout,
        }
    }

    /// Look up a session and mark it as used.
    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<SessionContext>>, ApiError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
        })?;
        entry.last_access = Instant::now();
        Ok(entry.context.clone())
    }

    /// Drop sessions unused since `now - idle_timeout`. Returns how many were dropped.
    async fn expire_idle(&self, now: Instant) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = now.saturating_duration_since(entry.last_access) < timeout;
            if !keep {
                debug!("Expiring idle session {}", id);
            }
            keep
        });
        before - sessions.len()
    }
}

/// Periodically drop idle sessions for as long as the server runs.
fn spawn_idle_sweeper(state: Arc<AppState>) {
    let Some(timeout) = state.idle_timeout else {
        return;
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL.min(timeout));
        loop {
            ticker.tick().await;
            let expired = state.expire_idle(Instant::now()).await;
            if expired > 0 {
                info!("Expired {} idle sessions", expired);
            }
        }
    });
}

/// Run the web server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = settings.llm.api_key() {
        Output::warning(&format!("{} Loading videos will fail until it is set.", e));
    }

    let fetcher = TranscriptFetcher::from_settings(&settings.transcript)?;
    let builder = SessionBuilder::new(&settings)?;
    let state = Arc::new(AppState::new(
        fetcher,
        builder,
        settings.server.session_idle_timeout(),
    ));
    spawn_idle_sweeper(state.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("🎥 YouTube Q&A Assistant");
    println!();
    Output::success(&format!("Open http://{} in your browser", addr));
    println!();
    println!("API:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /api/sessions");
    Output::kv("Session", "GET    /api/sessions/{id}");
    Output::kv("End session", "DELETE /api/sessions/{id}");
    Output::kv("Load video", "POST   /api/sessions/{id}/load");
    Output::kv("Ask", "POST   /api/sessions/{id}/ask");
    Output::kv("Clear history", "POST   /api/sessions/{id}/clear");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/load", post(load))
        .route("/api/sessions/{id}/ask", post(ask))
        .route("/api/sessions/{id}/clear", post(clear))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct LoadRequest {
    url: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct SessionView {
    id: Uuid,
    status: SessionStatus,
    message: &'static str,
    /// Most recent first.
    history: Vec<ConversationTurn>,
}

impl SessionView {
    fn of(id: Uuid, session: &SessionContext) -> Self {
        let status = session.status();
        Self {
            id,
            message: status.message(),
            status,
            history: session.history().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoadResponse {
    summary: LoadSummary,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    turn: ConversationTurn,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tips: Vec<&'static str>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: String) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error,
                tips: Vec::new(),
            },
        }
    }

    fn with_tips(mut self) -> Self {
        self.body.tips = TROUBLESHOOTING_TIPS.to_vec();
        self
    }
}

impl From<TubeQaError> for ApiError {
    fn from(e: TubeQaError) -> Self {
        Self::new(status_for(&e), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for a library error.
fn status_for(e: &TubeQaError) -> StatusCode {
    match e {
        TubeQaError::InvalidInput(_) | TubeQaError::UnrecognizedUrl(_) => StatusCode::BAD_REQUEST,
        TubeQaError::NoSessionLoaded => StatusCode::CONFLICT,
        TubeQaError::NoTranscript { .. }
        | TubeQaError::VideoUnavailable { .. }
        | TubeQaError::EmptyTranscript(_)
        | TubeQaError::NoExtractableText { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TubeQaError::TranscriptFetch { .. } | TubeQaError::OpenAI(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let id = Uuid::new_v4();
    let session = SessionContext::new();
    let view = SessionView::of(id, &session);
    state.sessions.write().await.insert(
        id,
        SessionEntry {
            context: Arc::new(Mutex::new(session)),
            last_access: Instant::now(),
        },
    );
    info!("Created session {}", id);
    Json(view)
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    Ok(Json(SessionView::of(id, &session)))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!("Deleted session {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("Session not found: {}", id),
        )),
    }
}

async fn load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LoadRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "⚠️ Please enter a valid YouTube URL.".to_string(),
        ));
    }

    let session = state.session(id).await?;
    let mut session = session.lock().await;
    match session.load(url, &state.fetcher, &state.builder).await {
        Ok(summary) => Ok(Json(LoadResponse {
            summary,
            session: SessionView::of(id, &session),
        })),
        Err(e) => Err(ApiError::new(
            status_for(&e),
            format!("❌ Failed to load transcript: {}", e),
        )
        .with_tips()),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let turn = session.ask(&req.question).await?;
    Ok(Json(AskResponse {
        turn,
        session: SessionView::of(id, &session),
    }))
}

async fn clear(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    session.clear_history();
    Ok(Json(SessionView::of(id, &session)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedTranscriptApi, KeywordEmbedder, ScriptedChatModel};

    const VIDEO: &str = "AdI_XWv-ZTk";
    const IDLE: Duration = Duration::from_secs(3600);

    fn state(responses: Vec<&str>) -> Arc<AppState> {
        let api = FixedTranscriptApi::default().with_video(VIDEO, &["ferris the crab", "teaches ownership"]);
        let fetcher = TranscriptFetcher::new(Box::new(api), vec!["en".to_string()]);
        let builder = SessionBuilder::new(&Settings::default())
            .unwrap()
            .with_embedder(Arc::new(KeywordEmbedder::from_corpus(&[
                "ferris the crab teaches ownership",
            ])))
            .with_chat_model(Arc::new(ScriptedChatModel::new(responses)));
        Arc::new(AppState::new(fetcher, builder, Some(IDLE)))
    }

    async fn new_session(state: &Arc<AppState>) -> Uuid {
        create_session(State(state.clone())).await.0.id
    }

    #[tokio::test]
    async fn test_load_ask_clear() {
        let state = state(vec!["A crab named Ferris."]);
        let id = new_session(&state).await;

        let loaded = load(
            State(state.clone()),
            Path(id),
            Json(LoadRequest {
                url: format!("https://www.youtube.com/embed/{}", VIDEO),
            }),
        )
        .await
        .unwrap();
        assert_eq!(loaded.0.summary.chunk_count, 1);
        assert!(loaded.0.session.status.loaded);

        let answered = ask(
            State(state.clone()),
            Path(id),
            Json(AskRequest {
                question: "who is ferris?".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(answered.0.turn.answer, "A crab named Ferris.");
        assert_eq!(answered.0.session.history.len(), 1);

        let cleared = clear(State(state.clone()), Path(id)).await.unwrap();
        assert!(cleared.0.history.is_empty());
        assert!(cleared.0.status.loaded);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let state = state(vec!["answer"]);
        let first = new_session(&state).await;
        let second = new_session(&state).await;

        load(
            State(state.clone()),
            Path(first),
            Json(LoadRequest { url: VIDEO.to_string() }),
        )
        .await
        .unwrap();

        let err = ask(
            State(state.clone()),
            Path(second),
            Json(AskRequest {
                question: "anything?".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_failed_load_carries_tips() {
        let state = state(vec![]);
        let id = new_session(&state).await;

        let err = load(
            State(state.clone()),
            Path(id),
            Json(LoadRequest {
                url: "not a video".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.body.error.starts_with("❌ Failed to load transcript:"));
        assert_eq!(err.body.tips.len(), TROUBLESHOOTING_TIPS.len());
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_sessions() {
        let state = state(vec![]);
        let id = new_session(&state).await;

        assert_eq!(
            delete_session(State(state.clone()), Path(id)).await.unwrap(),
            StatusCode::NO_CONTENT
        );
        let err = get_session(State(state.clone()), Path(id)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let state = state(vec![]);
        let idle = new_session(&state).await;
        let active = new_session(&state).await;
        let created = Instant::now();

        assert_eq!(state.expire_idle(created).await, 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        get_session(State(state.clone()), Path(active)).await.unwrap();

        // Past the untouched session's deadline but not the other's.
        let later = created + IDLE + Duration::from_millis(10);
        assert_eq!(state.expire_idle(later).await, 1);

        let err = get_session(State(state.clone()), Path(idle)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(get_session(State(state.clone()), Path(active)).await.is_ok());
    }

    #[tokio::test]
    async fn test_sessions_kept_without_idle_timeout() {
        let api = FixedTranscriptApi::default();
        let fetcher = TranscriptFetcher::new(Box::new(api), vec!["en".to_string()]);
        let builder = SessionBuilder::new(&Settings::default()).unwrap();
        let state = Arc::new(AppState::new(fetcher, builder, None));
        let id = new_session(&state).await;

        assert_eq!(state.expire_idle(Instant::now() + IDLE * 24).await, 0);
        assert!(get_session(State(state.clone()), Path(id)).await.is_ok());
    }

    #[test]
    fn test_status_for_errors() {
        assert_eq!(
            status_for(&TubeQaError::NoTranscript { video_id: None }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&TubeQaError::MissingCredential("GROQ_API_KEY".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state(vec![]));
    }
}
