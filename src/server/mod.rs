//! HTTP game API
//!
//! Thin presentation layer over the ledger. Live sessions are kept in a
//! table of per-player async mutexes so that wagers for the same player are
//! applied one at a time. Entries are never evicted: a finished session
//! stays readable for its report until the process restarts.

use crate::error::GameError;
use crate::ledger::Ledger;
use crate::report::SessionReport;
use crate::types::{PlayerSession, Side, WagerOutcome};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Server state shared across handlers
pub struct ApiState {
    ledger: Arc<Ledger>,
    sessions: RwLock<HashMap<String, Arc<Mutex<PlayerSession>>>>,
}

impl ApiState {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn live(&self, player_id: &str) -> Option<Arc<Mutex<PlayerSession>>> {
        self.sessions.read().await.get(player_id).cloned()
    }

    async fn live_or_missing(&self, player_id: &str) -> Result<Arc<Mutex<PlayerSession>>, ApiError> {
        let player_id = player_id.trim();
        self.live(player_id)
            .await
            .ok_or_else(|| GameError::SessionNotFound(player_id.to_string()).into())
    }

    pub async fn live_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// What the client renders after every call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub player_id: String,
    pub session_id: String,
    pub balance: Decimal,
    pub rounds_played: u32,
    pub rounds_remaining: u32,
    pub is_over: bool,
    pub dirty: bool,
    pub suggested_wager: Decimal,
    pub balance_history: Vec<Decimal>,
}

impl From<&PlayerSession> for SessionView {
    fn from(session: &PlayerSession) -> Self {
        Self {
            player_id: session.player_id.clone(),
            session_id: session.session_id.clone(),
            balance: session.balance,
            rounds_played: session.rounds_played,
            rounds_remaining: session.rounds_remaining(),
            is_over: session.is_over,
            dirty: session.dirty,
            suggested_wager: session.suggested_wager(),
            balance_history: session.balance_history.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WagerView {
    pub outcome: WagerOutcome,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WagerRequest {
    pub amount: Decimal,
    pub side: Side,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error response wrapper
pub enum ApiError {
    Game(GameError),
    /// Body could not be decoded into the request type
    Rejected(JsonRejection),
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        ApiError::Game(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection)
    }
}

fn status_for(e: &GameError) -> StatusCode {
    match e {
        GameError::InvalidPlayer(_) | GameError::InvalidWager(_) => StatusCode::BAD_REQUEST,
        GameError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        GameError::SessionAlreadyOver(_) => StatusCode::CONFLICT,
        GameError::StoreUnavailable { .. } | GameError::PersistenceFailed { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GameError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Game(e) => (status_for(&e), e.to_string()),
            ApiError::Rejected(rejection) => (rejection.status(), rejection.body_text()),
        };
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", error);
        }
        (status, Json(ErrorBody { error })).into_response()
    }
}

// ============ HTTP API Handlers ============

async fn health_check() -> &'static str {
    "OK"
}

/// Start or resume a session
async fn start_session(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<SessionView>, ApiError> {
    let Json(req) = payload?;
    let player_id = req.player_id.trim();

    if !player_id.is_empty() {
        if let Some(live) = state.live(player_id).await {
            let session = live.lock().await;
            return Ok(Json(SessionView::from(&*session)));
        }
    }

    let session = state.ledger.start_session(player_id).await?;
    let live = {
        let mut sessions = state.sessions.write().await;
        sessions
            .entry(session.player_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone()
    };

    let session = live.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(player_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let live = state.live_or_missing(&player_id).await?;
    let session = live.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

async fn place_wager(
    State(state): State<Arc<ApiState>>,
    Path(player_id): Path<String>,
    payload: Result<Json<WagerRequest>, JsonRejection>,
) -> Result<Json<WagerView>, ApiError> {
    let Json(req) = payload?;
    let live = state.live_or_missing(&player_id).await?;
    let mut session = live.lock().await;
    let outcome = state
        .ledger
        .place_wager(&mut session, req.amount, req.side)
        .await?;

    Ok(Json(WagerView {
        outcome,
        session: SessionView::from(&*session),
    }))
}

/// Retry persisting a session whose last round was not saved
async fn flush_session(
    State(state): State<Arc<ApiState>>,
    Path(player_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let live = state.live_or_missing(&player_id).await?;
    let mut session = live.lock().await;
    state.ledger.flush(&mut session).await?;
    Ok(Json(SessionView::from(&*session)))
}

async fn get_report(
    State(state): State<Arc<ApiState>>,
    Path(player_id): Path<String>,
) -> Result<Json<SessionReport>, ApiError> {
    let live = state.live_or_missing(&player_id).await?;
    let session = live.lock().await;
    Ok(Json(SessionReport::from_session(&session)))
}

/// Create API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sessions", post(start_session))
        .route("/sessions/{player_id}", get(get_session))
        .route("/sessions/{player_id}/wagers", post(place_wager))
        .route("/sessions/{player_id}/flush", post(flush_session))
        .route("/sessions/{player_id}/report", get(get_report))
        .with_state(state)
}

/// Start API server
pub async fn start_server(
    state: Arc<ApiState>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Game API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
