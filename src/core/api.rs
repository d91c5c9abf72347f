//! HTTP + WebSocket API for kanagi
//!
//! Endpoints:
//! - POST /kanagi/reason - Reason over one utterance in a session
//! - POST /kanagi/fusion - Single-shot reasoning, no session
//! - GET /kanagi/session/{id} - Stored spiral and fermentation
//! - DELETE /kanagi/session/{id} - Close a session
//! - WS /kanagi/ws/{id} - Live traces of a session
//! - GET /health - Health check

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::FusionReasoner;
use crate::types::{ReasoningTrace, SessionSnapshot};
use crate::SWEEP_INTERVAL_SECS;

/// Error code for an empty or missing input
pub const INPUT_REQUIRED: &str = "KANAGI_INPUT_REQUIRED";

/// App state
pub struct AppState {
    pub reasoner: Arc<FusionReasoner>,
    /// Live trace channels; an entry lives only while it has subscribers
    pub updates: RwLock<HashMap<String, broadcast::Sender<Arc<ReasoningTrace>>>>,
}

impl AppState {
    pub fn new(reasoner: Arc<FusionReasoner>) -> Arc<Self> {
        Arc::new(Self {
            reasoner,
            updates: RwLock::new(HashMap::new()),
        })
    }

    /// Subscribe to the traces of a session, opening its channel if needed
    pub async fn subscribe(&self, session_id: &str) -> broadcast::Receiver<Arc<ReasoningTrace>> {
        let mut updates = self.updates.write().await;
        updates
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .subscribe()
    }

    /// Send a trace to live subscribers of its session
    pub async fn publish(&self, session_id: &str, trace: &ReasoningTrace) {
        if let Some(tx) = self.updates.read().await.get(session_id) {
            let _ = tx.send(Arc::new(trace.clone()));
        }
    }

    /// Close the channel of a session nobody listens to any more
    pub async fn release_channel(&self, session_id: &str) -> bool {
        let mut updates = self.updates.write().await;
        if updates
            .get(session_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            updates.remove(session_id);
            return true;
        }
        false
    }

    /// Close every channel without subscribers; returns how many were closed
    pub async fn prune_channels(&self) -> usize {
        let mut updates = self.updates.write().await;
        let before = updates.len();
        updates.retain(|_, tx| tx.receiver_count() > 0);
        before - updates.len()
    }

    pub async fn channel_count(&self) -> usize {
        self.updates.read().await.len()
    }
}

/// Reason request
#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub input: String,
    pub session_id: Option<String>,
}

/// Reason response
#[derive(Debug, Serialize)]
pub struct ReasonResponse {
    pub session_id: String,
    pub trace: ReasoningTrace,
}

/// Fusion request
#[derive(Debug, Deserialize)]
pub struct FusionRequest {
    #[serde(default)]
    pub input: String,
}

/// Fusion response
#[derive(Debug, Serialize)]
pub struct FusionResponse {
    pub output: String,
    pub trace: ReasoningTrace,
    pub unresolved: Vec<String>,
}

/// Session close response
#[derive(Debug, Serialize)]
pub struct EvictResponse {
    pub session_id: String,
    pub evicted: bool,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

/// Create the API router
pub fn create_router(reasoner: Arc<FusionReasoner>) -> Router {
    router(AppState::new(reasoner))
}

/// Router over an existing state, for callers that also run the sweeper
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/kanagi/reason", post(reason))
        .route("/kanagi/fusion", post(fusion))
        .route("/kanagi/session/:id", get(get_session).delete(delete_session))
        .route("/kanagi/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: state.reasoner.active_sessions(),
    })
}

/// Reason over one utterance in a session
async fn reason(State(state): State<Arc<AppState>>, Json(req): Json<ReasonRequest>) -> Response {
    if req.input.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, INPUT_REQUIRED, "input is required");
    }

    let session_id = req
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_session_id);

    let trace = state.reasoner.reason(&req.input, Some(&session_id)).await;

    state.publish(&session_id, &trace).await;

    Json(ReasonResponse { session_id, trace }).into_response()
}

/// Single-shot reasoning without a session
async fn fusion(State(state): State<Arc<AppState>>, Json(req): Json<FusionRequest>) -> Response {
    if req.input.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, INPUT_REQUIRED, "input is required");
    }

    let trace = state.reasoner.reason(&req.input, None).await;
    Json(FusionResponse {
        output: trace.observation.description.clone(),
        unresolved: trace.observation.unresolved.clone(),
        trace,
    })
    .into_response()
}

/// Stored state of a session
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    match state.reasoner.session_snapshot(&id) {
        Ok(Some(snapshot)) => Ok(Json(snapshot)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(session = %id, error = %e, "session read failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Close a session
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EvictResponse>, StatusCode> {
    let evicted = state.reasoner.evict_session(&id).await.map_err(|e| {
        error!(session = %id, error = %e, "session eviction failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    state.updates.write().await.remove(&id);

    Ok(Json(EvictResponse {
        session_id: id,
        evicted,
    }))
}

/// WebSocket handler for live traces
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.subscribe(&id).await;

    ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx, &id).await;
        state.release_channel(&id).await;
    })
}

/// Forward traces until either side hangs up
async fn handle_websocket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<Arc<ReasoningTrace>>,
    session_id: &str,
) {
    let (mut sender, mut receiver) = socket.split();
    debug!(session = %session_id, "live subscriber connected");

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(trace) => {
                    let json = match serde_json::to_string(trace.as_ref()) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "trace serialization failed");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(session = %session_id, skipped, "live subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    // receiver_count must drop before the caller releases the channel
    drop(rx);
    debug!(session = %session_id, "live subscriber disconnected");
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate session ID
fn generate_session_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("kanagi_{:x}{:04x}", nanos, seq & 0xffff)
}

/// Periodically evict idle sessions and close channels nobody listens to
pub fn spawn_sweeper(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep(&state).await;
        }
    })
}

/// One sweep: idle sessions, then orphaned live channels
pub async fn sweep(state: &AppState) {
    if let Err(e) = state.reasoner.evict_idle() {
        error!(error = %e, "idle session sweep failed");
    }
    let closed = state.prune_channels().await;
    if closed > 0 {
        debug!(closed, "orphaned live channels closed");
    }
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    reasoner: Arc<FusionReasoner>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(reasoner);
    let sweeper = spawn_sweeper(state.clone(), Duration::from_secs(SWEEP_INTERVAL_SECS));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "kanagi API listening");
    println!("🜂 kanagi API running on {}", addr);
    println!("  POST   /kanagi/reason      - Reason in a session");
    println!("  POST   /kanagi/fusion      - Single-shot reasoning");
    println!("  GET    /kanagi/session/:id - Session state");
    println!("  DELETE /kanagi/session/:id - Close session");
    println!("  WS     /kanagi/ws/:id      - Live traces");
    println!("  GET    /health             - Health check");

    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served?;
    Ok(())
}
