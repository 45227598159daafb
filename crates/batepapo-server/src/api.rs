use std::future::Future;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use batepapo_shared::visibility::parse_limit;
use batepapo_shared::{clock, Message, Participant};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServerError;
use crate::message_log::{self, NewMessage};
use crate::registry;
use crate::store::ChatStore;

/// Header carrying the name of the participant making the request.
const USER_HEADER: &str = "user";

#[derive(Clone)]
pub struct AppState {
    pub store: ChatStore,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/participants", post(create_participant).get(list_participants))
        .route("/messages", post(create_message).get(list_messages))
        .route("/status", post(update_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct NewParticipant {
    name: Option<String>,
}

#[derive(Deserialize)]
struct MessagesQuery {
    limit: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Name of the requesting participant, from the `user` header.
fn requester(headers: &HeaderMap) -> Result<String, ServerError> {
    let name = headers
        .get(USER_HEADER)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::trim)
        .unwrap_or("");

    if name.is_empty() {
        return Err(ServerError::Validation("missing 'user' header".into()));
    }
    Ok(name.to_string())
}

async fn create_participant(
    State(state): State<AppState>,
    body: Result<Json<NewParticipant>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let op = "register";
    let Json(req) = body.map_err(|e| ServerError::from(e).logged(op))?;
    let name = req.name.unwrap_or_default();

    registry::register(&state.store, &name, clock::now_millis(), clock::local_time())
        .await
        .map_err(|e| e.logged(op))?;

    Ok(StatusCode::CREATED)
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Participant>>, ServerError> {
    let participants = registry::list(&state.store)
        .await
        .map_err(|e| e.logged("list_participants"))?;
    Ok(Json(participants))
}

async fn create_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewMessage>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let op = "post_message";
    let from = requester(&headers).map_err(|e| e.logged(op))?;
    let Json(req) = body.map_err(|e| ServerError::from(e).logged(op))?;

    message_log::post(&state.store, &from, req, clock::local_time())
        .await
        .map_err(|e| e.logged(op))?;

    Ok(StatusCode::CREATED)
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, ServerError> {
    let op = "list_messages";
    let name = requester(&headers).map_err(|e| e.logged(op))?;
    let limit = parse_limit(query.limit.as_deref())
        .map_err(|e| ServerError::from(e).logged(op))?;

    let messages = message_log::visible_to(&state.store, &name, limit)
        .await
        .map_err(|e| e.logged(op))?;
    Ok(Json(messages))
}

async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ServerError> {
    let op = "heartbeat";
    let name = requester(&headers).map_err(|e| e.logged(op))?;

    registry::heartbeat(&state.store, &name, clock::now_millis())
        .await
        .map_err(|e| e.logged(op))?;

    Ok(StatusCode::OK)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<S>(
    state: AppState,
    addr: std::net::SocketAddr,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
