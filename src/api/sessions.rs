//! Session registry and the per-session REST handlers.
//!
//! Each session's controller sits behind its own mutex, so turns within a
//! session are serialised while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::conversation::{ConversationController, Stage, Transcript};
use crate::customers::{CustomerProfile, parse_customers};
use crate::error::Error;

use super::{ApiError, AppState};

type SharedController = Arc<Mutex<ConversationController>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SharedController>>>,
}

impl SessionRegistry {
    pub async fn insert(&self, controller: ConversationController) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(controller)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedController> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Drop a session. Handlers already holding its controller finish their
    /// turn; later lookups miss.
    pub async fn remove(&self, id: Uuid) -> Option<SharedController> {
        self.inner.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid session ID".into()))
}

async fn lookup(state: &AppState, id: &str) -> Result<SharedController, ApiError> {
    state
        .sessions
        .get(parse_id(id)?)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}

#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    status: Option<String>,
    stage: Option<Stage>,
    customer: Option<CustomerProfile>,
    transcript: Transcript,
    remaining_customers: usize,
    seeded_at: Option<DateTime<Utc>>,
}

fn view(id: &str, controller: &ConversationController) -> SessionView {
    let session = controller.session();
    SessionView {
        session_id: id.to_string(),
        status: session.map(|s| s.status.to_string()),
        stage: session.map(|s| s.stage),
        customer: session.map(|s| s.customer.clone()),
        transcript: controller.transcript().cloned().unwrap_or_default(),
        remaining_customers: controller.remaining_customers(),
        seeded_at: session.map(|s| s.seeded_at),
    }
}

/// POST /api/sessions
///
/// Body is the raw customer CSV. Seeds the first customer and returns the
/// opening message.
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let customers = parse_customers(&body).map_err(Error::from)?;

    let mut controller = ConversationController::new(state.deps.clone());
    controller.load_customers(customers)?;
    let opening = controller.next_agent_turn().await?;

    let customer = controller.customer().cloned();
    let remaining = controller.remaining_customers();
    let stage = controller.session().map(|s| s.stage);
    let id = state.sessions.insert(controller).await;
    let active_sessions = state.sessions.len().await;
    info!(
        session_id = %id,
        customers = remaining,
        active_sessions = active_sessions,
        "Session created"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": id.to_string(),
            "customer": customer,
            "opening": opening,
            "stage": stage,
            "remaining_customers": remaining,
        })),
    ))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = lookup(&state, &id).await?;
    let controller = controller.lock().await;
    Ok(Json(view(&id, &controller)))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .sessions
        .remove(parse_id(&id)?)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    let active_sessions = state.sessions.len().await;
    info!(
        session_id = %id,
        active_sessions = active_sessions,
        "Session deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/{id}/start
///
/// Reseeds the current customer and produces a fresh opening message.
pub async fn start_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = lookup(&state, &id).await?;
    let mut controller = controller.lock().await;
    let opening = controller.restart().await?;

    Ok(Json(serde_json::json!({
        "opening": opening,
        "transcript": controller.transcript(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// POST /api/sessions/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = lookup(&state, &id).await?;
    let mut controller = controller.lock().await;
    let reply = controller.submit_user_message(&body.message).await?;

    Ok(Json(serde_json::json!({
        "reply": reply.utterance,
        "stage": reply.stage,
        "ended": reply.ended,
        "transcript": controller.transcript(),
    })))
}

/// POST /api/sessions/{id}/next
pub async fn next_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = lookup(&state, &id).await?;
    let mut controller = controller.lock().await;

    let body = match controller.advance_customer()? {
        Some(customer) => serde_json::json!({
            "customer": customer,
            "remaining_customers": controller.remaining_customers(),
        }),
        None => serde_json::json!({ "message": "No more customers" }),
    };
    Ok(Json(body))
}

/// POST /api/sessions/{id}/summary
pub async fn summarize(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = lookup(&state, &id).await?;
    let (customer, transcript) = {
        let controller = controller.lock().await;
        let session = controller
            .session()
            .ok_or(Error::State(crate::error::StateError::NoCustomer))?;
        (session.customer.clone(), session.transcript.clone())
    };

    let summary = state
        .notifier
        .notify(&customer, &transcript)
        .await
        .map_err(Error::from)?;
    Ok(Json(summary))
}
