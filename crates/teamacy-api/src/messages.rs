use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use serde::Deserialize;
use teamacy_db::models::MessageRow;
use teamacy_mail::render;
use teamacy_types::api::{SubmitMessageRequest, SubmitMessageResponse};
use teamacy_types::models::{Message, MessageKind};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, AppJson, AppQuery};
use crate::middleware::optional_user;
use crate::state::{AppState, blocking};
use crate::validate;

/// Upper bound on rows returned by any listing.
pub const MAX_LIST: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "type")]
    pub kind: Option<MessageKind>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    MAX_LIST
}

/// POST /api/messages — the type tag comes from the body.
pub async fn submit_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>, ApiError> {
    let kind = req.kind;
    accept(&state, &headers, req, kind).await
}

/// POST /api/enquiries
pub async fn submit_enquiry(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>, ApiError> {
    accept(&state, &headers, req, Some(MessageKind::Enquiry)).await
}

/// POST /api/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>, ApiError> {
    accept(&state, &headers, req, Some(MessageKind::Feedback)).await
}

/// Validate, persist, then notify. Once the row is written the request
/// succeeds whatever happens to the email.
async fn accept(
    state: &AppState,
    headers: &HeaderMap,
    req: SubmitMessageRequest,
    kind: Option<MessageKind>,
) -> Result<Json<SubmitMessageResponse>, ApiError> {
    let name = validate::required("name", &req.name)?;
    let email = validate::email(&req.email)?;
    let subject = validate::required("subject", &req.subject)?;
    let body = validate::required("message", &req.message)?;

    let user_id = optional_user(state, headers).await.map(|u| u.id);

    let message = Message {
        id: Uuid::new_v4(),
        kind,
        name,
        email,
        subject,
        message_html: render::linkify(&body),
        message: body,
        user_id,
        created_at: Utc::now(),
    };

    let db = state.clone();
    let row = MessageRow::from_message(&message);
    blocking(move || db.db.insert_message(&row)).await?;

    info!(
        "Stored {} message {} from <{}>",
        kind.map_or("untagged", |k| k.as_str()),
        message.id,
        message.email
    );

    let id = message.id;
    state.notifier.spawn_notify(message);

    Ok(Json(SubmitMessageResponse {
        status: "ok".to_string(),
        id,
    }))
}

/// GET /api/admin/messages
pub async fn list_messages(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MessageQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    load(&state, query.kind, query.limit.clamp(1, MAX_LIST)).await
}

/// GET /api/enquiries
pub async fn list_enquiries(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    load(&state, Some(MessageKind::Enquiry), MAX_LIST).await
}

/// GET /api/feedback
pub async fn list_feedback(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    load(&state, Some(MessageKind::Feedback), MAX_LIST).await
}

async fn load(
    state: &AppState,
    kind: Option<MessageKind>,
    limit: u32,
) -> Result<Json<Vec<Message>>, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.get_messages(kind.map(|k| k.as_str()), limit)).await?;

    let messages = rows
        .iter()
        .map(MessageRow::to_message)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(messages))
}
