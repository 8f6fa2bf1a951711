//! WhatsApp webhook: verification handshake and inbound messages.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Meta's subscription handshake: echo the challenge when the token matches.
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    match (params.verify_token, params.challenge) {
        (Some(token), Some(challenge))
            if !state.whatsapp_verify_token.is_empty()
                && token == state.whatsapp_verify_token =>
        {
            (StatusCode::OK, challenge)
        }
        _ => (StatusCode::FORBIDDEN, String::new()),
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub value: ChangeValue,
}

#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
pub struct MessageText {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct Contact {
    pub wa_id: String,
}

/// Inbound messages. Always answers 200 so Meta does not retry; a message
/// that looks like a payment notice feeds the heuristic confirmation path.
pub async fn receive(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    for entry in &payload.entry {
        for change in &entry.changes {
            let value = &change.value;
            let (Some(message), Some(contact)) = (value.messages.first(), value.contacts.first())
            else {
                continue;
            };
            let Some(text) = &message.text else {
                continue;
            };
            tracing::info!(from = %contact.wa_id, "whatsapp message received");

            match state
                .payments
                .confirm_from_inbound(&contact.wa_id, &text.body)
                .await
            {
                Ok(Some(order)) => {
                    tracing::info!(order = %order.code, "payment confirmed from inbound message")
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(from = %contact.wa_id, error = %err, "inbound confirmation failed")
                }
            }
        }
    }
    Ok(Json(serde_json::json!({"success": true})))
}

/// Re-sends the order summary message to the customer.
pub async fn send_order_message(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let order = state.orders.get_by_code(&code).await?;
    let sent = match state.notifier.notify_order_created(&order).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(order = %order.code, error = %err, "order message send failed");
            false
        }
    };
    Ok(Json(serde_json::json!({"sent": sent})))
}
