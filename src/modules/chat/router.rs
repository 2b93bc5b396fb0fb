use axum::{
    Router,
    routing::{delete, get},
};

use super::controller::{delete_message, list_messages, send_message};
use crate::state::AppState;

/// Mounted under `/api/classes`. Both roles may use chat.
pub fn init_chat_router() -> Router<AppState> {
    Router::new()
        .route("/{class_id}/chat", get(list_messages).post(send_message))
        .route("/{class_id}/chat/{message_id}", delete(delete_message))
}
