use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use inkwell_core::AppError;
use serde::Deserialize;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnqueueEmailRequest {
    pub email: String,
    pub subject: String,
    pub html_message: String,
}

/// Queue an outgoing email. Delivery happens later in the mail queue owner.
#[tracing::instrument(skip(state, request), fields(recipient = %request.email))]
pub async fn enqueue_email(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnqueueEmailRequest>,
) -> Result<StatusCode, HttpAppError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(
            AppError::InvalidInput("A valid recipient email is required".to_string()).into(),
        );
    }
    if request.subject.trim().is_empty() {
        return Err(AppError::InvalidInput("Subject must not be empty".to_string()).into());
    }

    state
        .email
        .enqueue(email, &request.subject, &request.html_message);

    Ok(StatusCode::ACCEPTED)
}
