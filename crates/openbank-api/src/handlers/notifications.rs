//! Notification handlers (§4.1 "Notifications").

use axum::extract::{Path, State};
use axum::Json;
use openbank_types::{BankError, ClientId, NotificationId};

use crate::dto::notification::NotificationDto;
use crate::dto::ResponseEnvelope;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

pub async fn list_unread(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<ResponseEnvelope<Vec<NotificationDto>>>, ApiError> {
    let client = ClientId::new(ctx.token.subject.clone());
    let notifications = state.db.notification_repo().list_unread(&client).await?;
    let data = notifications.into_iter().map(NotificationDto::from).collect();
    Ok(Json(ResponseEnvelope::single(data, "/notifications")))
}

pub async fn mark_read(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope<NotificationDto>>, ApiError> {
    let id = NotificationId::parse(&id).map_err(|_| BankError::validation("invalid notification id"))?;
    let client = ClientId::new(ctx.token.subject.clone());
    let notification = state.db.notification_repo().mark_read(id, &client).await?;
    let self_link = format!("/notifications/{id}");
    Ok(Json(ResponseEnvelope::single(notification.into(), self_link)))
}
