use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use shower_types::api::{GuestbookRequest, GuestbookResponse};

use crate::AppState;
use crate::error::ApiError;

pub async fn get_entries(State(state): State<AppState>) -> impl IntoResponse {
    Json(GuestbookResponse {
        entries: state.dispatcher.guestbook().snapshot().to_vec(),
    })
}

pub async fn add_entry(
    State(state): State<AppState>,
    payload: Result<Json<GuestbookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let entry = state.dispatcher.guestbook().append(req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
