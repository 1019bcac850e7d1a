use axum::{Json, extract::{State, rejection::JsonRejection}, response::IntoResponse};

use shower_live::rsvp::submit_rsvp;
use shower_types::api::RsvpRequest;

use crate::AppState;
use crate::error::ApiError;

/// 200 even when delivery failed; `delivered` and `warning` say so.
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<RsvpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let resp = submit_rsvp(state.rsvp.as_ref(), &req).await?;
    Ok(Json(resp))
}
