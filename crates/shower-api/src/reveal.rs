use axum::{Json, extract::State, response::IntoResponse};

use shower_core::tally::winners;
use shower_types::api::RevealResponse;

use crate::AppState;

pub async fn get_reveal(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.dispatcher.reveal().status();
    let winners = winners(&state.dispatcher.votes().snapshot(), status.outcome);

    Json(RevealResponse { status, winners })
}
