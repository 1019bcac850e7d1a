use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use shower_core::tally::tally;
use shower_types::api::{VoteInput, VotesResponse};

use crate::AppState;
use crate::error::ApiError;

pub async fn get_votes(State(state): State<AppState>) -> impl IntoResponse {
    let votes = state.dispatcher.votes().snapshot();
    let tally = tally(&votes, state.dispatcher.reveal().outcome());

    Json(VotesResponse {
        votes: votes.to_vec(),
        tally,
    })
}

/// The guest's confirmation is this response; it does not wait for the
/// vote to come back through the live feed.
pub async fn submit_vote(
    State(state): State<AppState>,
    payload: Result<Json<VoteInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let vote = state.gate.submit(input).await?;
    Ok((StatusCode::CREATED, Json(vote)))
}
