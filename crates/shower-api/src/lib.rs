pub mod error;
pub mod guestbook;
pub mod live;
pub mod reveal;
pub mod rsvp;
pub mod votes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shower_live::{Dispatcher, RsvpSink, SubmissionGate};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub dispatcher: Dispatcher,
    pub gate: SubmissionGate,
    pub rsvp: Arc<dyn RsvpSink>,
}

/// All routes, without the CORS/trace layers the binary adds on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/votes", get(votes::get_votes).post(votes::submit_vote))
        .route("/reveal", get(reveal::get_reveal))
        .route("/guestbook", get(guestbook::get_entries).post(guestbook::add_entry))
        .route("/rsvp", post(rsvp::submit))
        .route("/live", get(live::ws_upgrade))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
