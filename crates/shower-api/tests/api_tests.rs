/// HTTP surface tests: the router is driven in-process with `oneshot`.
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use shower_api::{AppStateInner, router};
use shower_core::{LateSubmissions, ManualClock, RevealConfig};
use shower_live::{
    Dispatcher, GuestbookStore, LogSink, MemoryLog, RevealHandle, SubmissionGate, VoteStore,
    spawn_reveal_timer,
};
use shower_types::{Choice, GuestbookEntry, Vote};

fn target() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 6, 3, 5, 0).unwrap()
}

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
    reveal: RevealHandle,
    votes_log: Arc<MemoryLog<Vote>>,
}

async fn harness(start: DateTime<Utc>) -> Harness {
    let clock = Arc::new(ManualClock::new(start));
    let votes_log = Arc::new(MemoryLog::new());
    let book_log: Arc<MemoryLog<GuestbookEntry>> = Arc::new(MemoryLog::new());

    let votes = VoteStore::open(votes_log.clone(), clock.clone()).await.unwrap();
    let guestbook = GuestbookStore::open(book_log, clock.clone()).await.unwrap();
    let (reveal, _timer) = spawn_reveal_timer(
        RevealConfig {
            target: target(),
            outcome: Choice::Boy,
            late_submissions: LateSubmissions::Closed,
        },
        clock.clone(),
        Duration::from_millis(5),
    );

    let state = Arc::new(AppStateInner {
        dispatcher: Dispatcher::new(votes.clone(), guestbook, reveal.clone()),
        gate: SubmissionGate::new(votes, reveal.clone()),
        rsvp: Arc::new(LogSink),
    });

    Harness {
        app: router(state),
        clock,
        reveal,
        votes_log,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

#[tokio::test]
async fn health_check() {
    let h = harness(target() - chrono::Duration::days(1)).await;
    let (status, body) = send(&h.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn submit_and_list_votes() {
    let h = harness(target() - chrono::Duration::days(1)).await;

    for (name, choice) in [("Ann", "boy"), ("Bo", "girl"), ("Cy", "boy")] {
        let (status, vote) = send(&h.app, "POST", "/votes", Some(json!({ "name": name, "choice": choice }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(vote["name"], name);
        assert!(vote["id"].is_string());
        h.clock.advance(chrono::Duration::seconds(1));
    }

    let (status, body) = send(&h.app, "GET", "/votes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["votes"].as_array().unwrap().len(), 3);
    assert_eq!(body["votes"][0]["name"], "Cy");
    assert_eq!(body["tally"]["total"], 3);
    assert_eq!(body["tally"]["choices"][0], json!({ "choice": "boy", "count": 2, "percentage": 67 }));
    assert_eq!(body["tally"]["choices"][1], json!({ "choice": "girl", "count": 1, "percentage": 33 }));
    assert_eq!(body["tally"]["winners"], json!([]));
}

#[tokio::test]
async fn invalid_votes_are_bad_requests() {
    let h = harness(target() - chrono::Duration::days(1)).await;

    let (status, body) = send(&h.app, "POST", "/votes", Some(json!({ "name": "  ", "choice": "boy" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, _) = send(&h.app, "POST", "/votes", Some(json!({ "name": "Ann" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&h.app, "POST", "/votes", Some(json!({ "name": "Ann", "choice": "twins" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn incomplete_or_malformed_bodies_get_the_same_error_shape() {
    let h = harness(target() - chrono::Duration::days(1)).await;

    let (status, body) = send(&h.app, "POST", "/votes", Some(json!({ "choice": "boy" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "please enter your name");
    assert_eq!(body["retryable"], false);

    let (status, body) = send(&h.app, "POST", "/votes", Some(json!({ "name": "Ann", "choice": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);
    assert!(body["error"].as_str().unwrap().contains("choice"));

    for bad in [
        json!({ "name": "Ann", "choice": "boy", "extra": true }),
        json!({ "name": 7, "choice": "boy" }),
        json!(["Ann", "boy"]),
    ] {
        let (status, body) = send(&h.app, "POST", "/votes", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["retryable"], false);
        assert!(body["error"].is_string());
    }

    let (status, body) = send(&h.app, "POST", "/guestbook", Some(json!({ "message": "Hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, body) = send(&h.app, "POST", "/rsvp", Some(json!({ "name": "Ann" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    assert!(shower_live::AppendLog::load_all(&*h.votes_log).unwrap().is_empty());
}

#[tokio::test]
async fn backend_outage_is_retryable() {
    let h = harness(target() - chrono::Duration::days(1)).await;
    h.votes_log.set_offline(true);

    let (status, body) = send(&h.app, "POST", "/votes", Some(json!({ "name": "Ann", "choice": "boy" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retryable"], true);
    // No backend detail leaks out.
    assert!(!body["error"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn reveal_closes_voting_and_names_winners() {
    let h = harness(target() - chrono::Duration::seconds(30)).await;

    let (_, body) = send(&h.app, "GET", "/reveal", None).await;
    assert_eq!(body["phase"], "counting_down");
    assert_eq!(body["countdown"]["seconds"], 30);
    assert!(body["outcome"].is_null());
    assert_eq!(body["accepting_votes"], true);

    for (name, choice) in [("Ann", "boy"), ("Bo", "girl"), ("Cy", "boy")] {
        send(&h.app, "POST", "/votes", Some(json!({ "name": name, "choice": choice }))).await;
        h.clock.advance(chrono::Duration::seconds(1));
    }

    h.clock.set(target());
    tokio::time::timeout(Duration::from_secs(2), h.reveal.revealed()).await.unwrap();

    let (_, body) = send(&h.app, "GET", "/reveal", None).await;
    assert_eq!(body["phase"], "revealed");
    assert_eq!(body["outcome"], "boy");
    assert_eq!(body["countdown"], json!({ "days": 0, "hours": 0, "minutes": 0, "seconds": 0 }));
    let winners: Vec<&str> = body["winners"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert_eq!(winners, ["Ann", "Cy"]);

    let (status, _) = send(&h.app, "POST", "/votes", Some(json!({ "name": "Dee", "choice": "girl" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn guestbook_round_trip() {
    let h = harness(target()).await;

    let (status, _) = send(&h.app, "POST", "/guestbook", Some(json!({ "name": "Ann", "message": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, entry) = send(
        &h.app,
        "POST",
        "/guestbook",
        Some(json!({ "name": "Ann", "message": "So happy for you!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["message"], "So happy for you!");

    let (_, body) = send(&h.app, "GET", "/guestbook", None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rsvp_validates_then_delivers() {
    let h = harness(target()).await;

    let (status, _) = send(
        &h.app,
        "POST",
        "/rsvp",
        Some(json!({ "name": "Ann", "email": "nope", "status": "attending" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &h.app,
        "POST",
        "/rsvp",
        Some(json!({ "name": "Ann", "email": "ann@example.org", "guests": 2, "status": "not-attending" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "delivered": true }));
}
