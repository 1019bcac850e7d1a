use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Choice, GuestbookEntry, RsvpStatus, Vote};

// -- Votes --

/// Raw guess as submitted by a guest. Missing fields deserialize to
/// empty values so validation, not the JSON layer, reports them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub choice: Option<String>,
}

impl VoteInput {
    pub fn new(name: impl Into<String>, choice: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            choice: Some(choice.into()),
        }
    }

    /// The submitted choice, `""` when absent or null.
    pub fn choice(&self) -> &str {
        self.choice.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceTally {
    pub choice: Choice,
    pub count: usize,
    pub percentage: u32,
}

/// Statistics derived from one snapshot of the vote feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: usize,
    pub choices: Vec<ChoiceTally>,
    /// Correct guesses, earliest first. Empty until the reveal.
    pub winners: Vec<Vote>,
}

#[derive(Debug, Serialize)]
pub struct VotesResponse {
    pub votes: Vec<Vote>,
    pub tally: Tally,
}

// -- Reveal --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    CountingDown,
    Revealed,
}

/// Time left until the reveal, broken down the way the page shows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub const ZERO: Countdown = Countdown {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealStatus {
    pub phase: RevealPhase,
    pub target: DateTime<Utc>,
    pub countdown: Countdown,
    /// Only present once revealed.
    pub outcome: Option<Choice>,
    pub accepting_votes: bool,
}

#[derive(Debug, Serialize)]
pub struct RevealResponse {
    #[serde(flatten)]
    pub status: RevealStatus,
    pub winners: Vec<Vote>,
}

// -- Guestbook --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuestbookRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct GuestbookResponse {
    pub entries: Vec<GuestbookEntry>,
}

// -- RSVP --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RsvpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub guests: u32,
    pub status: RsvpStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RsvpResponse {
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// True when the same request may succeed if sent again.
    pub retryable: bool,
}
