use serde::{Deserialize, Serialize};

use crate::api::{RevealStatus, Tally};
use crate::models::{GuestbookEntry, Vote};

/// Events pushed over the live WebSocket.
///
/// Collections are always sent whole, never as deltas: a client only ever
/// needs to keep the latest event of each kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Full vote list (newest first) with its derived statistics
    Votes { votes: Vec<Vote>, tally: Tally },

    /// Full guestbook (newest first)
    Guestbook { entries: Vec<GuestbookEntry> },

    /// Countdown tick or the reveal itself
    Reveal { status: RevealStatus },
}

impl LiveEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Votes { .. } => "votes",
            Self::Guestbook { .. } => "guestbook",
            Self::Reveal { .. } => "reveal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Countdown, RevealPhase};
    use chrono::TimeZone;

    #[test]
    fn events_are_tagged() {
        let event = LiveEvent::Reveal {
            status: RevealStatus {
                phase: RevealPhase::CountingDown,
                target: chrono::Utc.with_ymd_and_hms(2025, 7, 6, 3, 5, 0).unwrap(),
                countdown: Countdown {
                    days: 1,
                    hours: 2,
                    minutes: 3,
                    seconds: 4,
                },
                outcome: None,
                accepting_votes: true,
            },
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reveal");
        assert_eq!(json["data"]["status"]["phase"], "counting_down");
        assert_eq!(json["data"]["status"]["countdown"]["seconds"], 4);
        assert!(json["data"]["status"]["outcome"].is_null());
    }
}
