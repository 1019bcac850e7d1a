use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shower_types::Choice;
use shower_types::api::{Countdown, RevealPhase, RevealStatus};

const MS_PER_SECOND: i64 = 1000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Whether guesses are still taken after the reveal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateSubmissions {
    #[default]
    Closed,
    Allowed,
}

impl FromStr for LateSubmissions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Ok(Self::Closed),
            "allowed" => Ok(Self::Allowed),
            other => Err(format!("expected `closed` or `allowed`, got {:?}", other)),
        }
    }
}

impl fmt::Display for LateSubmissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Allowed => "allowed",
        })
    }
}

/// Static reveal settings, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealConfig {
    pub target: DateTime<Utc>,
    /// The real answer. Never derived from votes.
    pub outcome: Choice,
    pub late_submissions: LateSubmissions,
}

/// The one and only `CountingDown -> Revealed` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub at: DateTime<Utc>,
    pub outcome: Choice,
}

/// Countdown/reveal state machine. `Revealed` is terminal.
#[derive(Debug, Clone)]
pub struct RevealMachine {
    config: RevealConfig,
    phase: RevealPhase,
}

impl RevealMachine {
    /// Starts already revealed when `now` is at or past the target; no
    /// transition is reported in that case.
    pub fn new(config: RevealConfig, now: DateTime<Utc>) -> Self {
        let phase = if now >= config.target {
            RevealPhase::Revealed
        } else {
            RevealPhase::CountingDown
        };
        debug!(target = %config.target, ?phase, "Reveal state initialised");
        Self { config, phase }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_revealed(&self) -> bool {
        self.phase == RevealPhase::Revealed
    }

    /// Periodic time check. Returns the transition on the first call that
    /// observes `now >= target`, and `None` on every other call.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        if self.phase == RevealPhase::Revealed || now < self.config.target {
            return None;
        }
        self.phase = RevealPhase::Revealed;
        Some(Transition {
            at: now,
            outcome: self.config.outcome,
        })
    }

    /// Known only after the reveal.
    pub fn outcome(&self) -> Option<Choice> {
        self.is_revealed().then_some(self.config.outcome)
    }

    pub fn can_submit(&self) -> bool {
        match self.config.late_submissions {
            LateSubmissions::Allowed => true,
            LateSubmissions::Closed => !self.is_revealed(),
        }
    }

    /// Remaining time, clamped to zero in every unit once revealed.
    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        if self.is_revealed() {
            return Countdown::ZERO;
        }
        countdown_between(now, self.config.target)
    }

    pub fn status(&self, now: DateTime<Utc>) -> RevealStatus {
        RevealStatus {
            phase: self.phase,
            target: self.config.target,
            countdown: self.countdown(now),
            outcome: self.outcome(),
            accepting_votes: self.can_submit(),
        }
    }
}

/// Floor breakdown of `target - now`; zero when the target has passed.
pub fn countdown_between(now: DateTime<Utc>, target: DateTime<Utc>) -> Countdown {
    let diff = (target - now).num_milliseconds();
    if diff <= 0 {
        return Countdown::ZERO;
    }

    Countdown {
        days: diff / MS_PER_DAY,
        hours: (diff % MS_PER_DAY) / MS_PER_HOUR,
        minutes: (diff % MS_PER_HOUR) / MS_PER_MINUTE,
        seconds: (diff % MS_PER_MINUTE) / MS_PER_SECOND,
    }
}
