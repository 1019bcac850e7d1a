use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of answers a guest can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Boy,
    Girl,
}

impl Choice {
    pub const ALL: [Choice; 2] = [Choice::Boy, Choice::Girl];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boy => "boy",
            Self::Girl => "girl",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the enumerated choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice(pub String);

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown choice {:?}", self.0)
    }
}

impl std::error::Error for UnknownChoice {}

impl FromStr for Choice {
    type Err = UnknownChoice;

    /// Matches exactly; the form sends lowercase values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boy" => Ok(Self::Boy),
            "girl" => Ok(Self::Girl),
            other => Err(UnknownChoice(other.to_string())),
        }
    }
}

/// A stored guess. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub name: String,
    pub choice: Choice,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookEntry {
    pub id: Uuid,
    pub name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RsvpStatus {
    Attending,
    Maybe,
    NotAttending,
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attending => "attending",
            Self::Maybe => "maybe",
            Self::NotAttending => "not-attending",
        })
    }
}

/// Records that live in a feed: identified by id, ordered by timestamp.
pub trait Record {
    fn id(&self) -> Uuid;
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Record for Vote {
    fn id(&self) -> Uuid {
        self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

impl Record for GuestbookEntry {
    fn id(&self) -> Uuid {
        self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}
