use serde::Serialize;

use shower_types::api::RsvpRequest;
use shower_types::{Choice, RsvpStatus};

use crate::error::ValidationError;

/// The RSVP form offers zero to five extra guests.
pub const MAX_RSVP_GUESTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidVote {
    pub name: String,
    pub choice: Choice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEntry {
    pub name: String,
    pub message: String,
}

/// A validated RSVP, ready to hand to a delivery sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rsvp {
    pub name: String,
    pub email: String,
    pub guests: u32,
    pub status: RsvpStatus,
    pub message: Option<String>,
}

/// Checks the name before the choice; the name is returned trimmed.
pub fn validate_vote(name: &str, choice: &str) -> Result<ValidVote, ValidationError> {
    let name = non_empty(name).ok_or(ValidationError::EmptyName)?;
    let choice: Choice = choice
        .parse()
        .map_err(|_| ValidationError::MissingChoice)?;
    Ok(ValidVote { name, choice })
}

pub fn validate_entry(name: &str, message: &str) -> Result<ValidEntry, ValidationError> {
    let name = non_empty(name).ok_or(ValidationError::EmptyName)?;
    let message = non_empty(message).ok_or(ValidationError::EmptyMessage)?;
    Ok(ValidEntry { name, message })
}

pub fn validate_rsvp(req: &RsvpRequest) -> Result<Rsvp, ValidationError> {
    let name = non_empty(&req.name).ok_or(ValidationError::EmptyName)?;
    let email = req.email.trim();
    if !looks_like_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if req.guests > MAX_RSVP_GUESTS {
        return Err(ValidationError::TooManyGuests {
            max: MAX_RSVP_GUESTS,
        });
    }

    Ok(Rsvp {
        name,
        email: email.to_string(),
        guests: req.guests,
        status: req.status,
        message: req.message.as_deref().and_then(non_empty),
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
