use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tracing::{info, warn};

use shower_core::ValidationError;
use shower_core::validate::{Rsvp, validate_rsvp};
use shower_types::api::{RsvpRequest, RsvpResponse};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery endpoint answered with status {status}")]
    Rejected { status: u16 },
}

/// Where validated RSVPs go (mail relay, spreadsheet hook, ...).
pub trait RsvpSink: Send + Sync + 'static {
    fn deliver<'a>(&'a self, rsvp: &'a Rsvp) -> BoxFuture<'a, Result<(), DeliveryError>>;
}

/// POSTs each RSVP as JSON to a fixed URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl RsvpSink for WebhookSink {
    fn deliver<'a>(&'a self, rsvp: &'a Rsvp) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            let resp = self.client.post(&self.url).json(rsvp).send().await?;
            if !resp.status().is_success() {
                return Err(DeliveryError::Rejected {
                    status: resp.status().as_u16(),
                });
            }
            Ok(())
        })
    }
}

/// Used when no delivery endpoint is configured: the RSVP only reaches
/// the server log.
pub struct LogSink;

impl RsvpSink for LogSink {
    fn deliver<'a>(&'a self, rsvp: &'a Rsvp) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            info!(
                "RSVP from {} <{}>: {} (+{} guests)",
                rsvp.name, rsvp.email, rsvp.status, rsvp.guests
            );
            Ok(())
        })
    }
}

/// Validates and delivers one RSVP. A delivery failure is not an error for
/// the guest: the response says so in `warning` instead.
pub async fn submit_rsvp(
    sink: &dyn RsvpSink,
    req: &RsvpRequest,
) -> Result<RsvpResponse, ValidationError> {
    let rsvp = validate_rsvp(req)?;

    match sink.deliver(&rsvp).await {
        Ok(()) => Ok(RsvpResponse {
            delivered: true,
            warning: None,
        }),
        Err(e) => {
            warn!("RSVP from {} not delivered: {}", rsvp.name, e);
            Ok(RsvpResponse {
                delivered: false,
                warning: Some("Your RSVP is valid but the hosts could not be notified yet. Please try again later.".into()),
            })
        }
    }
}
