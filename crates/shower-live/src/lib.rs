//! Live side of the party: append-only stores with snapshot feeds, the
//! reveal timer, the submission gate, RSVP delivery and the WebSocket
//! connection that fans all of it out to browsers.

pub mod backend;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod gate;
pub mod reveal;
pub mod rsvp;
pub mod store;

pub use backend::{AppendLog, MemoryLog};
pub use dispatcher::{Dispatcher, LiveStream};
pub use error::{StoreError, SubmitError};
pub use feed::{Feed, Snapshot, Subscription};
pub use gate::SubmissionGate;
pub use reveal::{RevealHandle, spawn_reveal_timer};
pub use rsvp::{DeliveryError, LogSink, RsvpSink, WebhookSink};
pub use store::{GuestbookStore, VoteStore};
