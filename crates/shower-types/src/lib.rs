pub mod api;
pub mod events;
pub mod models;

pub use models::{Choice, GuestbookEntry, RsvpStatus, Vote};
